//! HTTP error classification.

use serde_json::{Map, Value};
use thiserror::Error;

/// Well-known failure statuses, plus a fallback for everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimit,
    InternalServer,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::Validation,
            429 => Self::RateLimit,
            500 => Self::InternalServer,
            _ => Self::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Validation => "validation failed",
            Self::RateLimit => "rate limited",
            Self::InternalServer => "internal server error",
            Self::Other => "api error",
        }
    }
}

/// Error response from the API.
#[derive(Clone, Debug, Error)]
#[error("{} (HTTP {status}): {message}", .kind.name())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    /// Correlation id from the `x-request-id` response header.
    pub request_id: Option<String>,
    /// Machine-readable error type from the body's `type` field.
    pub error_type: Option<String>,
    /// The body's `details` field, or the whole body when absent.
    pub details: Option<Value>,
}

impl ApiError {
    /// Classify a non-success response.
    ///
    /// Bodies that are not valid JSON become `{"message": <raw text>}`.
    pub fn from_response(status: u16, body: &str, request_id: Option<String>) -> Self {
        let body = serde_json::from_str::<Value>(body).unwrap_or_else(|_| {
            let mut map = Map::new();
            map.insert("message".into(), Value::String(body.to_string()));
            Value::Object(map)
        });

        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let message = field("message")
            .or_else(|| field("error"))
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        let error_type = field("type");
        let details = match body.get("details") {
            Some(details) if !details.is_null() => Some(details.clone()),
            _ if body.is_null() => None,
            _ => Some(body.clone()),
        };

        Self {
            kind: ApiErrorKind::from_status(status),
            status,
            message,
            request_id,
            error_type,
            details,
        }
    }
}
