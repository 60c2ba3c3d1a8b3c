//! # infisical-client
//!
//! Core of an Infisical secrets API client: credential tracking with
//! single-flight renewal, request dispatch with one 401 retry, and machine
//! identity login.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use infisical_client::{Client, LoginParams, Query};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), infisical_client::Error> {
//!     let client = Client::builder().from_env()?.build()?;
//!     client
//!         .login(LoginParams::universal_auth("client-id", "client-secret"))
//!         .await?;
//!
//!     let secrets: serde_json::Value = client
//!         .dispatcher()
//!         .get("/api/v3/secrets/raw", Query::new().param("workspaceId", "ws-1"))
//!         .await?;
//!     println!("{}", secrets);
//!     Ok(())
//! }
//! ```
//!
//! ## Renewing Logins
//!
//! A [`LoginDescriptor::factory`] is evaluated again on every renewal, so
//! short-lived login inputs stay fresh:
//!
//! ```rust,no_run
//! use infisical_client::{Client, LoginDescriptor, LoginParams};
//!
//! # async fn run(client: Client) -> infisical_client::Result<()> {
//! client
//!     .login(LoginDescriptor::factory(|| async {
//!         let jwt = std::fs::read_to_string("/var/run/secrets/tokens/infisical")
//!             .map_err(|e| infisical_client::Error::Config(e.to_string()))?;
//!         Ok(LoginParams::kubernetes_auth("identity-id", jwt.trim()))
//!     }))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod client;
pub mod prelude;

use std::sync::Arc;

pub use auth::{
    AuthMode, Credential, CredentialResolver, CredentialState, LoginDescriptor, LoginParams,
    LoginResponse, RenewalStrategy, RenewedCredential, ResourceCategory,
};
pub use client::{
    ApiError, ApiErrorKind, Client, ClientBuilder, ClientConfig, Query, RequestDispatcher,
    RequestOptions, Transport,
};

/// Underlying cause of a transport failure.
pub type BoxedSource = Arc<dyn std::error::Error + Send + Sync>;

/// Error type for infisical-client operations.
///
/// Cloneable so a single renewal outcome can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Server returned a non-success response.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Missing credential, or an auth mode the resource does not accept.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        current_mode: Option<AuthMode>,
        allowed_modes: Vec<AuthMode>,
    },

    /// Timeout or transport failure; no HTTP status was received.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(Arc<serde_json::Error>),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request parameters are invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Authentication or authorization failures (401, 403)
    Authorization,
    /// Configuration or request construction errors
    Configuration,
    /// Network failures, rate limits and server errors
    Transient,
    /// Other API errors and malformed payloads
    Internal,
}

impl Error {
    pub fn network(message: impl Into<String>, source: Option<BoxedSource>) -> Self {
        Error::Network {
            message: message.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Authentication { .. } => ErrorCategory::Authorization,
            Error::Api(api) if matches!(api.status, 401 | 403) => ErrorCategory::Authorization,

            Error::Config(_) | Error::InvalidRequest(_) => ErrorCategory::Configuration,

            Error::Network { .. } => ErrorCategory::Transient,
            Error::Api(api) if api.status == 429 || (500..=599).contains(&api.status) => {
                ErrorCategory::Transient
            }

            Error::Api(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_authorization_error(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(api) if api.status == 401)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Api(api) => api.request_id.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api(ApiError::from_response(status, "{}", Some("req-7".into())))
    }

    #[test]
    fn test_categories() {
        assert_eq!(api(401).category(), ErrorCategory::Authorization);
        assert_eq!(api(403).category(), ErrorCategory::Authorization);
        assert_eq!(api(429).category(), ErrorCategory::Transient);
        assert_eq!(api(503).category(), ErrorCategory::Transient);
        assert_eq!(api(404).category(), ErrorCategory::Internal);
        assert_eq!(
            Error::network("Network request failed", None).category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            Error::Config("bad".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_accessors() {
        let err = api(401);
        assert!(err.is_unauthorized());
        assert!(err.is_authorization_error());
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.request_id(), Some("req-7"));

        let err = Error::network("Request timed out after 50ms", None);
        assert!(!err.is_unauthorized());
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "Request timed out after 50ms");
    }

    #[test]
    fn test_network_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::network("Network request failed", Some(Arc::new(io)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "refused");
    }

    #[test]
    fn test_json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Json(_)));
        let cloned = err.clone();
        assert_eq!(cloned.to_string(), err.to_string());
    }
}
