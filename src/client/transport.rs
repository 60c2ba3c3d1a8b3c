//! Pluggable HTTP transport.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::{Error, Result};

/// Message used for transport-level failures other than timeouts.
pub const NETWORK_FAILURE_MESSAGE: &str = "Network request failed";
/// Body substituted when an error response cannot be read.
pub const UNREADABLE_BODY_MESSAGE: &str = "Unknown error";

/// A fully built outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A received response with its body read as text.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn text(&self) -> &str {
        &self.body
    }
}

/// Sends one request. Dropping the returned future must abort the send.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Default transport backed by [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn network_error(err: reqwest::Error) -> Error {
    Error::network(NETWORK_FAILURE_MESSAGE, Some(Arc::new(err)))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut req = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let response = req.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        // An unreadable error body still yields a classified status.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) if !(200..300).contains(&status) => {
                tracing::debug!(status, error = %err, "Failed to read error response body");
                UNREADABLE_BODY_MESSAGE.to_string()
            }
            Err(err) => return Err(network_error(err)),
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
