//! Request dispatch: credential attachment, timeout, and the 401 retry.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::{ClientConfig, DEFAULT_API_PREFIX};
use super::error::ApiError;
use super::query::Query;
use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::auth::CredentialState;
use crate::{Error, Result};

/// Response header carrying the request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// One logical API call.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub path: String,
    pub query: Query,
    pub body: Option<Value>,
    /// Per-call headers; these win over the configured defaults.
    pub headers: Vec<(String, String)>,
    /// Skip credential validation and the auth header (login/bootstrap calls).
    pub skip_auth: bool,
}

impl RequestOptions {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::new(),
            body: None,
            headers: Vec::new(),
            skip_auth: false,
        }
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn no_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

struct DispatcherInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

/// Sends requests on behalf of resource wrappers.
///
/// Every authenticated call first runs [`CredentialState::ensure_valid`].
/// A 401 on an authenticated call, when a renewal strategy is installed,
/// forces one renewal and retries the same request exactly once.
#[derive(Clone)]
pub struct RequestDispatcher {
    inner: Arc<DispatcherInner>,
    credentials: CredentialState,
}

impl RequestDispatcher {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: CredentialState,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner { config, transport }),
            credentials,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn credentials(&self) -> &CredentialState {
        &self.credentials
    }

    /// Same transport and configuration, with its own empty credential
    /// state. Renewal strategies hold one of these for their no-auth login
    /// calls so they do not keep the main state alive.
    pub(crate) fn detached(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            credentials: CredentialState::new(),
        }
    }

    pub fn build_url(&self, path: &str, query: &Query) -> String {
        let query = query.to_query_string();
        if path.starts_with("http://") || path.starts_with("https://") {
            return format!("{}{}", path, query);
        }

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let prefix = if path.starts_with("/api/") {
            ""
        } else {
            DEFAULT_API_PREFIX
        };
        format!("{}{}{}{}", self.inner.config.base_url, prefix, path, query)
    }

    fn build_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if !options.skip_auth
            && let Some(credential) = self.credentials.current()
        {
            let (name, value) = credential.auth_header();
            let invalid = || Error::InvalidRequest("Credential is not a valid header value".into());
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let mut value = HeaderValue::from_str(&value).map_err(|_| invalid())?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        for (name, value) in self.inner.config.headers.iter().chain(&options.headers) {
            insert_header(&mut headers, name, value)?;
        }

        Ok(headers)
    }

    async fn attempt(
        &self,
        options: &RequestOptions,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method: options.method.clone(),
            url: url.to_string(),
            headers: self.build_headers(options)?,
            body: body.map(<[u8]>::to_vec),
        };

        let timeout = self.inner.config.timeout;
        match tokio::time::timeout(timeout, self.inner.transport.send(request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(Error::network(
                format!("Request timed out after {}ms", timeout.as_millis()),
                None,
            )),
        }
    }

    /// Perform one logical request. `None` means an empty successful body.
    pub async fn execute(&self, options: RequestOptions) -> Result<Option<Value>> {
        if !options.skip_auth {
            self.credentials.ensure_valid().await?;
        }

        let url = self.build_url(&options.path, &options.query);
        let body = options.body.as_ref().map(serde_json::to_vec).transpose()?;

        let response = self.attempt(&options, &url, body.as_deref()).await?;
        if response.is_success() {
            return decode(&response);
        }

        if response.status == 401 && !options.skip_auth && self.credentials.can_renew() {
            tracing::debug!(
                method = %options.method,
                path = %options.path,
                "Received 401, renewing credential and retrying"
            );
            self.credentials.force_renewal().await?;

            let retry = self.attempt(&options, &url, body.as_deref()).await?;
            if retry.is_success() {
                return decode(&retry);
            }
            return Err(classify(&retry));
        }

        Err(classify(&response))
    }

    /// Perform a request and deserialize the result.
    ///
    /// Empty successful responses deserialize from JSON `null`, so `()`,
    /// `Option<_>` and [`Value`] accept them.
    pub async fn request<T: DeserializeOwned>(&self, options: RequestOptions) -> Result<T> {
        let value = self.execute(options).await?;
        Ok(serde_json::from_value(value.unwrap_or(Value::Null))?)
    }

    /// Like [`request`](Self::request), with empty responses as `None`.
    pub async fn request_optional<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<Option<T>> {
        match self.execute(options).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T> {
        self.request(RequestOptions::new(Method::GET, path).query(query))
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestOptions::new(Method::POST, path).json(body)?)
            .await
    }

    /// POST without credential validation or auth header.
    pub async fn post_no_auth<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestOptions::new(Method::POST, path).json(body)?.no_auth())
            .await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestOptions::new(Method::PUT, path).json(body)?)
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestOptions::new(Method::PATCH, path).json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(RequestOptions::new(Method::DELETE, path))
            .await
    }

    pub async fn delete_with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.request(RequestOptions::new(Method::DELETE, path).json(body)?)
            .await
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("base_url", &self.inner.config.base_url)
            .field("timeout", &self.inner.config.timeout)
            .field("credentials", &self.credentials)
            .finish()
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::InvalidRequest(format!("Invalid header name: {}", name)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::InvalidRequest(format!("Invalid value for header {}", name)))?;
    headers.insert(name, value);
    Ok(())
}

fn decode(response: &HttpResponse) -> Result<Option<Value>> {
    if response.status == 204 || response.body.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&response.body)?))
}

fn classify(response: &HttpResponse) -> Error {
    let request_id = response.header(REQUEST_ID_HEADER).map(str::to_string);
    Error::Api(ApiError::from_response(
        response.status,
        &response.body,
        request_id,
    ))
}
