//! Infisical API client.

mod config;
mod dispatcher;
mod error;
mod query;
pub(crate) mod transport;

pub use config::{
    ClientConfig, DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, ENV_SITE_URL,
    ENV_TIMEOUT_MS,
};
pub use dispatcher::{REQUEST_ID_HEADER, RequestDispatcher, RequestOptions};
pub use error::{ApiError, ApiErrorKind};
pub use query::{Query, QueryValue};
pub use transport::{
    HttpRequest, HttpResponse, NETWORK_FAILURE_MESSAGE, ReqwestTransport, Transport,
    UNREADABLE_BODY_MESSAGE,
};

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    Credential, CredentialResolver, CredentialState, LoginDescriptor, LoginResponse,
    ResourceCategory,
};
use crate::{Error, Result};

/// Entry point: owns the credential state, the dispatcher and the resolver.
#[derive(Clone)]
pub struct Client {
    dispatcher: RequestDispatcher,
    resolver: CredentialResolver,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client with default configuration and no credential.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Log in as a machine identity. The descriptor is kept for renewal.
    pub async fn login(&self, descriptor: impl Into<LoginDescriptor>) -> Result<LoginResponse> {
        self.resolver.login(descriptor).await
    }

    pub fn logout(&self) {
        self.resolver.logout();
    }

    /// Use a static credential. It never expires and is never renewed.
    pub fn set_credential(&self, credential: Credential) {
        self.credentials().set_credential(credential, None);
    }

    pub fn credentials(&self) -> &CredentialState {
        self.dispatcher.credentials()
    }

    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    pub fn require_authorized_for(&self, category: ResourceCategory) -> Result<()> {
        self.credentials().require_authorized_for(category)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config().base_url)
            .field("mode", &self.credentials().mode())
            .finish()
    }
}

#[derive(Default)]
pub struct ClientBuilder {
    config: Option<ClientConfig>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    credential: Option<Credential>,
    transport: Option<Arc<dyn Transport>>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Start from `INFISICAL_SITE_URL` / `INFISICAL_TIMEOUT_MS`.
    pub fn from_env(mut self) -> Result<Self> {
        self.config = Some(ClientConfig::from_env()?);
        Ok(self)
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Static credential installed at construction.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Replace the HTTP transport entirely.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a preconfigured reqwest client for the default transport.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut config = self.config.unwrap_or_default();
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        config.headers.extend(self.headers);
        config.validate()?;

        let transport: Arc<dyn Transport> = match (self.transport, self.http) {
            (Some(transport), _) => transport,
            (None, Some(http)) => Arc::new(ReqwestTransport::new(http)),
            (None, None) => {
                let http = reqwest::Client::builder().build().map_err(|e| {
                    Error::Config(format!("Failed to build HTTP client: {}", e))
                })?;
                Arc::new(ReqwestTransport::new(http))
            }
        };

        let credentials = CredentialState::new();
        if let Some(credential) = self.credential {
            credentials.set_credential(credential, None);
        }

        tracing::debug!(
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Building client"
        );

        let dispatcher = RequestDispatcher::new(config, transport, credentials);
        let resolver = CredentialResolver::new(dispatcher.clone());
        Ok(Client {
            dispatcher,
            resolver,
        })
    }
}
