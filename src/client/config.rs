//! Client configuration.

use std::time::Duration;

use crate::{Error, Result};

/// Default Infisical API base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.infisical.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Path prefix added to paths that do not already start with `/api/`.
pub const DEFAULT_API_PREFIX: &str = "/api/v2";

pub const ENV_SITE_URL: &str = "INFISICAL_SITE_URL";
pub const ENV_TIMEOUT_MS: &str = "INFISICAL_TIMEOUT_MS";

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL for API requests, without a trailing slash.
    pub base_url: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Headers added to every request, overriding the built-in ones.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(ENV_SITE_URL)
            && !url.trim().is_empty()
        {
            config.base_url = url;
        }

        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("Invalid value for {}: {}", ENV_TIMEOUT_MS, raw))
            })?;
            config.timeout = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Check the base URL and timeout, normalizing the URL.
    pub fn validate(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        let parsed = url::Url::parse(trimmed)
            .map_err(|e| Error::Config(format!("Invalid base URL {:?}: {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL must use http or https: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("Timeout must be greater than zero".into()));
        }
        self.base_url = trimmed.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://app.infisical.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_validate_trims_trailing_slash() {
        let mut config = ClientConfig::default().base_url("https://vault.example.com/");
        config.validate().unwrap();
        assert_eq!(config.base_url, "https://vault.example.com");
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = ClientConfig::default().base_url("not a url");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = ClientConfig::default().base_url("ftp://example.com");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ClientConfig::default().timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
