//! Credential types.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Header carrying the static API key credential.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Authentication mode, i.e. the variant tag of a [`Credential`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMode {
    /// User session token obtained through the password flow.
    Jwt,
    /// Static API key.
    ApiKey,
    /// Static service token.
    ServiceToken,
    /// Short-lived machine identity access token.
    IdentityAccessToken,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Jwt => "jwt",
            AuthMode::ApiKey => "apiKey",
            AuthMode::ServiceToken => "serviceToken",
            AuthMode::IdentityAccessToken => "identityAccessToken",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication credential.
///
/// Each variant carries only the secret needed to build its auth header.
/// `Debug` output never includes the secret.
#[derive(Clone)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Jwt(SecretString),
    /// `X-API-KEY: <key>`.
    ApiKey(SecretString),
    /// `Authorization: Bearer <token>`.
    ServiceToken(SecretString),
    /// `Authorization: Bearer <token>`.
    IdentityAccessToken(SecretString),
}

impl Credential {
    pub fn jwt(token: impl Into<String>) -> Self {
        Self::Jwt(SecretString::from(token.into()))
    }

    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(SecretString::from(key.into()))
    }

    pub fn service_token(token: impl Into<String>) -> Self {
        Self::ServiceToken(SecretString::from(token.into()))
    }

    pub fn identity_access_token(token: impl Into<String>) -> Self {
        Self::IdentityAccessToken(SecretString::from(token.into()))
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Credential::Jwt(_) => AuthMode::Jwt,
            Credential::ApiKey(_) => AuthMode::ApiKey,
            Credential::ServiceToken(_) => AuthMode::ServiceToken,
            Credential::IdentityAccessToken(_) => AuthMode::IdentityAccessToken,
        }
    }

    /// Raw secret material.
    pub fn secret(&self) -> &SecretString {
        match self {
            Credential::Jwt(s)
            | Credential::ApiKey(s)
            | Credential::ServiceToken(s)
            | Credential::IdentityAccessToken(s) => s,
        }
    }

    /// Returns the authentication header (name, value).
    pub fn auth_header(&self) -> (&'static str, String) {
        match self {
            Credential::ApiKey(key) => (API_KEY_HEADER, key.expose_secret().to_string()),
            Credential::Jwt(token)
            | Credential::ServiceToken(token)
            | Credential::IdentityAccessToken(token) => (
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            ),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("mode", &self.mode())
            .field("secret", &"[redacted]")
            .finish()
    }
}
