//! Machine identity login methods.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Result;

fn expose<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Response returned by every login endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(deserialize_with = "secret")]
    pub access_token: SecretString,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    #[serde(rename = "accessTokenMaxTTL", default)]
    pub access_token_max_ttl: u64,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversalAuthLogin {
    pub client_id: String,
    #[serde(serialize_with = "expose")]
    pub client_secret: SecretString,
}

impl UniversalAuthLogin {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthLogin {
    pub identity_id: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAuthLogin {
    pub identity_id: String,
    pub iam_http_request_method: String,
    /// Base64-encoded signed `GetCallerIdentity` body.
    pub iam_request_body: String,
    /// Base64-encoded JSON of the signed request headers.
    #[serde(serialize_with = "expose")]
    pub iam_request_headers: SecretString,
}

/// Login with a provider-issued JWT.
///
/// Shared by the GCP, Azure, Kubernetes, OIDC and generic JWT methods.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtLogin {
    pub identity_id: String,
    #[serde(serialize_with = "expose")]
    pub jwt: SecretString,
}

impl JwtLogin {
    pub fn new(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            jwt: SecretString::from(jwt.into()),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LdapAuthLogin {
    pub identity_id: String,
    pub username: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ldap_config_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsCertAuthLogin {
    pub identity_id: String,
    /// PEM-encoded client certificate.
    pub client_certificate: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OciAuthLogin {
    pub identity_id: String,
    pub user_ocid: String,
    #[serde(serialize_with = "expose")]
    pub request_headers: SecretString,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlicloudAuthLogin {
    pub identity_id: String,
    #[serde(serialize_with = "expose")]
    pub sts_token: SecretString,
    pub identity_arn: String,
}

/// One concrete way of obtaining an identity access token.
#[derive(Clone, Debug)]
pub enum LoginParams {
    UniversalAuth(UniversalAuthLogin),
    TokenAuth(TokenAuthLogin),
    AwsAuth(AwsAuthLogin),
    GcpAuth(JwtLogin),
    AzureAuth(JwtLogin),
    KubernetesAuth(JwtLogin),
    OidcAuth(JwtLogin),
    JwtAuth(JwtLogin),
    LdapAuth(LdapAuthLogin),
    TlsCertAuth(TlsCertAuthLogin),
    OciAuth(OciAuthLogin),
    AlicloudAuth(AlicloudAuthLogin),
}

impl LoginParams {
    /// Login method name for logging.
    pub fn method(&self) -> &'static str {
        match self {
            LoginParams::UniversalAuth(_) => "universal-auth",
            LoginParams::TokenAuth(_) => "token",
            LoginParams::AwsAuth(_) => "aws-auth",
            LoginParams::GcpAuth(_) => "gcp-auth",
            LoginParams::AzureAuth(_) => "azure-auth",
            LoginParams::KubernetesAuth(_) => "kubernetes-auth",
            LoginParams::OidcAuth(_) => "oidc-auth",
            LoginParams::JwtAuth(_) => "jwt-auth",
            LoginParams::LdapAuth(_) => "ldap-auth",
            LoginParams::TlsCertAuth(_) => "tls-cert-auth",
            LoginParams::OciAuth(_) => "oci-auth",
            LoginParams::AlicloudAuth(_) => "alicloud-auth",
        }
    }

    pub fn endpoint(&self) -> String {
        format!("/api/v1/auth/{}/login", self.method())
    }

    pub fn body(&self) -> Result<serde_json::Value> {
        let value = match self {
            LoginParams::UniversalAuth(p) => serde_json::to_value(p),
            LoginParams::TokenAuth(p) => serde_json::to_value(p),
            LoginParams::AwsAuth(p) => serde_json::to_value(p),
            LoginParams::GcpAuth(p)
            | LoginParams::AzureAuth(p)
            | LoginParams::KubernetesAuth(p)
            | LoginParams::OidcAuth(p)
            | LoginParams::JwtAuth(p) => serde_json::to_value(p),
            LoginParams::LdapAuth(p) => serde_json::to_value(p),
            LoginParams::TlsCertAuth(p) => serde_json::to_value(p),
            LoginParams::OciAuth(p) => serde_json::to_value(p),
            LoginParams::AlicloudAuth(p) => serde_json::to_value(p),
        }?;
        Ok(value)
    }

    pub fn universal_auth(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::UniversalAuth(UniversalAuthLogin::new(client_id, client_secret))
    }

    pub fn token_auth(identity_id: impl Into<String>) -> Self {
        Self::TokenAuth(TokenAuthLogin {
            identity_id: identity_id.into(),
        })
    }

    pub fn kubernetes_auth(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self::KubernetesAuth(JwtLogin::new(identity_id, jwt))
    }

    pub fn gcp_auth(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self::GcpAuth(JwtLogin::new(identity_id, jwt))
    }

    pub fn azure_auth(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self::AzureAuth(JwtLogin::new(identity_id, jwt))
    }

    pub fn oidc_auth(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self::OidcAuth(JwtLogin::new(identity_id, jwt))
    }

    pub fn jwt_auth(identity_id: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self::JwtAuth(JwtLogin::new(identity_id, jwt))
    }
}
