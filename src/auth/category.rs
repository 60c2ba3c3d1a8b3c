//! Resource categories and the auth modes allowed to call them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::AuthMode;

const USER_AND_SERVICE: &[AuthMode] = &[
    AuthMode::Jwt,
    AuthMode::ServiceToken,
    AuthMode::IdentityAccessToken,
];
const USER_AND_IDENTITY: &[AuthMode] = &[AuthMode::Jwt, AuthMode::IdentityAccessToken];
const USER_ONLY: &[AuthMode] = &[AuthMode::Jwt];

/// API resource category.
///
/// Each resource wrapper belongs to exactly one category and checks the
/// active credential against [`ResourceCategory::allowed_modes`] before
/// issuing a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceCategory {
    Secrets,
    SecretFolders,
    SecretImports,
    Projects,
    Organizations,
    OrganizationIdentities,
    Identities,
    IdentityAuth,
    IdentityAccessTokens,
    Pki,
    Kms,
    SecretTags,
    AppConnections,
    SecretSyncs,
    IntegrationAuth,
    Admin,
    OrgAdmin,
    SecretSharing,
    Webhooks,
    Users,
    Mfa,
    MfaSessions,
    ServiceTokens,
    Password,
}

impl ResourceCategory {
    pub fn allowed_modes(&self) -> &'static [AuthMode] {
        use ResourceCategory::*;
        match self {
            Secrets | SecretFolders | SecretImports => USER_AND_SERVICE,
            Projects | Organizations | OrganizationIdentities | Identities | IdentityAuth
            | IdentityAccessTokens | Pki | Kms | SecretTags | AppConnections | SecretSyncs
            | IntegrationAuth => USER_AND_IDENTITY,
            Admin | OrgAdmin | SecretSharing | Webhooks | Users | Mfa | MfaSessions
            | ServiceTokens | Password => USER_ONLY,
        }
    }

    pub fn allows(&self, mode: AuthMode) -> bool {
        self.allowed_modes().contains(&mode)
    }

    pub fn as_str(&self) -> &'static str {
        use ResourceCategory::*;
        match self {
            Secrets => "secrets",
            SecretFolders => "secretFolders",
            SecretImports => "secretImports",
            Projects => "projects",
            Organizations => "organizations",
            OrganizationIdentities => "organizationIdentities",
            Identities => "identities",
            IdentityAuth => "identityAuth",
            IdentityAccessTokens => "identityAccessTokens",
            Pki => "pki",
            Kms => "kms",
            SecretTags => "secretTags",
            AppConnections => "appConnections",
            SecretSyncs => "secretSyncs",
            IntegrationAuth => "integrationAuth",
            Admin => "admin",
            OrgAdmin => "orgAdmin",
            SecretSharing => "secretSharing",
            Webhooks => "webhooks",
            Users => "users",
            Mfa => "mfa",
            MfaSessions => "mfaSessions",
            ServiceTokens => "serviceTokens",
            Password => "password",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
