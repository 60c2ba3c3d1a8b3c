//! Login flow and descriptor-driven credential renewal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::{
    Credential, CredentialState, LoginDescriptor, LoginResponse, RenewalStrategy,
    RenewedCredential,
};
use crate::Result;
use crate::client::RequestDispatcher;

/// Run one login round trip: resolve the descriptor, then call the method's
/// login endpoint without authentication.
async fn authenticate(
    dispatcher: &RequestDispatcher,
    descriptor: &LoginDescriptor,
) -> Result<LoginResponse> {
    let params = descriptor.resolve().await?;
    let body = params.body()?;
    tracing::debug!(method = params.method(), "Logging in");
    dispatcher.post_no_auth(&params.endpoint(), &body).await
}

fn issued(response: &LoginResponse) -> RenewedCredential {
    RenewedCredential {
        credential: Credential::identity_access_token(response.access_token.expose_secret()),
        expires_in: Duration::from_secs(response.expires_in),
    }
}

/// Renews by repeating the login described by a [`LoginDescriptor`].
struct LoginRenewal {
    descriptor: LoginDescriptor,
    dispatcher: RequestDispatcher,
}

#[async_trait]
impl RenewalStrategy for LoginRenewal {
    async fn renew(&self) -> Result<RenewedCredential> {
        let response = authenticate(&self.dispatcher, &self.descriptor).await?;
        Ok(issued(&response))
    }
}

/// Turns login descriptors into an active session on a [`CredentialState`].
#[derive(Clone, Debug)]
pub struct CredentialResolver {
    dispatcher: RequestDispatcher,
}

impl CredentialResolver {
    pub fn new(dispatcher: RequestDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn state(&self) -> &CredentialState {
        self.dispatcher.credentials()
    }

    /// Log in and install the issued identity access token.
    ///
    /// On success the descriptor becomes the renewal strategy, so later
    /// renewals evaluate it again. On failure the existing state is left
    /// untouched.
    pub async fn login(&self, descriptor: impl Into<LoginDescriptor>) -> Result<LoginResponse> {
        let descriptor = descriptor.into();
        let response = authenticate(&self.dispatcher, &descriptor).await?;

        let RenewedCredential {
            credential,
            expires_in,
        } = issued(&response);
        let strategy = LoginRenewal {
            descriptor,
            dispatcher: self.dispatcher.detached(),
        };
        self.state()
            .start_session(credential, expires_in, Arc::new(strategy));

        tracing::debug!(expires_in_secs = response.expires_in, "Login succeeded");
        Ok(response)
    }

    /// Forget the credential and stop renewing it.
    pub fn logout(&self) {
        self.state().clear_credential();
    }
}
