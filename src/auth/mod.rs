//! Authentication for the Infisical API.
//!
//! - [`Credential`]: the active secret and how it is sent
//! - [`CredentialState`]: expiry tracking with single-flight renewal
//! - [`CredentialResolver`]: machine identity login from a [`LoginDescriptor`]
//! - [`ResourceCategory`]: which auth modes may call which resources

mod category;
mod credential;
mod descriptor;
mod login;
mod resolver;
mod state;

pub use category::ResourceCategory;
pub use credential::{API_KEY_HEADER, AuthMode, Credential};
pub use descriptor::{LoginDescriptor, LoginFactory};
pub use login::{
    AlicloudAuthLogin, AwsAuthLogin, JwtLogin, LdapAuthLogin, LoginParams, LoginResponse,
    OciAuthLogin, TlsCertAuthLogin, TokenAuthLogin, UniversalAuthLogin,
};
pub use resolver::CredentialResolver;
pub use state::{CredentialState, RENEWAL_WINDOW, RenewalStrategy, RenewedCredential};
