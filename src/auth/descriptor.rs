//! Login descriptors: fixed parameters or a factory evaluated per login.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::LoginParams;
use crate::Result;

/// Produces login parameters on demand.
pub type LoginFactory = Arc<dyn Fn() -> BoxFuture<'static, Result<LoginParams>> + Send + Sync>;

/// How to obtain login parameters.
///
/// A factory is called again for every renewal, so short-lived inputs such
/// as a projected service account token or a signed cloud request are
/// fresh each time.
#[derive(Clone)]
pub enum LoginDescriptor {
    Fixed(LoginParams),
    Factory(LoginFactory),
}

impl LoginDescriptor {
    pub fn fixed(params: LoginParams) -> Self {
        Self::Fixed(params)
    }

    /// Wrap an async closure.
    pub fn factory<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LoginParams>> + Send + 'static,
    {
        Self::Factory(Arc::new(move || f().boxed()))
    }

    /// Wrap a synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<LoginParams> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(move || futures::future::ready(f()).boxed()))
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }

    /// Current login parameters. Factory errors propagate unchanged.
    pub async fn resolve(&self) -> Result<LoginParams> {
        match self {
            Self::Fixed(params) => Ok(params.clone()),
            Self::Factory(factory) => factory().await,
        }
    }
}

impl From<LoginParams> for LoginDescriptor {
    fn from(params: LoginParams) -> Self {
        Self::Fixed(params)
    }
}

impl fmt::Debug for LoginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(params) => f.debug_tuple("Fixed").field(&params.method()).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
