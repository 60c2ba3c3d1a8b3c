//! Active credential tracking with single-flight renewal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;

use super::{AuthMode, Credential, ResourceCategory};
use crate::{Error, Result};

/// Renewal starts this long before the recorded expiry.
pub const RENEWAL_WINDOW: Duration = Duration::from_secs(30);

/// Fresh credential produced by a [`RenewalStrategy`].
#[derive(Clone, Debug)]
pub struct RenewedCredential {
    pub credential: Credential,
    pub expires_in: Duration,
}

/// Produces a fresh credential when the active one is about to expire or
/// was rejected by the server.
#[async_trait]
pub trait RenewalStrategy: Send + Sync {
    async fn renew(&self) -> Result<RenewedCredential>;
}

type RenewalHandle = Shared<BoxFuture<'static, Result<()>>>;

#[derive(Default)]
struct StateInner {
    credential: Option<Credential>,
    expires_at: Option<Instant>,
    strategy: Option<Arc<dyn RenewalStrategy>>,
    in_flight: Option<RenewalHandle>,
    // Bumped on clear so a renewal started before logout cannot reinstall.
    generation: u64,
}

impl StateInner {
    // A lifetime past the clock's range counts as "not known to expire".
    fn install(&mut self, credential: Credential, expires_in: Option<Duration>) {
        self.credential = Some(credential);
        self.expires_at = expires_in.and_then(|ttl| Instant::now().checked_add(ttl));
    }
}

/// Single source of truth for the active credential.
///
/// Cloning yields another handle to the same state. At most one renewal
/// runs at a time; concurrent callers of [`ensure_valid`](Self::ensure_valid)
/// and [`force_renewal`](Self::force_renewal) await the same outcome.
#[derive(Clone, Default)]
pub struct CredentialState {
    inner: Arc<Mutex<StateInner>>,
}

fn lock(inner: &Mutex<StateInner>) -> MutexGuard<'_, StateInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CredentialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state holding a credential that is not known to expire.
    pub fn with_credential(credential: Credential) -> Self {
        let state = Self::new();
        state.set_credential(credential, None);
        state
    }

    /// Replace the active credential. The renewal strategy is kept.
    pub fn set_credential(&self, credential: Credential, expires_in: Option<Duration>) {
        lock(&self.inner).install(credential, expires_in);
    }

    /// Drop the credential, its expiry, the renewal strategy and any
    /// in-flight renewal.
    pub fn clear_credential(&self) {
        let mut inner = lock(&self.inner);
        inner.credential = None;
        inner.expires_at = None;
        inner.strategy = None;
        inner.in_flight = None;
        inner.generation = inner.generation.wrapping_add(1);
    }

    /// Install a credential together with the strategy that renews it.
    ///
    /// A renewal still running for the previous session is discarded.
    pub fn start_session(
        &self,
        credential: Credential,
        expires_in: Duration,
        strategy: Arc<dyn RenewalStrategy>,
    ) {
        let mut inner = lock(&self.inner);
        inner.install(credential, Some(expires_in));
        inner.strategy = Some(strategy);
        inner.in_flight = None;
        inner.generation = inner.generation.wrapping_add(1);
    }

    pub fn set_renewal_strategy(&self, strategy: Arc<dyn RenewalStrategy>) {
        lock(&self.inner).strategy = Some(strategy);
    }

    pub fn current(&self) -> Option<Credential> {
        lock(&self.inner).credential.clone()
    }

    pub fn mode(&self) -> Option<AuthMode> {
        lock(&self.inner).credential.as_ref().map(Credential::mode)
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner).credential.is_some()
    }

    pub fn can_renew(&self) -> bool {
        lock(&self.inner).strategy.is_some()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        lock(&self.inner).expires_at
    }

    pub fn is_renewing(&self) -> bool {
        lock(&self.inner).in_flight.is_some()
    }

    /// Renew the credential if it expires within [`RENEWAL_WINDOW`].
    ///
    /// No-op without a credential, an expiry, or a renewal strategy.
    pub async fn ensure_valid(&self) -> Result<()> {
        let handle = {
            let mut inner = lock(&self.inner);
            if inner.credential.is_none() {
                return Ok(());
            }
            let (Some(expires_at), Some(strategy)) = (inner.expires_at, inner.strategy.clone())
            else {
                return Ok(());
            };
            if Instant::now() + RENEWAL_WINDOW < expires_at {
                return Ok(());
            }
            self.renewal(&mut inner, strategy)
        };
        handle.await
    }

    /// Renew regardless of the recorded expiry.
    ///
    /// Used after the server rejected the credential. No-op when no
    /// renewal strategy is installed.
    pub async fn force_renewal(&self) -> Result<()> {
        let handle = {
            let mut inner = lock(&self.inner);
            let Some(strategy) = inner.strategy.clone() else {
                return Ok(());
            };
            self.renewal(&mut inner, strategy)
        };
        handle.await
    }

    /// Check that the active credential may call resources of `category`.
    pub fn require_authorized_for(&self, category: ResourceCategory) -> Result<()> {
        let allowed = category.allowed_modes();
        let Some(mode) = self.mode() else {
            return Err(Error::Authentication {
                message: "Not authenticated. Call client.login() first.".into(),
                current_mode: None,
                allowed_modes: allowed.to_vec(),
            });
        };
        if !category.allows(mode) {
            let names: Vec<&str> = allowed.iter().map(AuthMode::as_str).collect();
            return Err(Error::Authentication {
                message: format!(
                    "Auth mode \"{}\" is not allowed for {}. Allowed modes: {}",
                    mode,
                    category,
                    names.join(", ")
                ),
                current_mode: Some(mode),
                allowed_modes: allowed.to_vec(),
            });
        }
        Ok(())
    }

    /// Join the in-flight renewal or start one. Caller holds the lock.
    fn renewal(&self, inner: &mut StateInner, strategy: Arc<dyn RenewalStrategy>) -> RenewalHandle {
        if let Some(handle) = &inner.in_flight {
            return handle.clone();
        }

        let generation = inner.generation;
        let state = Arc::clone(&self.inner);
        let handle = async move {
            tracing::debug!("Renewing credential");
            let outcome = strategy.renew().await;

            let mut inner = lock(&state);
            if inner.generation != generation {
                tracing::debug!("Credential cleared during renewal, discarding result");
                return outcome.map(|_| ());
            }
            inner.in_flight = None;
            match outcome {
                Ok(renewed) => {
                    tracing::debug!(
                        expires_in_secs = renewed.expires_in.as_secs(),
                        "Credential renewed"
                    );
                    inner.install(renewed.credential, Some(renewed.expires_in));
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Credential renewal failed");
                    Err(e)
                }
            }
        }
        .boxed()
        .shared();

        inner.in_flight = Some(handle.clone());

        // Drive the renewal to completion even if every awaiter goes away.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(handle.clone());
        }

        handle
    }
}

impl std::fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("CredentialState")
            .field("mode", &inner.credential.as_ref().map(Credential::mode))
            .field("expires_at", &inner.expires_at)
            .field("can_renew", &inner.strategy.is_some())
            .field("renewing", &inner.in_flight.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStrategy {
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingStrategy {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(50),
                fail: true,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RenewalStrategy for CountingStrategy {
        async fn renew(&self) -> Result<RenewedCredential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(Error::network("renewal endpoint unreachable", None));
            }
            Ok(RenewedCredential {
                credential: Credential::identity_access_token(format!("renewed-{}", n)),
                expires_in: Duration::from_secs(3600),
            })
        }
    }

    fn token(state: &CredentialState) -> String {
        state
            .current()
            .map(|c| c.secret().expose_secret().to_string())
            .unwrap_or_default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_renewal() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(
            Credential::identity_access_token("old"),
            Some(Duration::from_secs(10)),
        );
        state.set_renewal_strategy(strategy.clone());

        let results = futures::future::join_all((0..16).map(|_| {
            let state = state.clone();
            async move {
                state.ensure_valid().await.unwrap();
                token(&state)
            }
        }))
        .await;

        assert_eq!(strategy.call_count(), 1);
        assert!(results.iter().all(|t| t == "renewed-1"));
        assert!(!state.is_renewing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_expiry_never_renews() {
        let state = CredentialState::with_credential(Credential::api_key("static"));
        let strategy = CountingStrategy::new();
        state.set_renewal_strategy(strategy.clone());

        for _ in 0..10 {
            state.ensure_valid().await.unwrap();
            tokio::time::advance(Duration::from_secs(3600)).await;
        }
        assert_eq!(strategy.call_count(), 0);
        assert_eq!(token(&state), "static");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_lifetime_means_no_expiry() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(
            Credential::identity_access_token("long"),
            Some(Duration::from_secs(u64::MAX)),
        );
        state.set_renewal_strategy(strategy.clone());

        assert!(state.expires_at().is_none());
        state.ensure_valid().await.unwrap();
        assert_eq!(strategy.call_count(), 0);
        assert_eq!(token(&state), "long");

        state.start_session(Credential::jwt("next"), Duration::MAX, strategy.clone());
        assert!(state.expires_at().is_none());
        assert!(state.can_renew());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_strategy_is_noop() {
        let state = CredentialState::new();
        state.set_credential(Credential::jwt("jwt"), Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_secs(5)).await;

        state.ensure_valid().await.unwrap();
        assert_eq!(token(&state), "jwt");
        assert!(!state.can_renew());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_credential_is_noop() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_renewal_strategy(strategy.clone());

        state.ensure_valid().await.unwrap();
        assert_eq!(strategy.call_count(), 0);
        assert!(!state.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_outside_window_does_not_renew() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(Credential::jwt("a"), Some(Duration::from_secs(120)));
        state.set_renewal_strategy(strategy.clone());

        state.ensure_valid().await.unwrap();
        assert_eq!(strategy.call_count(), 0);

        tokio::time::advance(Duration::from_secs(91)).await;
        state.ensure_valid().await.unwrap();
        assert_eq!(strategy.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_lifetime_swaps_token_and_expiry() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(
            Credential::identity_access_token("short"),
            Some(Duration::from_secs(1)),
        );
        state.set_renewal_strategy(strategy.clone());
        let old_expiry = state.expires_at().unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        state.ensure_valid().await.unwrap();

        assert_eq!(token(&state), "renewed-1");
        let new_expiry = state.expires_at().unwrap();
        assert!(new_expiry > old_expiry + Duration::from_secs(3500));
        assert!(state.can_renew());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_reaches_all_waiters_and_keeps_old_credential() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::failing();
        state.set_credential(Credential::jwt("old"), Some(Duration::from_secs(5)));
        state.set_renewal_strategy(strategy.clone());

        let (a, b) = tokio::join!(state.ensure_valid(), state.ensure_valid());
        assert!(matches!(a, Err(Error::Network { .. })));
        assert!(matches!(b, Err(Error::Network { .. })));
        assert_eq!(strategy.call_count(), 1);
        assert_eq!(token(&state), "old");
        assert!(!state.is_renewing());

        // The slot is released, so the next check tries again.
        let _ = state.ensure_valid().await;
        assert_eq!(strategy.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_renewal_ignores_expiry() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(Credential::jwt("fresh"), Some(Duration::from_secs(3600)));
        state.set_renewal_strategy(strategy.clone());

        let (a, b) = tokio::join!(state.force_renewal(), state.force_renewal());
        a.unwrap();
        b.unwrap();
        assert_eq!(strategy.call_count(), 1);
        assert_eq!(token(&state), "renewed-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_in_flight_renewal() {
        let state = CredentialState::new();
        let strategy = CountingStrategy::new();
        state.set_credential(Credential::jwt("old"), Some(Duration::from_secs(1)));
        state.set_renewal_strategy(strategy.clone());

        let pending = {
            let state = state.clone();
            tokio::spawn(async move { state.force_renewal().await })
        };
        tokio::task::yield_now().await;
        state.clear_credential();
        pending.await.unwrap().unwrap();

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!state.is_authenticated());
        assert!(!state.can_renew());
        assert!(state.expires_at().is_none());
    }

    #[test]
    fn test_require_authorized_for() {
        let state = CredentialState::new();
        match state.require_authorized_for(ResourceCategory::Secrets) {
            Err(Error::Authentication {
                current_mode,
                allowed_modes,
                ..
            }) => {
                assert!(current_mode.is_none());
                assert_eq!(allowed_modes.len(), 3);
            }
            other => panic!("expected authentication error, got {:?}", other),
        }

        state.set_credential(Credential::service_token("st"), None);
        assert!(state.require_authorized_for(ResourceCategory::Secrets).is_ok());
        match state.require_authorized_for(ResourceCategory::Admin) {
            Err(Error::Authentication {
                message,
                current_mode,
                ..
            }) => {
                assert_eq!(current_mode, Some(AuthMode::ServiceToken));
                assert!(message.contains("serviceToken"));
                assert!(message.contains("admin"));
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
    }
}
