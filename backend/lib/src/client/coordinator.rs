//! Client side of the wallet login
//!
//! One [`AuthCoordinator`] drives one connected wallet through
//! `Disconnected → NonceRequested → AwaitingSignature → Verifying → Resolved`,
//! or into `Failed`. Every login starts a new attempt; starting one, or
//! disconnecting, cancels whatever the previous attempt was waiting on and any
//! late result it produces is dropped.

use std::future::Future;
use std::sync::Arc;

use alloy_core::primitives::Address;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::AuthApi;
use super::session::{ProfileView, SessionState};
use super::wallet::{WalletError, WalletSigner};
use crate::error::Error;
use crate::models::{LoginMessage, Profile, TokenId, VerifyRequest};

/// Why a login ended in [`AuthState::Failed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// The nonce was unknown, expired or already used; a new login is needed
    InvalidOrExpiredNonce,
    InvalidSignature,
    /// The signature was accepted but holdings could not be read; see
    /// [`AuthCoordinator::retry_profile`]
    OwnershipLookupUnavailable,
    /// The wallet declined to sign
    SignatureRejected,
    /// Transport or any other backend failure
    Backend,
}

impl From<&Error> for LoginFailure {
    fn from(error: &Error) -> Self {
        match error {
            Error::InvalidOrExpiredNonce => LoginFailure::InvalidOrExpiredNonce,
            Error::InvalidSignature => LoginFailure::InvalidSignature,
            Error::OwnershipLookupUnavailable(_) => LoginFailure::OwnershipLookupUnavailable,
            _ => LoginFailure::Backend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Disconnected,
    NonceRequested,
    AwaitingSignature,
    Verifying,
    Resolved,
    Failed(LoginFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Login failed: {0:?}")]
    Failed(LoginFailure),

    /// The attempt was superseded or disconnected; nothing was changed
    #[error("Login attempt abandoned")]
    Abandoned,

    #[error("Operation not available in state {0:?}")]
    InvalidState(AuthState),
}

struct Attempt {
    generation: u64,
    cancel: CancellationToken,
    address: Option<Address>,
}

pub struct AuthCoordinator {
    api: Arc<dyn AuthApi>,
    session: SessionState,
    state: watch::Sender<AuthState>,
    attempt: Mutex<Attempt>,
}

impl AuthCoordinator {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        let (state, _) = watch::channel(AuthState::Disconnected);

        Self {
            api,
            session: SessionState::new(),
            state,
            attempt: Mutex::new(Attempt {
                generation: 0,
                cancel: CancellationToken::new(),
                address: None,
            }),
        }
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.session.current()
    }

    pub fn profile_view(&self) -> ProfileView {
        self.session.subscribe()
    }

    /// Supersede any running attempt and start a new one for `address`
    fn begin(&self, address: Address) -> (u64, CancellationToken) {
        let mut attempt = self.attempt.lock();

        attempt.cancel.cancel();
        attempt.generation += 1;
        attempt.cancel = CancellationToken::new();

        if attempt.address != Some(address) {
            self.session.clear();
        }
        attempt.address = Some(address);

        (attempt.generation, attempt.cancel.clone())
    }

    /// Move to `state` if attempt `generation` is still the current one
    fn transition(&self, generation: u64, state: AuthState) -> Result<(), LoginError> {
        let attempt = self.attempt.lock();
        if attempt.generation != generation {
            return Err(LoginError::Abandoned);
        }

        self.state.send_replace(state);
        Ok(())
    }

    fn fail(&self, generation: u64, failure: LoginFailure) -> LoginError {
        match self.transition(generation, AuthState::Failed(failure)) {
            Ok(()) => LoginError::Failed(failure),
            Err(abandoned) => abandoned,
        }
    }

    fn resolve(&self, generation: u64, profile: Profile) -> Result<Profile, LoginError> {
        let attempt = self.attempt.lock();
        if attempt.generation != generation {
            return Err(LoginError::Abandoned);
        }

        self.session.publish(profile.clone());
        self.state.send_replace(AuthState::Resolved);
        Ok(profile)
    }

    async fn until_cancelled<T>(
        cancel: &CancellationToken,
        fut: impl Future<Output = T>,
    ) -> Result<T, LoginError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(LoginError::Abandoned),
            out = fut => Ok(out),
        }
    }

    /// Run the whole login for `wallet`
    ///
    /// While an earlier login of the same address is resolved its profile stays
    /// published until this one resolves.
    pub async fn login(&self, wallet: &dyn WalletSigner) -> Result<Profile, LoginError> {
        let address = wallet.address();
        let (generation, cancel) = self.begin(address);
        debug!(%address, generation, "Starting login");

        self.transition(generation, AuthState::NonceRequested)?;
        let challenge = Self::until_cancelled(&cancel, self.api.nonce(&address))
            .await?
            .map_err(|e| {
                warn!(%address, error = %e, "Nonce request failed");
                self.fail(generation, LoginFailure::from(&e))
            })?;

        self.transition(generation, AuthState::AwaitingSignature)?;
        let message = LoginMessage::new(address, challenge.nonce).to_string();
        let signature = Self::until_cancelled(&cancel, wallet.sign_message(&message))
            .await?
            .map_err(|e| {
                match &e {
                    WalletError::Rejected => info!(%address, "Wallet declined to sign"),
                    WalletError::Signer(reason) => warn!(%address, %reason, "Wallet failed to sign"),
                }
                self.fail(generation, LoginFailure::SignatureRejected)
            })?;

        self.transition(generation, AuthState::Verifying)?;
        let request = VerifyRequest {
            address,
            message,
            signature,
        };
        let profile = Self::until_cancelled(&cancel, self.api.verify_signature(&request))
            .await?
            .map_err(|e| {
                warn!(%address, error = %e, "Signature verification failed");
                self.fail(generation, LoginFailure::from(&e))
            })?;

        info!(%address, tier = ?profile.holder_tier(), "Logged in");
        self.resolve(generation, profile)
    }

    /// Fetch the profile again after the backend could not read holdings
    ///
    /// The signature was already accepted, so no new nonce is requested.
    pub async fn retry_profile(&self) -> Result<Profile, LoginError> {
        let state = self.state();
        let address = match (state, self.attempt.lock().address) {
            (AuthState::Failed(LoginFailure::OwnershipLookupUnavailable), Some(address)) => address,
            _ => return Err(LoginError::InvalidState(state)),
        };

        let (generation, cancel) = self.begin(address);
        self.transition(generation, AuthState::Verifying)?;

        let profile = Self::until_cancelled(&cancel, self.api.refresh_profile(&address))
            .await?
            .map_err(|e| {
                warn!(%address, error = %e, "Profile retry failed");
                self.fail(generation, LoginFailure::from(&e))
            })?;

        self.resolve(generation, profile)
    }

    /// Make `token` the primary token of the signed in wallet
    ///
    /// Failures leave the session untouched.
    pub async fn select_primary(&self, token: TokenId) -> Result<Profile, Error> {
        let (generation, address) = {
            let attempt = self.attempt.lock();
            match (self.state(), attempt.address) {
                (AuthState::Resolved, Some(address)) => (attempt.generation, address),
                (state, _) => {
                    return Err(Error::Unauthorized(format!("Not signed in ({state:?})")));
                }
            }
        };

        let profile = self.api.set_primary(&address, token).await?;

        self.resolve(generation, profile)
            .map_err(|_| Error::Unauthorized("Session changed during update".to_string()))
    }

    /// Drop the session from any state
    pub fn disconnect(&self) {
        let mut attempt = self.attempt.lock();

        attempt.cancel.cancel();
        attempt.generation += 1;
        attempt.cancel = CancellationToken::new();
        attempt.address = None;

        self.session.clear();
        self.state.send_replace(AuthState::Disconnected);
        debug!("Wallet disconnected");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::client::wallet::LocalWallet;
    use crate::constants::test::tokens::{BRONZE_HOLDER, SILVER_HOLDER, UNOWNED_TOKEN};
    use crate::data::ownership::MockOwnership;
    use crate::models::HolderTier;
    use crate::services::Services;

    /// Wallet that waits for the test before signing, or declines
    struct ManualWallet {
        inner: LocalWallet,
        release: Arc<Notify>,
        decline: bool,
    }

    impl ManualWallet {
        fn new(decline: bool) -> Self {
            Self {
                inner: LocalWallet::random(),
                release: Arc::new(Notify::new()),
                decline,
            }
        }
    }

    #[async_trait]
    impl WalletSigner for ManualWallet {
        fn address(&self) -> Address {
            self.inner.address()
        }

        async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
            if self.decline {
                return Err(WalletError::Rejected);
            }
            self.release.notified().await;
            self.inner.sign_message(message).await
        }
    }

    fn coordinator(ownership: &MockOwnership) -> AuthCoordinator {
        AuthCoordinator::new(Arc::new(Services::mocks_with(ownership.clone())))
    }

    async fn wait_for(coordinator: &AuthCoordinator, state: AuthState) {
        let mut states = coordinator.subscribe_state();
        tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == state))
            .await
            .expect("state not reached")
            .unwrap();
    }

    #[tokio::test]
    async fn login_resolves_profile() {
        let wallet = LocalWallet::random();
        let ownership = MockOwnership::new().with_tokens(wallet.address(), BRONZE_HOLDER);
        let coordinator = coordinator(&ownership);
        let view = coordinator.profile_view();

        let profile = coordinator.login(&wallet).await.unwrap();

        assert_eq!(coordinator.state(), AuthState::Resolved);
        assert_eq!(profile.nft_count(), 3);
        assert_eq!(profile.holder_tier(), HolderTier::Bronze);
        assert_eq!(profile.primary_nft_id(), Some(12));
        assert_eq!(view.current(), Some(profile));
    }

    #[tokio::test]
    async fn zero_holdings_resolve_without_nft() {
        let wallet = LocalWallet::random();
        let coordinator = coordinator(&MockOwnership::new());

        let profile = coordinator.login(&wallet).await.unwrap();

        assert_eq!(profile.holder_tier(), HolderTier::None);
        assert!(!coordinator.profile_view().has_nft());
    }

    #[tokio::test]
    async fn declined_signature_fails_login() {
        let wallet = ManualWallet::new(true);
        let coordinator = coordinator(&MockOwnership::new());

        assert_eq!(
            coordinator.login(&wallet).await,
            Err(LoginError::Failed(LoginFailure::SignatureRejected))
        );
        assert_eq!(
            coordinator.state(),
            AuthState::Failed(LoginFailure::SignatureRejected)
        );
        assert!(coordinator.profile().is_none());
    }

    #[tokio::test]
    async fn disconnect_abandons_pending_signature() {
        let wallet = ManualWallet::new(false);
        let release = wallet.release.clone();
        let coordinator = Arc::new(coordinator(&MockOwnership::new()));

        let login = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.login(&wallet).await })
        };

        wait_for(&coordinator, AuthState::AwaitingSignature).await;
        coordinator.disconnect();
        release.notify_one();

        assert_eq!(login.await.unwrap(), Err(LoginError::Abandoned));
        assert_eq!(coordinator.state(), AuthState::Disconnected);
        assert!(coordinator.profile().is_none());
    }

    #[tokio::test]
    async fn new_login_supersedes_pending_one() {
        let wallet = LocalWallet::random();
        let pending = ManualWallet::new(false);
        let ownership = MockOwnership::new().with_tokens(wallet.address(), SILVER_HOLDER);
        let coordinator = Arc::new(coordinator(&ownership));

        let stale = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.login(&pending).await })
        };
        wait_for(&coordinator, AuthState::AwaitingSignature).await;

        let profile = coordinator.login(&wallet).await.unwrap();

        assert_eq!(stale.await.unwrap(), Err(LoginError::Abandoned));
        assert_eq!(coordinator.state(), AuthState::Resolved);
        assert_eq!(coordinator.profile(), Some(profile));
    }

    #[tokio::test]
    async fn relogin_keeps_profile_until_resolved() {
        let wallet = ManualWallet::new(false);
        let release = wallet.release.clone();
        let ownership = MockOwnership::new().with_tokens(wallet.address(), BRONZE_HOLDER);
        let coordinator = Arc::new(coordinator(&ownership));

        release.notify_one();
        let first = coordinator.login(&wallet).await.unwrap();

        ownership.set_tokens(wallet.address(), SILVER_HOLDER);
        let relogin = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.login(&wallet).await })
        };

        wait_for(&coordinator, AuthState::AwaitingSignature).await;
        assert_eq!(coordinator.profile(), Some(first));

        release.notify_one();
        let second = relogin.await.unwrap().unwrap();

        assert_eq!(second.holder_tier(), HolderTier::Silver);
        assert_eq!(coordinator.profile(), Some(second));
    }

    #[tokio::test]
    async fn lookup_failure_is_retried_without_new_signature() {
        let wallet = LocalWallet::random();
        let ownership = MockOwnership::new().with_tokens(wallet.address(), BRONZE_HOLDER);
        ownership.fail_next(1);
        let coordinator = coordinator(&ownership);

        assert_eq!(
            coordinator.login(&wallet).await,
            Err(LoginError::Failed(LoginFailure::OwnershipLookupUnavailable))
        );
        assert!(coordinator.profile().is_none());

        let profile = coordinator.retry_profile().await.unwrap();

        assert_eq!(profile.holder_tier(), HolderTier::Bronze);
        assert_eq!(coordinator.state(), AuthState::Resolved);
    }

    #[tokio::test]
    async fn retry_profile_needs_lookup_failure() {
        let coordinator = coordinator(&MockOwnership::new());

        assert_eq!(
            coordinator.retry_profile().await,
            Err(LoginError::InvalidState(AuthState::Disconnected))
        );
    }

    #[tokio::test]
    async fn select_primary_republishes_profile() {
        let wallet = LocalWallet::random();
        let ownership = MockOwnership::new().with_tokens(wallet.address(), BRONZE_HOLDER);
        let coordinator = coordinator(&ownership);
        coordinator.login(&wallet).await.unwrap();

        let profile = coordinator.select_primary(99).await.unwrap();
        assert_eq!(profile.primary_nft_id(), Some(99));
        assert_eq!(coordinator.profile(), Some(profile));

        assert!(matches!(
            coordinator.select_primary(UNOWNED_TOKEN).await,
            Err(Error::NotOwned(UNOWNED_TOKEN))
        ));
        assert_eq!(coordinator.profile().unwrap().primary_nft_id(), Some(99));
        assert_eq!(coordinator.state(), AuthState::Resolved);
    }

    #[tokio::test]
    async fn select_primary_requires_login() {
        let coordinator = coordinator(&MockOwnership::new());
        assert!(matches!(
            coordinator.select_primary(12).await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn disconnect_clears_resolved_session() {
        let wallet = LocalWallet::random();
        let ownership = MockOwnership::new().with_tokens(wallet.address(), BRONZE_HOLDER);
        let coordinator = coordinator(&ownership);
        coordinator.login(&wallet).await.unwrap();

        coordinator.disconnect();

        assert_eq!(coordinator.state(), AuthState::Disconnected);
        assert!(coordinator.profile().is_none());
    }
}
