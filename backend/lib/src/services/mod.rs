//! Services module for the ComputerChan backend

pub mod assets;
pub mod auth;
pub mod health;
pub mod nonce;
pub mod profile;
pub mod signature;

use std::sync::Arc;

use crate::config::Config;
use crate::data::{ownership::OwnershipSource, storage::BoxedStorage};
use crate::error::Result;
use crate::models::TierTable;

use assets::AssetGateway;
use auth::AuthService;
use health::HealthService;
use nonce::NonceStore;
use profile::ProfileResolver;

#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub nonces: Arc<NonceStore>,
    pub assets: Arc<AssetGateway>,
    pub health: Arc<HealthService>,
}

impl Services {
    /// Wire every service from `config`
    ///
    /// Fails if the configured tier table is not valid.
    pub fn new(
        config: &Config,
        storage: Arc<dyn BoxedStorage>,
        ownership: Arc<dyn OwnershipSource>,
    ) -> Result<Self> {
        let tiers = TierTable::new(config.tiers.clone())?;
        Ok(Self::assemble(config, tiers, storage, ownership))
    }

    fn assemble(
        config: &Config,
        tiers: TierTable,
        storage: Arc<dyn BoxedStorage>,
        ownership: Arc<dyn OwnershipSource>,
    ) -> Self {
        let nonces = Arc::new(NonceStore::new(
            storage.clone(),
            config.auth.nonce_expiration_seconds,
        ));
        let profiles = Arc::new(ProfileResolver::new(
            storage.clone(),
            ownership.clone(),
            tiers,
        ));
        let auth = Arc::new(AuthService::new(nonces.clone(), profiles, storage.clone()));
        let assets = Arc::new(AssetGateway::new(&config.assets));
        let health = Arc::new(HealthService::new(storage, ownership));

        Self {
            auth,
            nonces,
            assets,
            health,
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
impl Services {
    /// Services over in-memory storage where [`MOCK_ADDRESS`] holds [`MOCK_TOKENS`]
    ///
    /// [`MOCK_ADDRESS`]: crate::constants::mocks::MOCK_ADDRESS
    /// [`MOCK_TOKENS`]: crate::constants::mocks::MOCK_TOKENS
    pub fn mocks() -> Self {
        use crate::constants::mocks::{MOCK_ADDRESS, MOCK_TOKENS};
        use crate::data::ownership::MockOwnership;

        Self::mocks_with(MockOwnership::new().with_tokens(MOCK_ADDRESS, MOCK_TOKENS))
    }

    /// Services over in-memory storage and the given ownership table
    pub fn mocks_with(ownership: crate::data::ownership::MockOwnership) -> Self {
        Self::assemble(
            &Config::default(),
            TierTable::default(),
            crate::data::storage::test_storage(),
            Arc::new(ownership),
        )
    }
}
