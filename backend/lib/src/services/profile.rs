use std::sync::Arc;

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::data::ownership::OwnershipSource;
use crate::data::storage::BoxedStorage;
use crate::error::{Error, Result};
use crate::models::{Profile, TierTable, TokenId};

/// Derives profiles from live ownership and keeps the latest one per address
pub struct ProfileResolver {
    storage: Arc<dyn BoxedStorage>,
    ownership: Arc<dyn OwnershipSource>,
    tiers: TierTable,
}

impl ProfileResolver {
    pub fn new(
        storage: Arc<dyn BoxedStorage>,
        ownership: Arc<dyn OwnershipSource>,
        tiers: TierTable,
    ) -> Self {
        Self {
            storage,
            ownership,
            tiers,
        }
    }

    async fn stored(&self, address: &Address) -> Result<Option<Profile>> {
        self.storage
            .get_profile(address)
            .await
            .map_err(Error::Storage)
    }

    async fn last_login(&self, address: &Address) -> Result<Option<DateTime<Utc>>> {
        self.storage
            .verified_at(address)
            .await
            .map_err(Error::Storage)
    }

    async fn owned_tokens(&self, address: &Address) -> Result<Vec<TokenId>> {
        self.ownership.owned_tokens(address).await.map_err(|e| {
            warn!(%address, error = %e, "Ownership lookup failed");
            Error::from(e)
        })
    }

    async fn store(&self, profile: Profile) -> Result<Profile> {
        self.storage
            .put_profile(profile.clone())
            .await
            .map_err(Error::Storage)?;
        Ok(profile)
    }

    /// Build and store the profile of `address` from its current holdings
    pub async fn resolve(&self, address: &Address) -> Result<Profile> {
        let previous_primary = self
            .stored(address)
            .await?
            .and_then(|profile| profile.primary_nft_id());
        let owned = self.owned_tokens(address).await?;

        let profile = Profile::resolve(*address, owned, &self.tiers, previous_primary)
            .with_last_login(self.last_login(address).await?);
        debug!(
            %address,
            nft_count = profile.nft_count(),
            tier = ?profile.holder_tier(),
            "Resolved profile"
        );

        self.store(profile).await
    }

    /// Make `token` the primary token of `address`, checked against live ownership
    pub async fn set_primary(&self, address: &Address, token: TokenId) -> Result<Profile> {
        if self.stored(address).await?.is_none() {
            return Err(Error::NotFound(format!("No profile for {address}")));
        }

        let owned = self.owned_tokens(address).await?;
        if !owned.contains(&token) {
            return Err(Error::NotOwned(token));
        }

        let profile = Profile::resolve(*address, owned, &self.tiers, Some(token))
            .with_last_login(self.last_login(address).await?);
        self.store(profile).await
    }

    pub async fn get(&self, address: &Address) -> Result<Profile> {
        self.stored(address)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No profile for {address}")))
    }
}
