use std::collections::HashSet;

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{auth::ProfileResponse, tier::TierTable};

/// Identifier of a token in the collection
pub type TokenId = u64;

/// Discrete classification of a holder derived from how many tokens they own
///
/// Variants are declared in ascending order so that the derived `Ord` matches
/// the ranking of the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolderTier {
    None,
    Bronze,
    Silver,
    Gold,
    Diamond,
    Whale,
}

/// Display profile of a wallet that completed the signature login
///
/// Fields are private so the invariants hold for every value in circulation:
/// * the holder tier is always derived from the token count
/// * the primary token, when set, is one of the owned tokens
/// * token ids are unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    address: Address,
    verified: bool,
    nft_token_ids: Vec<TokenId>,
    holder_tier: HolderTier,
    primary_nft_id: Option<TokenId>,
    last_login: Option<DateTime<Utc>>,
}

impl Profile {
    /// Build the profile of a verified address from its current ownership set
    ///
    /// `preferred_primary` is kept only if it is still owned, otherwise the
    /// first token in ownership order becomes the primary one.
    pub fn resolve(
        address: Address,
        owned: Vec<TokenId>,
        tiers: &TierTable,
        preferred_primary: Option<TokenId>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(owned.len());
        let nft_token_ids: Vec<TokenId> = owned.into_iter().filter(|id| seen.insert(*id)).collect();

        let holder_tier = tiers.tier_for(count_of(&nft_token_ids));
        let primary_nft_id = preferred_primary
            .filter(|id| nft_token_ids.contains(id))
            .or_else(|| nft_token_ids.first().copied());

        Self {
            address,
            verified: true,
            nft_token_ids,
            holder_tier,
            primary_nft_id,
            last_login: None,
        }
    }

    /// Attach the time of the latest accepted signature
    pub fn with_last_login(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_login = at;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn nft_count(&self) -> u32 {
        count_of(&self.nft_token_ids)
    }

    pub fn nft_token_ids(&self) -> &[TokenId] {
        &self.nft_token_ids
    }

    pub fn holder_tier(&self) -> HolderTier {
        self.holder_tier
    }

    pub fn primary_nft_id(&self) -> Option<TokenId> {
        self.primary_nft_id
    }

    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }

    pub fn has_nft(&self) -> bool {
        !self.nft_token_ids.is_empty()
    }

    pub fn owns(&self, token: TokenId) -> bool {
        self.nft_token_ids.contains(&token)
    }
}

fn count_of(ids: &[TokenId]) -> u32 {
    u32::try_from(ids.len()).unwrap_or(u32::MAX)
}

/// Accepts a profile received from the backend
///
/// The tier is taken as reported since the backend owns the tier table, the
/// structural invariants are checked again.
impl TryFrom<ProfileResponse> for Profile {
    type Error = Error;

    fn try_from(response: ProfileResponse) -> Result<Self, Self::Error> {
        if !response.success {
            return Err(Error::BadRequest("Profile response reports failure".to_string()));
        }

        if count_of(&response.nft_token_ids) != response.nft_count {
            return Err(Error::BadRequest(format!(
                "Profile reports {} tokens but lists {}",
                response.nft_count,
                response.nft_token_ids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(response.nft_token_ids.len());
        if !response.nft_token_ids.iter().all(|id| seen.insert(*id)) {
            return Err(Error::BadRequest("Profile lists duplicate tokens".to_string()));
        }

        if let Some(primary) = response.primary_nft_id {
            if !response.nft_token_ids.contains(&primary) {
                return Err(Error::BadRequest(format!(
                    "Primary token {primary} is not in the owned set"
                )));
            }
        }

        Ok(Self {
            address: response.address,
            verified: response.verified,
            nft_token_ids: response.nft_token_ids,
            holder_tier: response.holder_tier,
            primary_nft_id: response.primary_nft_id,
            last_login: response.last_login,
        })
    }
}
