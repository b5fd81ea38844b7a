use std::sync::Arc;

use alloy_core::primitives::Address;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::data::storage::BoxedStorage;
use crate::error::{Error, Result};
use crate::models::{LoginMessage, NonceResponse, Profile, TokenId};
use crate::services::{nonce::NonceStore, profile::ProfileResolver, signature};

/// Server side of the wallet login
#[derive(Clone)]
pub struct AuthService {
    nonces: Arc<NonceStore>,
    profiles: Arc<ProfileResolver>,
    storage: Arc<dyn BoxedStorage>,
}

impl AuthService {
    pub fn new(
        nonces: Arc<NonceStore>,
        profiles: Arc<ProfileResolver>,
        storage: Arc<dyn BoxedStorage>,
    ) -> Self {
        Self {
            nonces,
            profiles,
            storage,
        }
    }

    /// Issue a nonce and the exact message `address` has to sign
    pub async fn challenge(&self, address: &Address) -> Result<NonceResponse> {
        let record = self.nonces.issue(address).await?;
        let message = LoginMessage::new(*address, record.value.clone());

        Ok(NonceResponse {
            nonce: record.value,
            message: message.to_string(),
        })
    }

    /// Complete a login from a signed challenge
    ///
    /// The nonce is consumed before the signature is checked, so a replayed or
    /// forged message burns the nonce either way. Verification is recorded
    /// before the ownership lookup: if that lookup fails the profile can be
    /// fetched later through [`AuthService::refresh_profile`].
    pub async fn login(&self, address: &Address, message: &str, signature: &str) -> Result<Profile> {
        let Some(parsed) = LoginMessage::parse(message) else {
            warn!(%address, "Rejected login with malformed message");
            return Err(Error::InvalidOrExpiredNonce);
        };

        self.nonces.consume(address, &parsed.nonce).await.map_err(|e| {
            warn!(%address, "Rejected login with unknown or expired nonce");
            e
        })?;

        if parsed.address != *address {
            warn!(%address, signed_for = %parsed.address, "Login message names another address");
            return Err(Error::InvalidSignature);
        }

        signature::verify(address, message, signature).map_err(|e| {
            warn!(%address, "Rejected login with invalid signature");
            e
        })?;

        self.storage
            .record_verification(address, Utc::now())
            .await
            .map_err(Error::Storage)?;
        info!(%address, "Wallet signature verified");

        self.profiles.resolve(address).await
    }

    pub async fn profile(&self, address: &Address) -> Result<Profile> {
        self.profiles.get(address).await
    }

    /// Re-read the holdings of an address that already proved control of its key
    pub async fn refresh_profile(&self, address: &Address) -> Result<Profile> {
        let verified_at = self
            .storage
            .verified_at(address)
            .await
            .map_err(Error::Storage)?
            .ok_or_else(|| Error::Unauthorized(format!("{address} has not signed in")))?;

        debug!(%address, %verified_at, "Refreshing profile");
        self.profiles.resolve(address).await
    }

    pub async fn set_primary(&self, address: &Address, token: TokenId) -> Result<Profile> {
        self.profiles.set_primary(address, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test::tokens::BRONZE_HOLDER;
    use crate::data::ownership::MockOwnership;
    use crate::data::storage::test_storage;
    use crate::models::{HolderTier, TierTable};
    use crate::test_utils::auth::{eth_wallet, sign_message};

    fn service(ownership: &MockOwnership) -> AuthService {
        let storage = test_storage();
        let nonces = Arc::new(NonceStore::new(storage.clone(), 300));
        let profiles = Arc::new(ProfileResolver::new(
            storage.clone(),
            Arc::new(ownership.clone()),
            TierTable::default(),
        ));
        AuthService::new(nonces, profiles, storage)
    }

    #[tokio::test]
    async fn login_resolves_bronze_holder() {
        let (address, key) = eth_wallet();
        let auth = service(&MockOwnership::new().with_tokens(address, BRONZE_HOLDER));

        let challenge = auth.challenge(&address).await.unwrap();
        assert!(challenge.message.ends_with(&challenge.nonce));
        let signature = sign_message(&key, &challenge.message);

        let profile = auth.login(&address, &challenge.message, &signature).await.unwrap();

        assert!(profile.verified());
        assert_eq!(profile.nft_count(), 3);
        assert_eq!(profile.holder_tier(), HolderTier::Bronze);
        assert_eq!(profile.primary_nft_id(), Some(12));
        assert_eq!(auth.profile(&address).await.unwrap(), profile);
    }

    #[tokio::test]
    async fn replayed_login_is_rejected() {
        let (address, key) = eth_wallet();
        let auth = service(&MockOwnership::new().with_tokens(address, BRONZE_HOLDER));

        let challenge = auth.challenge(&address).await.unwrap();
        let signature = sign_message(&key, &challenge.message);
        auth.login(&address, &challenge.message, &signature).await.unwrap();

        assert!(matches!(
            auth.login(&address, &challenge.message, &signature).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
    }

    #[tokio::test]
    async fn superseded_nonce_is_rejected() {
        let (address, key) = eth_wallet();
        let auth = service(&MockOwnership::new());

        let stale = auth.challenge(&address).await.unwrap();
        auth.challenge(&address).await.unwrap();
        let signature = sign_message(&key, &stale.message);

        assert!(matches!(
            auth.login(&address, &stale.message, &signature).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
    }

    #[tokio::test]
    async fn signature_from_another_key_is_rejected() {
        let (address, _) = eth_wallet();
        let (_, other_key) = eth_wallet();
        let auth = service(&MockOwnership::new());

        let challenge = auth.challenge(&address).await.unwrap();
        let signature = sign_message(&other_key, &challenge.message);

        assert!(matches!(
            auth.login(&address, &challenge.message, &signature).await,
            Err(Error::InvalidSignature)
        ));
        assert!(matches!(auth.refresh_profile(&address).await, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn message_for_another_address_is_rejected() {
        let (address, key) = eth_wallet();
        let (other, _) = eth_wallet();
        let auth = service(&MockOwnership::new());

        let challenge = auth.challenge(&address).await.unwrap();
        let signature = sign_message(&key, &challenge.message);

        assert!(matches!(
            auth.login(&other, &challenge.message, &signature).await,
            Err(Error::InvalidOrExpiredNonce)
        ));

        let forged = challenge.message.replace(
            &address.to_checksum(None),
            &other.to_checksum(None),
        );
        let own = auth.challenge(&address).await.unwrap();
        let forged = forged.replace(&challenge.nonce, &own.nonce);
        let signature = sign_message(&key, &forged);

        assert!(matches!(
            auth.login(&address, &forged, &signature).await,
            Err(Error::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn malformed_message_is_rejected() {
        let (address, key) = eth_wallet();
        let auth = service(&MockOwnership::new());

        let challenge = auth.challenge(&address).await.unwrap();
        let message = format!("{}\nIssued At: now", challenge.message);
        let signature = sign_message(&key, &message);

        assert!(matches!(
            auth.login(&address, &message, &signature).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
    }

    #[tokio::test]
    async fn zero_holdings_is_a_valid_profile() {
        let (address, key) = eth_wallet();
        let auth = service(&MockOwnership::new());

        let challenge = auth.challenge(&address).await.unwrap();
        let signature = sign_message(&key, &challenge.message);
        let profile = auth.login(&address, &challenge.message, &signature).await.unwrap();

        assert_eq!(profile.nft_count(), 0);
        assert_eq!(profile.holder_tier(), HolderTier::None);
        assert_eq!(profile.primary_nft_id(), None);
    }

    #[tokio::test]
    async fn failed_lookup_is_retried_without_signing_again() {
        let (address, key) = eth_wallet();
        let ownership = MockOwnership::new().with_tokens(address, BRONZE_HOLDER);
        ownership.fail_next(1);
        let auth = service(&ownership);

        let challenge = auth.challenge(&address).await.unwrap();
        let signature = sign_message(&key, &challenge.message);

        assert!(matches!(
            auth.login(&address, &challenge.message, &signature).await,
            Err(Error::OwnershipLookupUnavailable(_))
        ));

        let profile = auth.refresh_profile(&address).await.unwrap();
        assert_eq!(profile.holder_tier(), HolderTier::Bronze);
    }
}
