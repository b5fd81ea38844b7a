//! One-time login challenges

use std::sync::Arc;
use std::time::Duration;

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::constants::auth::NONCE_BYTES;
use crate::data::storage::BoxedStorage;
use crate::error::{Error, Result};
use crate::models::NonceRecord;

pub struct NonceStore {
    storage: Arc<dyn BoxedStorage>,
    expiration: chrono::Duration,
}

impl NonceStore {
    pub fn new(storage: Arc<dyn BoxedStorage>, expiration_seconds: u64) -> Self {
        let expiration = i64::try_from(expiration_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);

        Self {
            storage,
            expiration,
        }
    }

    /// Issue a fresh nonce for `address`, invalidating the previous one
    pub async fn issue(&self, address: &Address) -> Result<NonceRecord> {
        let value = hex::encode(rand::random::<[u8; NONCE_BYTES]>());
        let issued_at = Utc::now();

        let record = NonceRecord {
            address: *address,
            value,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(self.expiration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            consumed: false,
        };

        self.storage
            .put_nonce(record.clone())
            .await
            .map_err(Error::Storage)?;

        debug!(%address, expires_at = %record.expires_at, "Issued nonce");
        Ok(record)
    }

    /// Exchange `value` for a single login attempt of `address`
    pub async fn consume(&self, address: &Address, value: &str) -> Result<()> {
        let consumed = self
            .storage
            .consume_nonce(address, value, Utc::now())
            .await
            .map_err(Error::Storage)?;

        if consumed {
            Ok(())
        } else {
            Err(Error::InvalidOrExpiredNonce)
        }
    }

    /// Drop unconsumed nonces past their expiry
    pub async fn purge_expired(&self) -> Result<usize> {
        self.storage
            .purge_expired_nonces(Utc::now())
            .await
            .map_err(Error::Storage)
    }

    /// Periodically purge expired nonces until `shutdown` is cancelled
    pub fn spawn_expiry_sweeper(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Nonce sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => match self.purge_expired().await {
                        Ok(0) => {}
                        Ok(purged) => debug!(purged, "Purged expired nonces"),
                        Err(e) => error!(error = %e, "Failed to purge expired nonces"),
                    },
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test::EXPIRED_NONCE_SECONDS;
    use crate::data::storage::test_storage;

    fn store(expiration_seconds: u64) -> NonceStore {
        NonceStore::new(test_storage(), expiration_seconds)
    }

    #[tokio::test]
    async fn issued_nonce_is_hex_of_expected_width() {
        let nonces = store(300);
        let record = nonces.issue(&Address::repeat_byte(1)).await.unwrap();

        assert_eq!(record.value.len(), NONCE_BYTES * 2);
        assert!(record.value.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(record.expires_at - record.issued_at, chrono::Duration::seconds(300));
    }

    #[tokio::test]
    async fn consecutive_nonces_differ() {
        let nonces = store(300);
        let address = Address::repeat_byte(1);

        let first = nonces.issue(&address).await.unwrap();
        let second = nonces.issue(&address).await.unwrap();

        assert_ne!(first.value, second.value);
    }

    #[tokio::test]
    async fn reissue_invalidates_previous_nonce() {
        let nonces = store(300);
        let address = Address::repeat_byte(1);

        let first = nonces.issue(&address).await.unwrap();
        let second = nonces.issue(&address).await.unwrap();

        assert!(matches!(
            nonces.consume(&address, &first.value).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
        nonces.consume(&address, &second.value).await.unwrap();
    }

    #[tokio::test]
    async fn nonce_is_consumable_once() {
        let nonces = store(300);
        let address = Address::repeat_byte(1);
        let record = nonces.issue(&address).await.unwrap();

        nonces.consume(&address, &record.value).await.unwrap();
        assert!(matches!(
            nonces.consume(&address, &record.value).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
    }

    #[tokio::test]
    async fn expired_nonce_is_rejected_and_purged() {
        let nonces = store(EXPIRED_NONCE_SECONDS);
        let address = Address::repeat_byte(1);
        let record = nonces.issue(&address).await.unwrap();

        assert!(matches!(
            nonces.consume(&address, &record.value).await,
            Err(Error::InvalidOrExpiredNonce)
        ));
        assert_eq!(nonces.purge_expired().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_until_cancelled() {
        let nonces = Arc::new(store(EXPIRED_NONCE_SECONDS));
        nonces.issue(&Address::repeat_byte(1)).await.unwrap();

        let shutdown = CancellationToken::new();
        let handle = nonces
            .clone()
            .spawn_expiry_sweeper(Duration::from_secs(60), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(nonces.purge_expired().await.unwrap(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
