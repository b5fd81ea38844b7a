//! Type-erased storage implementation

use std::error::Error as StdError;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Storage;
use crate::models::{NonceRecord, Profile};

/// A boxed storage error that can wrap any storage implementation's error type
pub type BoxedStorageError = Box<dyn StdError + Send + Sync>;

/// Type-erased storage trait for use across service boundaries
#[async_trait]
pub trait BoxedStorage: Send + Sync {
    async fn health_check(&self) -> Result<bool, BoxedStorageError>;

    async fn put_nonce(&self, record: NonceRecord) -> Result<(), BoxedStorageError>;

    async fn consume_nonce(
        &self,
        address: &Address,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, BoxedStorageError>;

    async fn purge_expired_nonces(&self, now: DateTime<Utc>) -> Result<usize, BoxedStorageError>;

    async fn record_verification(
        &self,
        address: &Address,
        at: DateTime<Utc>,
    ) -> Result<(), BoxedStorageError>;

    async fn verified_at(
        &self,
        address: &Address,
    ) -> Result<Option<DateTime<Utc>>, BoxedStorageError>;

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, BoxedStorageError>;

    async fn put_profile(&self, profile: Profile) -> Result<(), BoxedStorageError>;
}

/// Wrapper struct that implements BoxedStorage for any Storage implementation
pub struct BoxedStorageWrapper<S: Storage> {
    inner: S,
}

impl<S: Storage> BoxedStorageWrapper<S> {
    pub fn new(storage: S) -> Self {
        Self { inner: storage }
    }

    fn wrap_err<E: StdError + Send + Sync + 'static>(err: E) -> BoxedStorageError {
        Box::new(err) as BoxedStorageError
    }
}

#[async_trait]
impl<S> BoxedStorage for BoxedStorageWrapper<S>
where
    S: Storage + Send + Sync,
    S::Error: StdError + Send + Sync + 'static,
{
    async fn health_check(&self) -> Result<bool, BoxedStorageError> {
        self.inner.health_check().await.map_err(Self::wrap_err)
    }

    async fn put_nonce(&self, record: NonceRecord) -> Result<(), BoxedStorageError> {
        self.inner.put_nonce(record).await.map_err(Self::wrap_err)
    }

    async fn consume_nonce(
        &self,
        address: &Address,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, BoxedStorageError> {
        self.inner
            .consume_nonce(address, value, now)
            .await
            .map_err(Self::wrap_err)
    }

    async fn purge_expired_nonces(&self, now: DateTime<Utc>) -> Result<usize, BoxedStorageError> {
        self.inner
            .purge_expired_nonces(now)
            .await
            .map_err(Self::wrap_err)
    }

    async fn record_verification(
        &self,
        address: &Address,
        at: DateTime<Utc>,
    ) -> Result<(), BoxedStorageError> {
        self.inner
            .record_verification(address, at)
            .await
            .map_err(Self::wrap_err)
    }

    async fn verified_at(
        &self,
        address: &Address,
    ) -> Result<Option<DateTime<Utc>>, BoxedStorageError> {
        self.inner.verified_at(address).await.map_err(Self::wrap_err)
    }

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, BoxedStorageError> {
        self.inner.get_profile(address).await.map_err(Self::wrap_err)
    }

    async fn put_profile(&self, profile: Profile) -> Result<(), BoxedStorageError> {
        self.inner.put_profile(profile).await.map_err(Self::wrap_err)
    }
}
