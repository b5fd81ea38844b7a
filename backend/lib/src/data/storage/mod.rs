//! Backend-owned state: nonces, verification records and resolved profiles
//!
//! Ownership facts are not stored here, they always come from the ownership source.

use std::error::Error;
#[cfg(any(test, feature = "mocks"))]
use std::sync::Arc;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{NonceRecord, Profile};

pub mod boxed;
pub mod memory;

pub use boxed::{BoxedStorage, BoxedStorageError, BoxedStorageWrapper};
pub use memory::InMemoryStorage;

#[cfg(any(test, feature = "mocks"))]
pub fn test_storage() -> Arc<dyn BoxedStorage> {
    Arc::new(BoxedStorageWrapper::new(InMemoryStorage::new()))
}

/// Storage backend for state the service owns
///
/// Implementations must make [`Storage::consume_nonce`] atomic: two concurrent
/// consumptions of the same nonce may not both succeed.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Error type for storage operations
    type Error: Error + Send + Sync + 'static;

    async fn health_check(&self) -> Result<bool, Self::Error>;

    /// Store `record` as the only nonce of its address, dropping any previous one
    async fn put_nonce(&self, record: NonceRecord) -> Result<(), Self::Error>;

    /// Mark the nonce `value` of `address` as consumed
    ///
    /// Returns `false` without changing anything if there is no such nonce, or
    /// if it is already consumed or expired at `now`.
    async fn consume_nonce(
        &self,
        address: &Address,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Self::Error>;

    /// Remove unconsumed nonces expired at `now`, returning how many were removed
    async fn purge_expired_nonces(&self, now: DateTime<Utc>) -> Result<usize, Self::Error>;

    async fn record_verification(
        &self,
        address: &Address,
        at: DateTime<Utc>,
    ) -> Result<(), Self::Error>;

    /// Last successful signature verification of `address`
    async fn verified_at(&self, address: &Address) -> Result<Option<DateTime<Utc>>, Self::Error>;

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, Self::Error>;

    async fn put_profile(&self, profile: Profile) -> Result<(), Self::Error>;
}
