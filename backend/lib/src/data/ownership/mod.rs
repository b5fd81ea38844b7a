//! Ownership source: answers which tokens an address currently holds
//!
//! The indexer that tracks the collection is an external system; lookups may
//! fail transiently and callers must not mistake a failure for an empty set.

use alloy_core::primitives::Address;
use async_trait::async_trait;

use crate::error::Error;
use crate::models::TokenId;

#[cfg(any(test, feature = "mocks"))]
pub mod mock;
pub mod postgres;

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockOwnership;
pub use postgres::PostgresOwnership;

#[derive(Debug, thiserror::Error)]
pub enum OwnershipError {
    /// No connection could be obtained in time
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<OwnershipError> for Error {
    fn from(e: OwnershipError) -> Self {
        Error::OwnershipLookupUnavailable(e.to_string())
    }
}

#[async_trait]
pub trait OwnershipSource: Send + Sync {
    /// Token ids held by `address`, in ascending numeric order
    async fn owned_tokens(&self, address: &Address) -> Result<Vec<TokenId>, OwnershipError>;

    async fn test_connection(&self) -> Result<(), OwnershipError>;
}
