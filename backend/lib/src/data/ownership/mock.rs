//! In-memory ownership source for tests and mock mode

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::{OwnershipError, OwnershipSource};
use crate::models::TokenId;

/// Ownership table held in memory, with injectable lookup failures
#[derive(Debug, Clone, Default)]
pub struct MockOwnership {
    holdings: Arc<RwLock<HashMap<Address, Vec<TokenId>>>>,
    failures: Arc<AtomicUsize>,
}

impl MockOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(self, address: Address, tokens: &[TokenId]) -> Self {
        self.set_tokens(address, tokens);
        self
    }

    /// Replace what `address` holds
    pub fn set_tokens(&self, address: Address, tokens: &[TokenId]) {
        let mut tokens = tokens.to_vec();
        tokens.sort_unstable();
        self.holdings.write().insert(address, tokens);
    }

    /// Make the next `count` lookups fail
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl OwnershipSource for MockOwnership {
    async fn owned_tokens(&self, address: &Address) -> Result<Vec<TokenId>, OwnershipError> {
        if self.take_failure() {
            return Err(OwnershipError::Pool("Injected lookup failure".to_string()));
        }

        Ok(self.holdings.read().get(address).cloned().unwrap_or_default())
    }

    async fn test_connection(&self) -> Result<(), OwnershipError> {
        Ok(())
    }
}
