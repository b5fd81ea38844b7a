//! In-memory storage implementation
//!
//! All data is lost when the process terminates, which matches the lifetime of
//! a login session.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use alloy_core::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::Storage;
use crate::models::{NonceRecord, Profile};

/// Errors that can occur during in-memory storage operations
#[derive(Debug, Error)]
pub enum InMemoryStorageError {
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

fn poisoned<E: std::fmt::Display>(e: E) -> InMemoryStorageError {
    InMemoryStorageError::LockPoisoned(e.to_string())
}

#[derive(Default)]
struct State {
    nonces: HashMap<Address, NonceRecord>,
    verifications: HashMap<Address, DateTime<Utc>>,
    profiles: HashMap<Address, Profile>,
}

/// Thread-safe in-memory storage
///
/// Every operation takes a single lock, so nonce consumption is one
/// check-and-mark step.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    type Error = InMemoryStorageError;

    async fn health_check(&self) -> Result<bool, Self::Error> {
        self.state.read().map_err(poisoned)?;
        Ok(true)
    }

    async fn put_nonce(&self, record: NonceRecord) -> Result<(), Self::Error> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.nonces.insert(record.address, record);
        Ok(())
    }

    async fn consume_nonce(
        &self,
        address: &Address,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, Self::Error> {
        let mut state = self.state.write().map_err(poisoned)?;

        match state.nonces.get_mut(address) {
            Some(record) if record.is_consumable(value, now) => {
                record.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired_nonces(&self, now: DateTime<Utc>) -> Result<usize, Self::Error> {
        let mut state = self.state.write().map_err(poisoned)?;

        let before = state.nonces.len();
        state
            .nonces
            .retain(|_, record| record.consumed || !record.is_expired(now));
        Ok(before - state.nonces.len())
    }

    async fn record_verification(
        &self,
        address: &Address,
        at: DateTime<Utc>,
    ) -> Result<(), Self::Error> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.verifications.insert(*address, at);
        Ok(())
    }

    async fn verified_at(&self, address: &Address) -> Result<Option<DateTime<Utc>>, Self::Error> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.verifications.get(address).copied())
    }

    async fn get_profile(&self, address: &Address) -> Result<Option<Profile>, Self::Error> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.profiles.get(address).cloned())
    }

    async fn put_profile(&self, profile: Profile) -> Result<(), Self::Error> {
        let mut state = self.state.write().map_err(poisoned)?;
        state.profiles.insert(profile.address(), profile);
        Ok(())
    }
}
