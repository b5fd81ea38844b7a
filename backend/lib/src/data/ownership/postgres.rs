//! Ownership lookups against the indexer database
//!
//! The indexer keeps one row per held token in `nft_owners(owner_id, nft_id)`,
//! with the owner stored in whatever letter case the chain event carried and
//! the token id stored as text.

use std::fmt::Debug;
use std::time::Duration;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use diesel::sql_types::Text;
use diesel::QueryableByName;
use diesel_async::pooled_connection::{bb8, AsyncDieselConnectionManager};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::{debug, warn};

use super::{OwnershipError, OwnershipSource};
use crate::config::OwnershipConfig;
use crate::models::TokenId;

const OWNED_TOKENS_QUERY: &str =
    "SELECT nft_id FROM nft_owners WHERE LOWER(owner_id) = LOWER($1)";

#[derive(QueryableByName)]
struct OwnedTokenRow {
    #[diesel(sql_type = Text)]
    nft_id: String,
}

/// [`OwnershipSource`] backed by a bb8 pool of async diesel connections
pub struct PostgresOwnership {
    pool: bb8::Pool<AsyncPgConnection>,
    max_connections: Option<u32>,
}

impl PostgresOwnership {
    /// Create the pool without connecting
    ///
    /// Connections are established on first use so the service can start while
    /// the indexer is still down. Fails if the pool size is zero.
    pub fn new(config: &OwnershipConfig) -> Result<Self, OwnershipError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let mut builder = bb8::Pool::builder();
        if let Some(max_connections) = config.max_connections {
            if max_connections == 0 {
                return Err(OwnershipError::Config(
                    "max_connections must be greater than zero".to_string(),
                ));
            }
            builder = builder.max_size(max_connections);
        }
        if let Some(timeout) = config.connection_timeout_secs {
            builder = builder.connection_timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            pool: builder.build_unchecked(manager),
            max_connections: config.max_connections,
        })
    }

    async fn connection(
        &self,
    ) -> Result<bb8::PooledConnection<'_, AsyncPgConnection>, OwnershipError> {
        self.pool
            .get()
            .await
            .map_err(|e| OwnershipError::Pool(e.to_string()))
    }
}

impl Debug for PostgresOwnership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PostgresOwnership")
            .field("max_connections", &self.max_connections)
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

/// Turn indexer rows into ascending token ids, skipping ids that are not numeric
fn parse_token_ids(address: &Address, rows: Vec<OwnedTokenRow>) -> Vec<TokenId> {
    let mut ids: Vec<TokenId> = rows
        .into_iter()
        .filter_map(|row| match row.nft_id.trim().parse::<TokenId>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(%address, nft_id = %row.nft_id, "Skipping non-numeric token id");
                None
            }
        })
        .collect();

    ids.sort_unstable();
    ids.dedup();
    ids
}

#[async_trait]
impl OwnershipSource for PostgresOwnership {
    async fn owned_tokens(&self, address: &Address) -> Result<Vec<TokenId>, OwnershipError> {
        let mut conn = self.connection().await?;

        let rows = diesel::sql_query(OWNED_TOKENS_QUERY)
            .bind::<Text, _>(address.to_string())
            .load::<OwnedTokenRow>(&mut *conn)
            .await
            .map_err(|e| OwnershipError::Database(e.to_string()))?;

        debug!(%address, rows = rows.len(), "Loaded ownership rows");
        Ok(parse_token_ids(address, rows))
    }

    async fn test_connection(&self) -> Result<(), OwnershipError> {
        let mut conn = self.connection().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut *conn)
            .await
            .map_err(|e| OwnershipError::Database(format!("Connection test failed: {e}")))?;

        Ok(())
    }
}
