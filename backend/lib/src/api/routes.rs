//! Route definitions for the ComputerChan API

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::constants::api::*;
use crate::services::Services;

/// Creates the router with all API routes
pub fn routes(services: Services) -> Router {
    Router::new()
        // Probes
        .route(HEALTH_ENDPOINT, get(handlers::health_check))
        .route(AUTH_PING_ENDPOINT, get(handlers::ping))
        // Wallet login
        .route(AUTH_NONCE_ENDPOINT, get(handlers::auth::nonce))
        .route(AUTH_VERIFY_ENDPOINT, post(handlers::auth::verify))
        .route(AUTH_PROFILE_ENDPOINT, get(handlers::auth::profile))
        // Profile
        .route(USER_PROFILE_ENDPOINT, get(handlers::user::profile))
        .route(USER_PRIMARY_NFT_ENDPOINT, put(handlers::user::set_primary))
        .route(USER_REFRESH_NFTS_ENDPOINT, post(handlers::user::refresh))
        // Assets
        .route(NFT_METADATA_ENDPOINT, get(handlers::nft_metadata))
        .with_state(services)
}
