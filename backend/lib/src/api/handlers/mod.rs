use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::{
    api::validation::parse_token_id,
    error::Error,
    models::{Profile, ProfileResponse},
    services::Services,
};

pub mod auth;
pub mod user;

/// Profile body with the image of the primary token attached
fn profile_response(services: &Services, profile: &Profile) -> Json<ProfileResponse> {
    Json(ProfileResponse::new(
        profile,
        services.assets.primary_image_url(profile),
    ))
}

// ==================== Probes ====================

pub async fn health_check(State(services): State<Services>) -> impl IntoResponse {
    let health = services.health.check_health().await;
    let status = if health.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(health))
}

pub async fn ping() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Auth service is running",
    }))
}

// ==================== Assets ====================

pub async fn nft_metadata(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!(nft_id = %id, "GET nft metadata");
    let id = parse_token_id(&id)?;
    Ok(Json(services.assets.metadata(id)))
}
