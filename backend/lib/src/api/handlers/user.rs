use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use super::profile_response;
use crate::{
    api::validation::parse_address,
    error::Error,
    models::auth::SetPrimaryRequest,
    services::Services,
};

pub async fn set_primary(
    State(services): State<Services>,
    Json(payload): Json<SetPrimaryRequest>,
) -> Result<impl IntoResponse, Error> {
    debug!(address = %payload.address, nft_id = payload.nft_id, "PUT user primary-nft");
    let profile = services
        .auth
        .set_primary(&payload.address, payload.nft_id)
        .await?;
    Ok(profile_response(&services, &profile))
}

pub async fn profile(
    State(services): State<Services>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!(%address, "GET user profile");
    let address = parse_address(&address)?;
    let profile = services.auth.profile(&address).await?;
    Ok(profile_response(&services, &profile))
}

pub async fn refresh(
    State(services): State<Services>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!(%address, "POST user refresh-nfts");
    let address = parse_address(&address)?;
    let profile = services.auth.refresh_profile(&address).await?;
    Ok(profile_response(&services, &profile))
}
