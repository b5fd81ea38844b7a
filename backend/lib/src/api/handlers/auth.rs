use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use tracing::debug;

use super::profile_response;
use crate::{
    api::validation::parse_address,
    error::Error,
    models::auth::{NonceQuery, VerifyRequest},
    services::Services,
};

pub async fn nonce(
    State(services): State<Services>,
    Query(query): Query<NonceQuery>,
) -> Result<impl IntoResponse, Error> {
    debug!(address = %query.address, "GET auth nonce");
    let address = parse_address(&query.address)?;
    let response = services.auth.challenge(&address).await?;
    Ok(Json(response))
}

pub async fn verify(
    State(services): State<Services>,
    Json(payload): Json<VerifyRequest>,
) -> Result<impl IntoResponse, Error> {
    debug!(address = %payload.address, "POST auth verify-signature");
    let profile = services
        .auth
        .login(&payload.address, &payload.message, &payload.signature)
        .await?;
    Ok(profile_response(&services, &profile))
}

pub async fn profile(
    State(services): State<Services>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!(%address, "GET auth profile");
    let address = parse_address(&address)?;
    let profile = services.auth.profile(&address).await?;
    Ok(profile_response(&services, &profile))
}

#[cfg(all(test, feature = "mocks"))]
mod tests {
    use alloy_core::primitives::Address;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::{
        api::{create_app, mock_app},
        constants::{
            api::{AUTH_NONCE_ENDPOINT, AUTH_VERIFY_ENDPOINT},
            mocks::MOCK_ADDRESS,
            test::tokens::BRONZE_HOLDER,
        },
        data::ownership::MockOwnership,
        models::auth::{NonceResponse, ProfileResponse, VerifyRequest},
        models::HolderTier,
        services::Services,
        test_utils::auth::{eth_wallet, sign_message},
    };

    async fn request_nonce(server: &TestServer, address: &Address) -> NonceResponse {
        let response = server
            .get(AUTH_NONCE_ENDPOINT)
            .add_query_param("address", address.to_checksum(None))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        response.json()
    }

    #[tokio::test]
    async fn auth_flow_complete() {
        let (address, signing_key) = eth_wallet();
        let services = Services::mocks_with(MockOwnership::new().with_tokens(address, BRONZE_HOLDER));
        let server = TestServer::new(create_app(services)).unwrap();

        // Step 1: Get nonce challenge
        let challenge = request_nonce(&server, &address).await;
        assert!(challenge.message.contains(&address.to_checksum(None)));
        assert!(challenge.message.ends_with(&format!("Nonce: {}", challenge.nonce)));

        // Step 2: Sign the message and login
        let verify_request = VerifyRequest {
            address,
            signature: sign_message(&signing_key, &challenge.message),
            message: challenge.message,
        };
        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["address"], address.to_checksum(None));
        assert_eq!(body["hasNft"], true);
        assert_eq!(body["nftCount"], 3);
        assert_eq!(body["nftTokenIds"], serde_json::json!([12, 45, 99]));
        assert_eq!(body["holderTier"], "BRONZE");
        assert_eq!(body["primaryNftId"], 12);
        assert!(body["nftImageUrl"].as_str().unwrap().ends_with("/12.png"));
        assert!(body["lastLogin"].is_string());

        // Step 3: The profile is now readable by address, in any letter case
        let response = server
            .get(&format!(
                "/api/auth/profile/{}",
                address.to_checksum(None).to_lowercase()
            ))
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let profile: ProfileResponse = response.json();
        assert_eq!(profile.address, address);
        assert_eq!(profile.holder_tier, HolderTier::Bronze);
        assert!(profile.last_login.is_some());
    }

    #[tokio::test]
    async fn nonce_validates_address() {
        let server = TestServer::new(mock_app()).unwrap();

        let response = server
            .get(AUTH_NONCE_ENDPOINT)
            .add_query_param("address", "not_an_eth_address")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "BadRequest");
    }

    #[tokio::test]
    async fn login_fails_without_nonce() {
        let server = TestServer::new(mock_app()).unwrap();
        let (address, signing_key) = eth_wallet();

        let message = format!(
            "Login to ComputerChan\nAddress: {}\nNonce: deadbeef",
            address.to_checksum(None)
        );
        let verify_request = VerifyRequest {
            address,
            signature: sign_message(&signing_key, &message),
            message,
        };

        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["kind"], "InvalidOrExpiredNonce");
    }

    #[tokio::test]
    async fn login_fails_with_wrong_signature() {
        let server = TestServer::new(mock_app()).unwrap();

        let (address, _) = eth_wallet();
        let (_, wrong_signing_key) = eth_wallet();

        let challenge = request_nonce(&server, &address).await;
        let verify_request = VerifyRequest {
            address,
            signature: sign_message(&wrong_signing_key, &challenge.message),
            message: challenge.message,
        };

        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["kind"], "InvalidSignature");
    }

    #[tokio::test]
    async fn replay_attack_prevention() {
        let server = TestServer::new(mock_app()).unwrap();
        let (address, signing_key) = eth_wallet();

        let challenge = request_nonce(&server, &address).await;
        let verify_request = VerifyRequest {
            address,
            signature: sign_message(&signing_key, &challenge.message),
            message: challenge.message,
        };

        // First login should succeed
        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        // Second login with the same nonce should fail
        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["kind"], "InvalidOrExpiredNonce");
    }

    #[tokio::test]
    async fn ownership_outage_is_service_unavailable() {
        let (address, signing_key) = eth_wallet();
        let ownership = MockOwnership::new().with_tokens(address, BRONZE_HOLDER);
        ownership.fail_next(1);
        let server = TestServer::new(create_app(Services::mocks_with(ownership))).unwrap();

        let challenge = request_nonce(&server, &address).await;
        let verify_request = VerifyRequest {
            address,
            signature: sign_message(&signing_key, &challenge.message),
            message: challenge.message,
        };

        let response = server.post(AUTH_VERIFY_ENDPOINT).json(&verify_request).await;

        assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = response.json();
        assert_eq!(body["kind"], "OwnershipLookupUnavailable");
    }

    #[tokio::test]
    async fn profile_before_login_is_not_found() {
        let server = TestServer::new(mock_app()).unwrap();

        let response = server
            .get(&format!("/api/auth/profile/{}", MOCK_ADDRESS.to_checksum(None)))
            .await;

        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }
}
