//! Backend contract used by the login coordinator
//!
//! [`HttpAuthApi`] speaks to a running backend, while [`Services`] implements
//! the same contract in-process.

use std::time::Duration;

use alloy_core::primitives::Address;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use crate::constants::api::{AUTH_NONCE_ENDPOINT, AUTH_VERIFY_ENDPOINT, USER_PRIMARY_NFT_ENDPOINT};
use crate::error::{Error, ErrorKind, Result};
use crate::models::{NonceResponse, Profile, ProfileResponse, SetPrimaryRequest, TokenId, VerifyRequest};
use crate::services::Services;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn nonce(&self, address: &Address) -> Result<NonceResponse>;

    async fn verify_signature(&self, request: &VerifyRequest) -> Result<Profile>;

    async fn refresh_profile(&self, address: &Address) -> Result<Profile>;

    async fn set_primary(&self, address: &Address, token: TokenId) -> Result<Profile>;
}

#[async_trait]
impl AuthApi for Services {
    async fn nonce(&self, address: &Address) -> Result<NonceResponse> {
        self.auth.challenge(address).await
    }

    async fn verify_signature(&self, request: &VerifyRequest) -> Result<Profile> {
        self.auth
            .login(&request.address, &request.message, &request.signature)
            .await
    }

    async fn refresh_profile(&self, address: &Address) -> Result<Profile> {
        self.auth.refresh_profile(address).await
    }

    async fn set_primary(&self, address: &Address, token: TokenId) -> Result<Profile> {
        self.auth.set_primary(address, token).await
    }
}

/// Error body of every failed API call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
    nft_id: Option<TokenId>,
}

/// [`AuthApi`] over HTTP
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn map_request_error(e: reqwest::Error) -> Error {
        Error::Transport(e.to_string())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(Self::map_request_error);
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => {
                debug!(%status, kind = ?body.kind, "Backend rejected request");
                Err(Error::from_kind(body.kind, body.error, body.nft_id))
            }
            Err(_) => Err(Error::Transport(format!("Unexpected response status {status}"))),
        }
    }

    async fn decode_profile(response: Response) -> Result<Profile> {
        Profile::try_from(Self::decode::<ProfileResponse>(response).await?)
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn nonce(&self, address: &Address) -> Result<NonceResponse> {
        let response = self
            .client
            .get(self.url(AUTH_NONCE_ENDPOINT))
            .query(&[("address", address.to_checksum(None))])
            .send()
            .await
            .map_err(Self::map_request_error)?;

        Self::decode(response).await
    }

    async fn verify_signature(&self, request: &VerifyRequest) -> Result<Profile> {
        let response = self
            .client
            .post(self.url(AUTH_VERIFY_ENDPOINT))
            .json(request)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        Self::decode_profile(response).await
    }

    async fn refresh_profile(&self, address: &Address) -> Result<Profile> {
        let response = self
            .client
            .post(self.url(&format!("/api/user/refresh-nfts/{address}")))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        Self::decode_profile(response).await
    }

    async fn set_primary(&self, address: &Address, token: TokenId) -> Result<Profile> {
        let response = self
            .client
            .put(self.url(USER_PRIMARY_NFT_ENDPOINT))
            .json(&SetPrimaryRequest {
                address: *address,
                nft_id: token,
            })
            .send()
            .await
            .map_err(Self::map_request_error)?;

        Self::decode_profile(response).await
    }
}
