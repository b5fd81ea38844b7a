use std::fmt;

use alloy_core::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::auth::{
    LOGIN_MESSAGE_ADDRESS_PREFIX, LOGIN_MESSAGE_NONCE_PREFIX, LOGIN_MESSAGE_TITLE,
};
use crate::models::profile::{HolderTier, Profile, TokenId};

/// Query of the nonce endpoint, validated by the handler
#[derive(Debug, Serialize, Deserialize)]
pub struct NonceQuery {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
    /// The exact message the wallet is expected to sign
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub address: Address,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPrimaryRequest {
    pub address: Address,
    pub nft_id: TokenId,
}

/// Wire representation of a [`Profile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(serialize_with = "crate::utils::serde::checksummed_address")]
    pub address: Address,
    pub verified: bool,
    pub has_nft: bool,
    pub nft_count: u32,
    pub nft_token_ids: Vec<TokenId>,
    pub holder_tier: HolderTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_nft_id: Option<TokenId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nft_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

impl ProfileResponse {
    pub fn new(profile: &Profile, nft_image_url: Option<String>) -> Self {
        Self {
            success: true,
            address: profile.address(),
            verified: profile.verified(),
            has_nft: profile.has_nft(),
            nft_count: profile.nft_count(),
            nft_token_ids: profile.nft_token_ids().to_vec(),
            holder_tier: profile.holder_tier(),
            primary_nft_id: profile.primary_nft_id(),
            nft_image_url,
            last_login: profile.last_login(),
        }
    }
}

/// One-time challenge issued to an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    pub address: Address,
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl NonceRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether `value` may be exchanged for a login at `now`
    pub fn is_consumable(&self, value: &str, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired(now) && self.value == value
    }
}

/// The message a wallet signs to prove control over an address
///
/// Renders as three `\n`-separated lines:
///
/// ```text
/// Login to ComputerChan
/// Address: <EIP-55 checksummed address>
/// Nonce: <nonce>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMessage {
    pub address: Address,
    pub nonce: String,
}

impl LoginMessage {
    pub fn new(address: Address, nonce: impl Into<String>) -> Self {
        Self {
            address,
            nonce: nonce.into(),
        }
    }

    /// Parses a message produced by [`LoginMessage`]'s `Display`
    ///
    /// The address line is accepted in any letter case. Anything beyond the three
    /// template lines makes the message invalid.
    pub fn parse(message: &str) -> Option<Self> {
        let mut lines = message.split('\n');

        if lines.next()? != LOGIN_MESSAGE_TITLE {
            return None;
        }

        let address = lines.next()?.strip_prefix(LOGIN_MESSAGE_ADDRESS_PREFIX)?;
        if !address.starts_with("0x") {
            return None;
        }
        let address = address.parse::<Address>().ok()?;

        let nonce = lines.next()?.strip_prefix(LOGIN_MESSAGE_NONCE_PREFIX)?;
        if nonce.is_empty() || !nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        if lines.next().is_some() {
            return None;
        }

        Some(Self::new(address, nonce))
    }
}

impl fmt::Display for LoginMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{LOGIN_MESSAGE_TITLE}\n{LOGIN_MESSAGE_ADDRESS_PREFIX}{}\n{LOGIN_MESSAGE_NONCE_PREFIX}{}",
            self.address.to_checksum(None),
            self.nonce
        )
    }
}
