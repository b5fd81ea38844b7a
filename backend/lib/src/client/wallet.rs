use alloy_core::primitives::{eip191_hash_message, Address};
use alloy_signer::k256::ecdsa::SigningKey;
use alloy_signer::utils::public_key_to_address;
use async_trait::async_trait;

use crate::constants::auth::SIGNATURE_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user declined the signature request
    #[error("Signature request rejected")]
    Rejected,

    #[error("Wallet error: {0}")]
    Signer(String),
}

/// Something able to `personal_sign` a message for one address
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Hex encoded `r || s || v` EIP-191 signature of `message`
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;
}

/// Wallet holding its secp256k1 key in memory
pub struct LocalWallet {
    key: SigningKey,
    address: Address,
}

impl LocalWallet {
    pub fn new(key: SigningKey) -> Self {
        let address = public_key_to_address(key.verifying_key());
        Self { key, address }
    }

    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()))
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let prehash = eip191_hash_message(message.as_bytes());
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| WalletError::Signer(e.to_string()))?;

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        // wallets report the legacy 27/28 recovery byte
        bytes[64] = recovery_id.to_byte() + 27;

        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::signature;

    #[tokio::test]
    async fn signatures_verify_for_wallet_address() {
        let wallet = LocalWallet::random();
        let message = "Login to ComputerChan";

        let signature = wallet.sign_message(message).await.unwrap();

        assert_eq!(signature.len(), 2 + SIGNATURE_LENGTH * 2);
        assert!(signature.ends_with("1b") || signature.ends_with("1c"));
        signature::verify(&wallet.address(), message, &signature).unwrap();
    }
}
