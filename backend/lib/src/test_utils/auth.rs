//! Wallet helpers for login tests

use alloy_core::primitives::{eip191_hash_message, Address};
use alloy_signer::{k256::ecdsa::SigningKey, utils::public_key_to_address};

use crate::constants::auth::SIGNATURE_LENGTH;

/// Generate a random ETH wallet
///
/// Returns the corresponding address and signing key
pub fn eth_wallet() -> (Address, SigningKey) {
    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let address = public_key_to_address(signing_key.verifying_key());

    (address, signing_key)
}

/// Sign a message using EIP-191 personal_sign format, with a `0`/`1` recovery byte
pub fn sign_message(signing_key: &SigningKey, message: &str) -> String {
    let message_hash = eip191_hash_message(message.as_bytes());
    let (sig, recovery_id) = signing_key
        .sign_prehash_recoverable(&message_hash.0)
        .expect("prehash signing with a valid key");

    let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
    sig_bytes[..64].copy_from_slice(&sig.to_bytes());
    sig_bytes[64] = recovery_id.to_byte();

    format!("0x{}", hex::encode(sig_bytes))
}
