//! EIP-191 `personal_sign` verification
//!
//! Every malformed input is reported as [`Error::InvalidSignature`]; nothing in
//! here panics on user supplied data.

use alloy_core::primitives::{eip191_hash_message, Address};
use alloy_signer::k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use alloy_signer::utils::public_key_to_address;

use crate::constants::auth::SIGNATURE_LENGTH;
use crate::error::{Error, Result};

/// Address whose key produced `signature` over `message`
///
/// `signature` is the hex encoded `r || s || v`, optionally `0x` prefixed, with
/// `v` either `0`/`1` or `27`/`28`.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address> {
    let encoded = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(encoded).map_err(|_| Error::InvalidSignature)?;

    if bytes.len() != SIGNATURE_LENGTH {
        return Err(Error::InvalidSignature);
    }

    let v = match bytes[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return Err(Error::InvalidSignature),
    };

    let signature = Signature::from_slice(&bytes[..64]).map_err(|_| Error::InvalidSignature)?;
    // high-s signatures are malleable copies of a valid one
    if signature.normalize_s().is_some() {
        return Err(Error::InvalidSignature);
    }

    let recovery_id = RecoveryId::from_byte(v).ok_or(Error::InvalidSignature)?;
    let prehash = eip191_hash_message(message.as_bytes());

    let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recovery_id)
        .map_err(|_| Error::InvalidSignature)?;

    Ok(public_key_to_address(&key))
}

/// Check that `signature` over `message` was produced by `address`
pub fn verify(address: &Address, message: &str, signature: &str) -> Result<()> {
    if recover_signer(message, signature)? == *address {
        Ok(())
    } else {
        Err(Error::InvalidSignature)
    }
}
