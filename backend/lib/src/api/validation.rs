use alloy_core::primitives::Address;

use crate::error::Error;
use crate::models::TokenId;

/// Parses an ethereum address given as:
///
/// * a `0x` prefixed string
/// * of 42 characters (0x + 20 bytes)
/// * with only ascii hex digits after the prefix, in any letter case
pub fn parse_address(address: &str) -> Result<Address, Error> {
    let valid = address.starts_with("0x")
        && address.len() == 42
        && address[2..].chars().all(|c| c.is_ascii_hexdigit());

    if !valid {
        return Err(Error::BadRequest(format!("Invalid Ethereum address: {address}")));
    }

    address
        .parse()
        .map_err(|_| Error::BadRequest(format!("Invalid Ethereum address: {address}")))
}

pub fn parse_token_id(id: &str) -> Result<TokenId, Error> {
    id.parse()
        .map_err(|_| Error::BadRequest(format!("Invalid token id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::mocks::MOCK_ADDRESS;

    #[test]
    fn address_parsing_ignores_case() {
        let checksummed = MOCK_ADDRESS.to_checksum(None);

        assert_eq!(parse_address(&checksummed).unwrap(), MOCK_ADDRESS);
        assert_eq!(parse_address(&checksummed.to_lowercase()).unwrap(), MOCK_ADDRESS);
        assert_eq!(
            parse_address(&format!("0x{}", checksummed[2..].to_uppercase())).unwrap(),
            MOCK_ADDRESS
        );
    }

    #[test]
    fn malformed_addresses_are_bad_requests() {
        for input in [
            "",
            "0x",
            "not_an_eth_address",
            "f39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb9226",
            "0xg39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
        ] {
            assert!(matches!(parse_address(input), Err(Error::BadRequest(_))), "{input}");
        }
    }

    #[test]
    fn token_ids_must_be_unsigned() {
        assert_eq!(parse_token_id("45").unwrap(), 45);
        assert!(parse_token_id("-1").is_err());
        assert!(parse_token_id("abc").is_err());
    }
}
