pub mod serde {
    use alloy_core::primitives::Address;
    use serde::Serializer;

    /// Serializes an address in its EIP-55 checksummed form
    pub fn checksummed_address<S: Serializer>(address: &Address, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&address.to_checksum(None))
    }
}
