use tweedentity_types::Address;

use crate::error::CryptoError;

pub fn uint_to_string(value: u128) -> String {
    value.to_string()
}

/// Big-endian, left-padded to 32 bytes.
pub fn uint_to_bytes32(value: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Byte-range substring `[start, end)`.
///
/// Fails when the range is inverted, exceeds the string, or splits a character.
pub fn substring(s: &str, start: usize, end: usize) -> Result<String, CryptoError> {
    let out_of_bounds = CryptoError::OutOfBounds {
        start,
        end,
        len: s.len(),
    };
    if start > end || end > s.len() {
        return Err(out_of_bounds);
    }
    s.get(start..end).map(str::to_string).ok_or(out_of_bounds)
}

/// `0x` followed by 40 lowercase hex characters.
pub fn address_to_string(address: &Address) -> String {
    address.to_string()
}
