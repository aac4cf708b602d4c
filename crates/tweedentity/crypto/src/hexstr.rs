use crate::error::CryptoError;
use crate::recover::SIGNATURE_LEN;

/// Length of an embedded signature token: `0x` plus 65 bytes of hex.
pub const SIGNATURE_TOKEN_LEN: usize = 2 + SIGNATURE_LEN * 2;

/// Map one hex digit to its value. Accepts either case.
pub fn parse_int16_char(c: char) -> Result<u8, CryptoError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(CryptoError::InvalidHexChar(c)),
    }
}

/// Decode an unprefixed hex string.
///
/// Fails on odd length or any character outside `[0-9a-fA-F]`.
pub fn hexstr_to_bytes(s: &str) -> Result<Vec<u8>, CryptoError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(CryptoError::OddLength(chars.len()));
    }
    chars
        .chunks(2)
        .map(|pair| -> Result<u8, CryptoError> {
            Ok(parse_int16_char(pair[0])? << 4 | parse_int16_char(pair[1])?)
        })
        .collect()
}

/// Parse a `0x`-prefixed, 132-character signature token into 65 bytes.
pub fn parse_signature_token(token: &str) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
    if token.chars().count() != SIGNATURE_TOKEN_LEN {
        return Err(CryptoError::InvalidToken(format!(
            "expected {} characters, got {}",
            SIGNATURE_TOKEN_LEN,
            token.chars().count()
        )));
    }
    let digits = token
        .strip_prefix("0x")
        .ok_or_else(|| CryptoError::InvalidToken("missing 0x prefix".into()))?;
    let bytes = hexstr_to_bytes(digits)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidToken("wrong decoded length".into()))
}
