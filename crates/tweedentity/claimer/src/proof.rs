//! Signature proofs embedded in public posts.
//!
//! A fetched post description looks like `"0x<130 hex>"`: one wrapper
//! character on each side around the signature token. The external id the
//! signature must cover is not part of the description; it is the author id
//! the provider reports for the post.

use tweedentity_crypto::{parse_signature_token, SIGNATURE_LEN, SIGNATURE_TOKEN_LEN};

use crate::error::ProofError;

/// Pull the signature token out of a fetched post description.
pub fn extract_signature(description: &str) -> Result<[u8; SIGNATURE_LEN], ProofError> {
    let mut chars = description.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return Err(ProofError::TooShort(description.chars().count()));
    }
    let token = chars.as_str();
    if token.len() < SIGNATURE_TOKEN_LEN {
        return Err(ProofError::TooShort(description.chars().count()));
    }
    if token.len() != SIGNATURE_TOKEN_LEN {
        return Err(ProofError::UnexpectedLength(token.len()));
    }
    Ok(parse_signature_token(token)?)
}

/// Render the description of a post carrying `signature`, wrapped in double
/// quotes.
pub fn format_post_description(signature: &[u8; SIGNATURE_LEN]) -> String {
    format!("\"0x{}\"", hex::encode(signature))
}
