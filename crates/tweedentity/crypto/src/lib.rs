//! Signature recovery utilities.
//!
//! Pure functions only: hex parsing, string/number conversions used to build
//! the canonical message, and secp256k1 signer recovery over the Ethereum
//! signed-message hash.

#![deny(unsafe_code)]

pub mod convert;
pub mod error;
pub mod hexstr;
pub mod recover;

pub use convert::{address_to_string, substring, uint_to_bytes32, uint_to_string};
pub use error::CryptoError;
pub use hexstr::{hexstr_to_bytes, parse_int16_char, parse_signature_token, SIGNATURE_TOKEN_LEN};
pub use recover::{
    address_of, canonical_message, ethereum_signed_message_hash, is_signed_by, recover_signer,
    sign_message, SIGNATURE_LEN,
};

pub use k256::ecdsa::{SigningKey, VerifyingKey};
