use thiserror::Error;

/// Validation and recovery failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("hex string has odd length {0}")]
    OddLength(usize),

    #[error("invalid hex character {0:?}")]
    InvalidHexChar(char),

    #[error("substring bounds {start}..{end} out of range for length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("invalid signature token: {0}")]
    InvalidToken(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("signer recovery failed")]
    RecoveryFailed,
}
