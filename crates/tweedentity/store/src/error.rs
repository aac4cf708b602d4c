use thiserror::Error;
use tweedentity_auth::AuthError;
use tweedentity_types::{Address, TypeError};

/// Errors from store operations. A returned error means nothing was mutated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    #[error("the zero address cannot hold an identity")]
    ZeroAddress,

    #[error("app already set to {0}")]
    AppAlreadySet(String),

    #[error("no identity bound to {0}")]
    IdentityNotFound(Address),
}
