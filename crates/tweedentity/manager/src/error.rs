use thiserror::Error;
use tweedentity_auth::AuthError;
use tweedentity_store::StoreError;
use tweedentity_types::{Address, TypeError};

/// Errors from manager operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    #[error("no store bound for namespace {0}")]
    StoreNotBound(String),

    #[error("namespace {0} already has a store")]
    NamespaceAlreadyBound(String),

    #[error("store {0} has no app registered")]
    StoreAppNotSet(Address),

    #[error("store {store} has not authorized manager {manager}")]
    NotAuthorizedInStore { store: Address, manager: Address },

    #[error("manager is paused")]
    Paused,

    #[error("the zero address is not allowed here")]
    ZeroAddress,

    #[error("manager lock poisoned")]
    LockError,
}
