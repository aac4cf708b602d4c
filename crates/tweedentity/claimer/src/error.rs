use thiserror::Error;
use tweedentity_auth::AuthError;
use tweedentity_crypto::CryptoError;
use tweedentity_manager::ManagerError;
use tweedentity_types::{Address, RequestId, TypeError};

/// Hard failures of `claim_ownership` and the claimer's admin surface.
///
/// The callback path never produces these; its failures are recorded as
/// [`RejectionReason`](crate::RejectionReason)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    #[error("invalid post id: {0:?}")]
    InvalidPostId(String),

    #[error("the zero address cannot claim an identity")]
    ZeroAddress,

    #[error("no manager attached")]
    ManagerUnset,

    #[error("namespace {0} has no store")]
    NamespaceUnbound(String),

    #[error("manager is paused")]
    ManagerPaused,

    #[error("fee rate times fee budget overflows")]
    FeeOverflow,

    #[error("insufficient funds: {required} required, {attached} attached")]
    InsufficientFunds { required: u128, attached: u128 },

    #[error("fetch provider error: {0}")]
    Fetch(#[from] FetchError),

    #[error("provider reused request id {0}")]
    DuplicateRequest(RequestId),

    #[error("no refund available for {0}")]
    NoRefund(Address),
}

/// Fetch provider failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("fetch channel closed")]
    ChannelClosed,

    #[error("fetch provider unavailable: {0}")]
    Unavailable(String),

    #[error("post not found: {0}")]
    NotFound(String),
}

/// Why a fetched post does not carry a usable proof.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("content too short: {0} characters")]
    TooShort(usize),

    #[error("expected a lone signature token, found {0} bytes")]
    UnexpectedLength(usize),

    #[error(transparent)]
    Token(#[from] CryptoError),
}
