//! # tweedentity-claimer
//!
//! Proof-of-ownership for external accounts.
//!
//! A claimant posts the signature of `"{namespace}/{uid}@tweedentity"` on
//! the external platform, then calls [`OwnershipClaimer::claim_ownership`]
//! with the post id. The claimer asks a [`FetchProvider`] for the post and
//! returns immediately. When the provider calls back with the post's author
//! id and description, [`OwnershipClaimer::on_fetch_result`] recovers the
//! signer of `"{namespace}/{author_id}@tweedentity"` and, if it is the
//! claimant, binds the author id through the identity manager.
//!
//! The callback crosses an asynchronous gap: anything may have changed since
//! the request was issued, so every precondition is re-validated there.

#![deny(unsafe_code)]

pub mod claimer;
pub mod error;
pub mod proof;
pub mod provider;
pub mod relay;

pub use claimer::{
    ClaimRequest, OwnershipClaimer, PendingVerification, RejectionReason, VerificationOutcome,
    VerificationState,
};
pub use error::{ClaimError, FetchError, ProofError};
pub use proof::{extract_signature, format_post_description};
pub use provider::{
    FeeQuote, FetchProvider, FetchQuery, FetchRequest, FetchedPost, QueuedFetchProvider,
};
pub use relay::{ChannelFetchProvider, FetchRelay, FetchResponse, PostSource};
