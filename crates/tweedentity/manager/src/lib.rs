//! Tweedentity identity manager.
//!
//! Directory of namespace → [`IdentityStore`](tweedentity_store::IdentityStore).
//! Verified identities reach a store only through the manager, which adds the
//! pause switch and its own authorization tiers on top of the store's.

#![deny(unsafe_code)]

pub mod error;
pub mod manager;
pub mod shared;

pub use error::ManagerError;
pub use manager::{IdentityManager, SetIdentityOutcome};
pub use shared::SharedManager;
