//! Tweedentity identity store.
//!
//! One store per namespace (twitter, github, ...). The store keeps a
//! bijective, time-locked map between ledger addresses and external ids and
//! answers to its own authorization ledger:
//!
//! - Verifier tier writes identities
//! - CustomerService tier removes them
//! - Developer tier (or the owner) tunes the time lock
//!
//! Users may always remove their own binding.

#![deny(unsafe_code)]

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{AddressEntry, IdentityStore, UidEntry};
