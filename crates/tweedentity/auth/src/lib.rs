//! Tweedentity Authorization - tiered access control
//!
//! A flat map from address to integer level, administered by a single owner.
//! Each privileged operation elsewhere declares the minimum level it needs;
//! the ledger only answers whether a caller meets it.

#![deny(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tweedentity_types::{Address, AuthLevel, Event, EventLog};

/// Owner-administered authorization ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationLedger {
    owner: Address,
    levels: BTreeMap<Address, AuthLevel>,
    #[serde(skip)]
    events: EventLog,
}

impl AuthorizationLedger {
    /// Create a ledger owned by `owner`, with nobody authorized.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            levels: BTreeMap::new(),
            events: EventLog::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Whether `caller` is the owner.
    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Grant `level` to `address`, replacing any previous level. Owner only.
    pub fn authorize(
        &mut self,
        caller: &Address,
        address: Address,
        level: AuthLevel,
    ) -> Result<(), AuthError> {
        self.require_owner(caller)?;
        if address.is_zero() {
            return Err(AuthError::ZeroAddress);
        }
        if level.is_none() {
            return Err(AuthError::InvalidLevel);
        }

        self.levels.insert(address, level);
        info!(address = %address, level = %level, "Address authorized");
        self.events.emit(Event::Authorized { address, level });
        Ok(())
    }

    /// Revoke `address`. Allowed for the owner, and for `address` itself.
    ///
    /// Returns whether an entry was removed.
    pub fn deauthorize(&mut self, caller: &Address, address: &Address) -> Result<bool, AuthError> {
        if !self.is_owner(caller) && caller != address {
            return Err(AuthError::NotOwner(*caller));
        }

        let removed = self.levels.remove(address).is_some();
        if removed {
            warn!(address = %address, by = %caller, "Address deauthorized");
            self.events.emit(Event::Deauthorized { address: *address });
        }
        Ok(removed)
    }

    /// Hand the ledger to a new owner. Owner only.
    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), AuthError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(AuthError::ZeroAddress);
        }
        info!(from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }

    /// Level held by `address`; zero when unauthorized.
    pub fn level_of(&self, address: &Address) -> AuthLevel {
        self.levels.get(address).copied().unwrap_or(AuthLevel::NONE)
    }

    /// Whether `address` holds at least `min`.
    pub fn is_authorized_at(&self, address: &Address, min: AuthLevel) -> bool {
        let level = self.level_of(address);
        !level.is_none() && level >= min
    }

    /// Fail unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> Result<(), AuthError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(AuthError::NotOwner(*caller))
        }
    }

    /// Fail unless `caller` holds at least `min`.
    pub fn require_level(&self, caller: &Address, min: AuthLevel) -> Result<(), AuthError> {
        if self.is_authorized_at(caller, min) {
            Ok(())
        } else {
            Err(AuthError::Unauthorized {
                caller: *caller,
                required: min,
                actual: self.level_of(caller),
            })
        }
    }

    /// Fail unless `caller` is the owner or holds at least `min`.
    pub fn require_owner_or_level(&self, caller: &Address, min: AuthLevel) -> Result<(), AuthError> {
        if self.is_owner(caller) {
            return Ok(());
        }
        self.require_level(caller, min)
    }

    /// All currently authorized addresses, in address order.
    pub fn authorized_addresses(&self) -> Vec<Address> {
        self.levels.keys().copied().collect()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

/// Authorization failures. All are hard failures: no state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("caller {0} is not the owner")]
    NotOwner(Address),

    #[error("caller {caller} has level {actual}, {required} required")]
    Unauthorized {
        caller: Address,
        required: AuthLevel,
        actual: AuthLevel,
    },

    #[error("cannot authorize the zero address")]
    ZeroAddress,

    #[error("authorization level must be above zero")]
    InvalidLevel,
}
