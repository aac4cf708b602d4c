use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tweedentity_auth::AuthorizationLedger;
use tweedentity_types::{
    Address, AppRegistration, AuthLevel, AuthorizationTiers, Event, EventLog, ExternalId,
    SharedClock, StoreConfig, Tier, Timestamp, Upgradability,
};

use crate::error::StoreError;

/// The uid side of a binding, indexed by address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidEntry {
    pub uid: ExternalId,
    pub last_update: Timestamp,
}

/// The address side of a binding, indexed by uid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    pub address: Address,
    pub last_update: Timestamp,
}

/// Identity store for a single namespace.
///
/// Holds a one-to-one map between ledger addresses and external ids. Either
/// side of a binding is locked against re-association for
/// `minimum_time_before_update` seconds after it was last written.
pub struct IdentityStore {
    address: Address,
    app: Option<AppRegistration>,
    manager: Option<Address>,
    by_address: HashMap<Address, UidEntry>,
    by_uid: HashMap<ExternalId, AddressEntry>,
    minimum_time_before_update: u64,
    tiers: AuthorizationTiers,
    auth: AuthorizationLedger,
    clock: SharedClock,
    events: EventLog,
}

impl IdentityStore {
    /// An empty store with no app and no manager.
    pub fn new(address: Address, owner: Address, config: &StoreConfig, clock: SharedClock) -> Self {
        Self {
            address,
            app: None,
            manager: None,
            by_address: HashMap::new(),
            by_uid: HashMap::new(),
            minimum_time_before_update: config.minimum_time_before_update,
            tiers: config.tiers,
            auth: AuthorizationLedger::new(owner),
            clock,
            events: EventLog::new(),
        }
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Register the app this store serves. Owner only, once.
    pub fn set_app(&mut self, caller: &Address, nickname: &str, app_id: u64) -> Result<(), StoreError> {
        self.auth.require_owner(caller)?;
        if let Some(existing) = &self.app {
            return Err(StoreError::AppAlreadySet(existing.nickname.clone()));
        }
        let app = AppRegistration::new(nickname, app_id)?;

        info!(store = %self.address, app = %app.nickname, app_id = %app.app_id, "App set");
        self.events.emit(Event::AppSet {
            nickname: app.nickname.clone(),
            app_id: app.app_id.0,
        });
        self.app = Some(app);
        Ok(())
    }

    /// Authorize `manager` at the highest tier, revoking the previous manager.
    ///
    /// Returns the manager that was replaced, if any.
    pub fn set_manager(&mut self, caller: &Address, manager: Address) -> Result<Option<Address>, StoreError> {
        self.auth.require_owner(caller)?;
        if manager.is_zero() {
            return Err(StoreError::ZeroAddress);
        }

        self.auth.authorize(caller, manager, self.tiers.highest())?;
        let previous = self.manager.replace(manager);
        if let Some(prev) = previous.filter(|prev| *prev != manager) {
            self.auth.deauthorize(caller, &prev)?;
        }
        info!(store = %self.address, manager = %manager, "Store manager set");
        Ok(previous)
    }

    /// Grant `level` to `address` in this store. Owner only.
    pub fn authorize(&mut self, caller: &Address, address: Address, level: AuthLevel) -> Result<(), StoreError> {
        Ok(self.auth.authorize(caller, address, level)?)
    }

    /// Revoke `address`. Owner, or `address` itself.
    pub fn deauthorize(&mut self, caller: &Address, address: &Address) -> Result<bool, StoreError> {
        Ok(self.auth.deauthorize(caller, address)?)
    }

    /// Owner or Developer tier.
    pub fn change_minimum_time_before_update(&mut self, caller: &Address, seconds: u64) -> Result<(), StoreError> {
        self.auth
            .require_owner_or_level(caller, self.tiers.level(Tier::Developer))?;
        self.minimum_time_before_update = seconds;
        info!(store = %self.address, seconds, "Minimum time before update changed");
        self.events.emit(Event::MinimumTimeChanged { seconds });
        Ok(())
    }

    // =========================================================================
    // IDENTITY WRITES
    // =========================================================================

    /// Bind `address` to `uid`.
    ///
    /// Hard errors (authorization, validation) leave the store untouched. A
    /// time-locked pairing is not an error: the verdict comes back in `Ok`
    /// and nothing changes. On success any previous counterpart of either
    /// side is released first.
    pub fn set_identity(
        &mut self,
        caller: &Address,
        address: Address,
        uid: &str,
    ) -> Result<Upgradability, StoreError> {
        self.auth
            .require_level(caller, self.tiers.level(Tier::Verifier))?;
        if address.is_zero() {
            return Err(StoreError::ZeroAddress);
        }
        let uid = ExternalId::parse(uid)?;

        let verdict = self.upgradability(&address, &uid);
        if !verdict.is_upgradable() {
            debug!(store = %self.address, address = %address, uid = %uid, reason = %verdict, "Identity not upgradable");
            return Ok(verdict);
        }

        let stale_uid = self
            .by_address
            .get(&address)
            .map(|entry| entry.uid.clone())
            .filter(|old| *old != uid);
        if let Some(old) = stale_uid {
            self.by_uid.remove(&old);
            self.events.emit(Event::IdentityUnset {
                address,
                uid: old,
            });
        }

        let stale_address = self
            .by_uid
            .get(&uid)
            .map(|entry| entry.address)
            .filter(|old| *old != address);
        if let Some(old) = stale_address {
            self.by_address.remove(&old);
            self.events.emit(Event::IdentityUnset {
                address: old,
                uid: uid.clone(),
            });
        }

        let now = self.clock.now();
        self.by_address.insert(
            address,
            UidEntry {
                uid: uid.clone(),
                last_update: now,
            },
        );
        self.by_uid.insert(
            uid.clone(),
            AddressEntry {
                address,
                last_update: now,
            },
        );

        info!(store = %self.address, address = %address, uid = %uid, "Identity set");
        self.events.emit(Event::IdentitySet { address, uid });
        Ok(Upgradability::Upgradable)
    }

    /// Administrative removal. CustomerService tier.
    pub fn remove_identity(&mut self, caller: &Address, address: &Address) -> Result<ExternalId, StoreError> {
        self.auth
            .require_level(caller, self.tiers.level(Tier::CustomerService))?;
        self.unbind(address)
    }

    /// Self-service removal of the caller's own binding.
    pub fn remove_my_identity(&mut self, caller: &Address) -> Result<ExternalId, StoreError> {
        self.unbind(caller)
    }

    fn unbind(&mut self, address: &Address) -> Result<ExternalId, StoreError> {
        let entry = self
            .by_address
            .remove(address)
            .ok_or(StoreError::IdentityNotFound(*address))?;
        self.by_uid.remove(&entry.uid);

        warn!(store = %self.address, address = %address, uid = %entry.uid, "Identity removed");
        self.events.emit(Event::IdentityUnset {
            address: *address,
            uid: entry.uid.clone(),
        });
        Ok(entry.uid)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Address this store is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The app this store serves, once set.
    pub fn app(&self) -> Option<&AppRegistration> {
        self.app.as_ref()
    }

    /// The manager currently authorized to write.
    pub fn manager(&self) -> Option<Address> {
        self.manager
    }

    /// Seconds a binding is locked after its last update.
    pub fn minimum_time_before_update(&self) -> u64 {
        self.minimum_time_before_update
    }

    /// Levels required by each tier.
    pub fn tiers(&self) -> &AuthorizationTiers {
        &self.tiers
    }

    /// The store's authorization ledger.
    pub fn authorization(&self) -> &AuthorizationLedger {
        &self.auth
    }

    /// Whether `address` is bound to a uid.
    pub fn is_address_set(&self, address: &Address) -> bool {
        self.by_address.contains_key(address)
    }

    /// Whether `uid` is bound to an address.
    pub fn is_uid_set(&self, uid: &str) -> bool {
        self.lookup_uid(uid).is_some()
    }

    /// Uid bound to `address`.
    pub fn get_uid(&self, address: &Address) -> Option<ExternalId> {
        self.by_address.get(address).map(|entry| entry.uid.clone())
    }

    /// Address bound to `uid`.
    pub fn get_address(&self, uid: &str) -> Option<Address> {
        self.lookup_uid(uid).map(|entry| entry.address)
    }

    /// When `address` was last bound.
    pub fn get_address_last_update(&self, address: &Address) -> Option<Timestamp> {
        self.by_address.get(address).map(|entry| entry.last_update)
    }

    /// When `uid` was last bound.
    pub fn get_uid_last_update(&self, uid: &str) -> Option<Timestamp> {
        self.lookup_uid(uid).map(|entry| entry.last_update)
    }

    /// Number of bound pairs.
    pub fn identities(&self) -> usize {
        self.by_address.len()
    }

    /// All bound pairs, ordered by address.
    pub fn bindings(&self) -> Vec<(Address, ExternalId)> {
        let mut pairs: Vec<_> = self
            .by_address
            .iter()
            .map(|(address, entry)| (*address, entry.uid.clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// Verdict for binding `address` to `uid` right now. Invalid uids are
    /// never locked.
    pub fn is_upgradable(&self, address: &Address, uid: &str) -> Upgradability {
        match ExternalId::parse(uid) {
            Ok(uid) => self.upgradability(address, &uid),
            Err(_) => Upgradability::from_locks(false, self.address_locked(address, None)),
        }
    }

    /// Whether both indexes describe the same set of pairs.
    pub fn is_consistent(&self) -> bool {
        self.by_address.len() == self.by_uid.len()
            && self.by_address.iter().all(|(address, entry)| {
                self.by_uid
                    .get(&entry.uid)
                    .map_or(false, |back| back.address == *address && back.last_update == entry.last_update)
            })
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Take and clear the emitted events.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    fn lookup_uid(&self, uid: &str) -> Option<&AddressEntry> {
        ExternalId::parse(uid)
            .ok()
            .and_then(|uid| self.by_uid.get(&uid))
    }

    fn upgradability(&self, address: &Address, uid: &ExternalId) -> Upgradability {
        let uid_locked = self
            .by_uid
            .get(uid)
            .map_or(false, |entry| entry.address != *address && self.is_locked(entry.last_update));
        Upgradability::from_locks(uid_locked, self.address_locked(address, Some(uid)))
    }

    fn address_locked(&self, address: &Address, uid: Option<&ExternalId>) -> bool {
        self.by_address.get(address).map_or(false, |entry| {
            Some(&entry.uid) != uid && self.is_locked(entry.last_update)
        })
    }

    fn is_locked(&self, last_update: Timestamp) -> bool {
        self.clock.now().saturating_sub(last_update) < self.minimum_time_before_update
    }
}

impl std::fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityStore")
            .field("address", &self.address)
            .field("app", &self.app)
            .field("manager", &self.manager)
            .field("identities", &self.by_address.len())
            .field("minimum_time_before_update", &self.minimum_time_before_update)
            .finish()
    }
}
