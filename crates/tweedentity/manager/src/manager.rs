use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tweedentity_auth::AuthorizationLedger;
use tweedentity_store::IdentityStore;
use tweedentity_types::app::normalize_nickname;
use tweedentity_types::{
    Address, AuthLevel, AuthorizationTiers, Event, EventLog, ExternalId, SharedClock, Tier,
    Timestamp, TweedentityConfig, Upgradability,
};

use crate::error::ManagerError;

/// Result of a verified write that passed every hard check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetIdentityOutcome {
    Committed,
    /// The store refused on time-lock grounds. Nothing changed.
    NotUpgradable(Upgradability),
}

impl SetIdentityOutcome {
    /// Whether the identity was written.
    pub fn is_committed(&self) -> bool {
        matches!(self, SetIdentityOutcome::Committed)
    }
}

/// Identity Manager: namespace directory and write gate.
///
/// Owns the stores bound to it. A store may only be bound once it has an app
/// registered and has granted this manager the highest tier in its own
/// ledger; after that every write travels `caller → manager → store` with the
/// manager as the store-level caller.
pub struct IdentityManager {
    address: Address,
    auth: AuthorizationLedger,
    tiers: AuthorizationTiers,
    stores: HashMap<String, IdentityStore>,
    apps: BTreeMap<u64, String>,
    claimer: Option<Address>,
    paused: bool,
    clock: SharedClock,
    events: EventLog,
}

impl IdentityManager {
    /// An unpaused manager with no stores and no claimer.
    pub fn new(address: Address, owner: Address, config: &TweedentityConfig, clock: SharedClock) -> Self {
        Self {
            address,
            auth: AuthorizationLedger::new(owner),
            tiers: config.tiers,
            stores: HashMap::new(),
            apps: BTreeMap::new(),
            claimer: None,
            paused: false,
            clock,
            events: EventLog::new(),
        }
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Grant `level` to `address` in the manager. Owner only.
    pub fn authorize(&mut self, caller: &Address, address: Address, level: AuthLevel) -> Result<(), ManagerError> {
        Ok(self.auth.authorize(caller, address, level)?)
    }

    /// Revoke `address`. Owner, or `address` itself.
    pub fn deauthorize(&mut self, caller: &Address, address: &Address) -> Result<bool, ManagerError> {
        Ok(self.auth.deauthorize(caller, address)?)
    }

    /// Bind a store under its app's nickname. Owner only.
    pub fn bind_store(&mut self, caller: &Address, store: IdentityStore) -> Result<(), ManagerError> {
        self.auth.require_owner(caller)?;
        let namespace = self.check_store(&store)?;
        if self.stores.contains_key(&namespace) {
            return Err(ManagerError::NamespaceAlreadyBound(namespace));
        }
        self.insert_store(namespace, store);
        Ok(())
    }

    /// Replace the store bound under the incoming store's namespace. Owner only.
    ///
    /// Returns the store that was displaced, if any.
    pub fn reassign_store(
        &mut self,
        caller: &Address,
        store: IdentityStore,
    ) -> Result<Option<IdentityStore>, ManagerError> {
        self.auth.require_owner(caller)?;
        let namespace = self.check_store(&store)?;
        let previous = self.stores.remove(&namespace);
        if let Some(prev) = &previous {
            warn!(namespace = %namespace, previous = %prev.address(), "Store reassigned");
        }
        self.insert_store(namespace, store);
        Ok(previous)
    }

    fn check_store(&self, store: &IdentityStore) -> Result<String, ManagerError> {
        let app = store
            .app()
            .ok_or(ManagerError::StoreAppNotSet(store.address()))?;
        if !store
            .authorization()
            .is_authorized_at(&self.address, self.tiers.highest())
        {
            return Err(ManagerError::NotAuthorizedInStore {
                store: store.address(),
                manager: self.address,
            });
        }
        Ok(app.nickname.clone())
    }

    fn insert_store(&mut self, namespace: String, store: IdentityStore) {
        if let Some(app) = store.app() {
            self.apps.insert(app.app_id.0, namespace.clone());
        }
        info!(namespace = %namespace, store = %store.address(), "Store bound");
        self.events.emit(Event::StoreBound {
            namespace: namespace.clone(),
            store: store.address(),
        });
        self.stores.insert(namespace, store);
    }

    /// Authorize `claimer` at the Verifier tier, revoking the previous claimer.
    pub fn set_claimer(&mut self, caller: &Address, claimer: Address) -> Result<Option<Address>, ManagerError> {
        self.auth.require_owner(caller)?;
        if claimer.is_zero() {
            return Err(ManagerError::ZeroAddress);
        }
        self.auth
            .authorize(caller, claimer, self.tiers.level(Tier::Verifier))?;
        let previous = self.claimer.replace(claimer);
        if let Some(prev) = previous.filter(|prev| *prev != claimer) {
            self.auth.deauthorize(caller, &prev)?;
        }
        info!(claimer = %claimer, "Claimer set");
        self.events.emit(Event::ClaimerSet { claimer });
        Ok(previous)
    }

    /// Developer tier.
    pub fn change_minimum_time_before_update(
        &mut self,
        caller: &Address,
        namespace: &str,
        seconds: u64,
    ) -> Result<(), ManagerError> {
        let key = self.resolve(namespace)?;
        self.auth
            .require_level(caller, self.tiers.level(Tier::Developer))?;
        let store = self
            .stores
            .get_mut(&key)
            .ok_or(ManagerError::StoreNotBound(key.clone()))?;
        store.change_minimum_time_before_update(&self.address, seconds)?;
        Ok(())
    }

    /// Block identity writes and new claims. Owner only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), ManagerError> {
        self.auth.require_owner(caller)?;
        if !self.paused {
            self.paused = true;
            warn!(manager = %self.address, "Manager paused");
            self.events.emit(Event::Paused);
        }
        Ok(())
    }

    /// Owner only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), ManagerError> {
        self.auth.require_owner(caller)?;
        if self.paused {
            self.paused = false;
            info!(manager = %self.address, "Manager unpaused");
            self.events.emit(Event::Unpaused);
        }
        Ok(())
    }

    // =========================================================================
    // IDENTITY OPERATIONS
    // =========================================================================

    /// Write a verified identity to the namespace's store.
    ///
    /// Checks run in a fixed order: store bound, not paused, Verifier tier.
    /// A time-locked pairing comes back as `Ok(NotUpgradable(..))` with an
    /// `IdentityNotUpgradable` event rather than an error.
    pub fn set_identity(
        &mut self,
        caller: &Address,
        namespace: &str,
        address: Address,
        uid: &str,
    ) -> Result<SetIdentityOutcome, ManagerError> {
        let key = self.resolve(namespace)?;
        if self.paused {
            return Err(ManagerError::Paused);
        }
        self.auth
            .require_level(caller, self.tiers.level(Tier::Verifier))?;

        let store = self
            .stores
            .get_mut(&key)
            .ok_or(ManagerError::StoreNotBound(key.clone()))?;
        let verdict = store.set_identity(&self.address, address, uid)?;
        if verdict.is_upgradable() {
            return Ok(SetIdentityOutcome::Committed);
        }

        let uid = ExternalId::parse(uid)?;
        warn!(namespace = %key, address = %address, uid = %uid, reason = %verdict, "Identity not upgradable");
        self.events.emit(Event::IdentityNotUpgradable {
            namespace: key,
            address,
            uid,
            reason: verdict,
        });
        Ok(SetIdentityOutcome::NotUpgradable(verdict))
    }

    /// Administrative removal. CustomerService tier.
    pub fn remove_identity(
        &mut self,
        caller: &Address,
        namespace: &str,
        address: &Address,
    ) -> Result<ExternalId, ManagerError> {
        let key = self.resolve(namespace)?;
        self.auth
            .require_level(caller, self.tiers.level(Tier::CustomerService))?;
        let store = self
            .stores
            .get_mut(&key)
            .ok_or(ManagerError::StoreNotBound(key.clone()))?;
        Ok(store.remove_identity(&self.address, address)?)
    }

    /// Remove the caller's own binding in `namespace`.
    pub fn remove_my_identity(&mut self, caller: &Address, namespace: &str) -> Result<ExternalId, ManagerError> {
        let key = self.resolve(namespace)?;
        let store = self
            .stores
            .get_mut(&key)
            .ok_or(ManagerError::StoreNotBound(key.clone()))?;
        Ok(store.remove_my_identity(caller)?)
    }

    /// Verdict for a prospective pairing. Unbound namespaces are never upgradable.
    pub fn get_upgradability(&self, namespace: &str, address: &Address, uid: &str) -> Upgradability {
        match self.store(namespace) {
            Some(store) => store.is_upgradable(address, uid),
            None => Upgradability::NotUpgradableInStore,
        }
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Address this manager is deployed at.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The administering owner.
    pub fn owner(&self) -> Address {
        self.auth.owner()
    }

    /// The manager's authorization ledger.
    pub fn authorization(&self) -> &AuthorizationLedger {
        &self.auth
    }

    /// Levels required by each tier.
    pub fn tiers(&self) -> &AuthorizationTiers {
        &self.tiers
    }

    /// The claimer allowed to write identities.
    pub fn claimer(&self) -> Option<Address> {
        self.claimer
    }

    /// Whether writes are blocked.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time on the manager's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Store bound to `namespace`.
    pub fn store(&self, namespace: &str) -> Option<&IdentityStore> {
        let key = normalize_nickname(namespace).ok()?;
        self.stores.get(&key)
    }

    /// Mutable access for the store's own owner-level administration.
    /// The store still checks the caller on every operation.
    pub fn store_mut(&mut self, namespace: &str) -> Option<&mut IdentityStore> {
        let key = normalize_nickname(namespace).ok()?;
        self.stores.get_mut(&key)
    }

    /// Whether `namespace` has a store.
    pub fn is_store_bound(&self, namespace: &str) -> bool {
        self.store(namespace).is_some()
    }

    /// Bound namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Namespace whose store serves `app_id`.
    pub fn namespace_of_app(&self, app_id: u64) -> Option<&str> {
        self.apps.get(&app_id).map(String::as_str)
    }

    /// Uid bound to `address` in `namespace`.
    pub fn get_uid(&self, namespace: &str, address: &Address) -> Option<ExternalId> {
        self.store(namespace).and_then(|store| store.get_uid(address))
    }

    /// Address bound to `uid` in `namespace`.
    pub fn get_address(&self, namespace: &str, uid: &str) -> Option<Address> {
        self.store(namespace).and_then(|store| store.get_address(uid))
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Take and clear the emitted events.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    fn resolve(&self, namespace: &str) -> Result<String, ManagerError> {
        let key = normalize_nickname(namespace)
            .map_err(|_| ManagerError::StoreNotBound(namespace.to_string()))?;
        if self.stores.contains_key(&key) {
            Ok(key)
        } else {
            Err(ManagerError::StoreNotBound(key))
        }
    }
}

impl std::fmt::Debug for IdentityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityManager")
            .field("address", &self.address)
            .field("namespaces", &self.namespaces())
            .field("claimer", &self.claimer)
            .field("paused", &self.paused)
            .finish()
    }
}
