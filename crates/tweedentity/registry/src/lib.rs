//! Tweedentity registry.
//!
//! Directory of the deployed components: one store per namespace, the
//! manager and the claimer. Clients read it to discover addresses and to ask
//! whether the deployment is ready to accept claims. The registry starts
//! paused, and the manager is registered as a live handle so readiness
//! always follows the manager's own pause flag.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use tweedentity_auth::{AuthError, AuthorizationLedger};
use tweedentity_types::app::normalize_nickname;
use tweedentity_types::{Address, Event, EventLog, PauseStatus, RegistryConfig, TypeError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    #[error("the zero address cannot be registered")]
    ZeroAddress,
}

pub struct Registry {
    auth: AuthorizationLedger,
    stores: BTreeMap<String, Address>,
    manager: Option<Arc<dyn PauseStatus>>,
    claimer: Option<Address>,
    required_namespaces: Vec<String>,
    paused: bool,
    events: EventLog,
}

impl Registry {
    /// A paused registry with nothing registered.
    pub fn new(owner: Address, config: &RegistryConfig) -> Self {
        Self {
            auth: AuthorizationLedger::new(owner),
            stores: BTreeMap::new(),
            manager: None,
            claimer: None,
            required_namespaces: config
                .required_namespaces
                .iter()
                .map(|ns| ns.trim().to_lowercase())
                .collect(),
            paused: true,
            events: EventLog::new(),
        }
    }

    /// Record the store serving `namespace`. Returns the address it replaced.
    pub fn set_store(
        &mut self,
        caller: &Address,
        namespace: &str,
        store: Address,
    ) -> Result<Option<Address>, RegistryError> {
        self.auth.require_owner(caller)?;
        let namespace = normalize_nickname(namespace)?;
        if store.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        info!(namespace = %namespace, store = %store, "Registry store set");
        self.events.emit(Event::StoreBound {
            namespace: namespace.clone(),
            store,
        });
        Ok(self.stores.insert(namespace, store))
    }

    /// Store registered for `namespace`, if any.
    pub fn get_store(&self, namespace: &str) -> Option<Address> {
        let key = normalize_nickname(namespace).ok()?;
        self.stores.get(&key).copied()
    }

    /// Register the deployed manager. Its address and pause flag are both
    /// read from the handle. Owner only.
    pub fn set_manager(&mut self, caller: &Address, manager: Arc<dyn PauseStatus>) -> Result<(), RegistryError> {
        self.auth.require_owner(caller)?;
        let address = manager.deployed_address();
        if address.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        info!(manager = %address, "Registry manager set");
        self.manager = Some(manager);
        self.events.emit(Event::ManagerSet { manager: address });
        Ok(())
    }

    /// Register the deployed claimer. Owner only.
    pub fn set_claimer(&mut self, caller: &Address, claimer: Address) -> Result<(), RegistryError> {
        self.auth.require_owner(caller)?;
        if claimer.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        info!(claimer = %claimer, "Registry claimer set");
        self.claimer = Some(claimer);
        self.events.emit(Event::ClaimerSet { claimer });
        Ok(())
    }

    /// Both or neither.
    pub fn set_manager_and_claimer(
        &mut self,
        caller: &Address,
        manager: Arc<dyn PauseStatus>,
        claimer: Address,
    ) -> Result<(), RegistryError> {
        self.auth.require_owner(caller)?;
        if manager.deployed_address().is_zero() || claimer.is_zero() {
            return Err(RegistryError::ZeroAddress);
        }
        self.set_manager(caller, manager)?;
        self.set_claimer(caller, claimer)
    }

    /// Stop advertising the deployment as ready. Owner only.
    pub fn pause(&mut self, caller: &Address) -> Result<(), RegistryError> {
        self.auth.require_owner(caller)?;
        if !self.paused {
            self.paused = true;
            warn!("Registry paused");
            self.events.emit(Event::Paused);
        }
        Ok(())
    }

    /// Owner only.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), RegistryError> {
        self.auth.require_owner(caller)?;
        if self.paused {
            self.paused = false;
            info!("Registry unpaused");
            self.events.emit(Event::Unpaused);
        }
        Ok(())
    }

    /// Unpaused, every required namespace has a store, the claimer is set,
    /// and a manager is set and not paused itself.
    pub fn is_ready(&self) -> bool {
        !self.paused
            && self.claimer.is_some()
            && self
                .manager
                .as_ref()
                .is_some_and(|manager| !manager.is_paused())
            && self
                .required_namespaces
                .iter()
                .all(|ns| self.stores.contains_key(ns))
    }

    /// The registry's own pause flag.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn owner(&self) -> Address {
        self.auth.owner()
    }

    /// Address of the registered manager.
    pub fn manager(&self) -> Option<Address> {
        self.manager.as_ref().map(|manager| manager.deployed_address())
    }

    /// Address of the registered claimer.
    pub fn claimer(&self) -> Option<Address> {
        self.claimer
    }

    /// Every registered store, keyed by namespace.
    pub fn stores(&self) -> &BTreeMap<String, Address> {
        &self.stores
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }
}
