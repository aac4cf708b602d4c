use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tweedentity_types::{Address, PauseStatus};

use crate::error::ManagerError;
use crate::manager::IdentityManager;

/// Shared handle to one [`IdentityManager`].
///
/// The claimer, the registry and administrative callers all hold clones of
/// the same handle. A manager's address is fixed at construction, so the
/// handle keeps a copy readable without taking the lock.
#[derive(Clone)]
pub struct SharedManager {
    inner: Arc<RwLock<IdentityManager>>,
    address: Address,
}

impl SharedManager {
    pub fn new(manager: IdentityManager) -> Self {
        let address = manager.address();
        Self {
            inner: Arc::new(RwLock::new(manager)),
            address,
        }
    }

    /// Acquire the manager for reading.
    pub fn read(&self) -> Result<RwLockReadGuard<'_, IdentityManager>, ManagerError> {
        self.inner.read().map_err(|_| ManagerError::LockError)
    }

    /// Acquire the manager for writing.
    pub fn write(&self) -> Result<RwLockWriteGuard<'_, IdentityManager>, ManagerError> {
        self.inner.write().map_err(|_| ManagerError::LockError)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether both handles point at the same manager.
    pub fn same_as(&self, other: &SharedManager) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<IdentityManager> for SharedManager {
    fn from(manager: IdentityManager) -> Self {
        Self::new(manager)
    }
}

impl std::fmt::Debug for SharedManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.read() {
            Ok(manager) => f.debug_tuple("SharedManager").field(&*manager).finish(),
            Err(_) => f.write_str("SharedManager(<poisoned>)"),
        }
    }
}

impl PauseStatus for SharedManager {
    fn deployed_address(&self) -> Address {
        self.address
    }

    /// A poisoned manager reports paused.
    fn is_paused(&self) -> bool {
        self.read().map(|manager| manager.is_paused()).unwrap_or(true)
    }
}
