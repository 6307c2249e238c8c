//! MemoryStore - process-local PropertyStore

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use contracts::{ContractError, PropertyStore};

use super::{LockedTransaction, State};

/// In-memory store, lost on exit
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    writable: AtomicBool,
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty, writable store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writable: AtomicBool::new(true),
            state: Mutex::new(State::new()),
        }
    }

    /// Create an empty store that rejects writes
    pub fn read_only(name: impl Into<String>) -> Self {
        let store = Self::new(name);
        store.set_writable(false);
        store
    }

    /// Flip the writable capability (e.g. on replica promotion)
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::Release);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl PropertyStore for MemoryStore {
    type Transaction<'a> = LockedTransaction<'a>;

    fn name(&self) -> &str {
        &self.name
    }

    fn is_writable(&self) -> bool {
        self.writable.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<Self::Transaction<'_>, ContractError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| ContractError::store(&self.name, "state lock poisoned"))?;
        Ok(LockedTransaction::new(&self.name, guard, None))
    }
}
