//! PropertyStore implementations
//!
//! Contains MemoryStore and FileStore. Both serialize transactions through a
//! mutex: a transaction owns the lock from `begin` until it is committed or
//! dropped, and works on a private copy of the state.

mod file;
mod memory;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::MutexGuard;

use contracts::{ContractError, StoreTransaction};
use tracing::debug;

/// Committed key/value state
pub(crate) type State = BTreeMap<String, String>;

/// Transaction over a mutex-guarded [`State`]
pub struct LockedTransaction<'a> {
    store: &'a str,
    guard: MutexGuard<'a, State>,
    working: State,
    dirty: bool,
    persist_to: Option<&'a Path>,
}

impl<'a> LockedTransaction<'a> {
    pub(crate) fn new(
        store: &'a str,
        guard: MutexGuard<'a, State>,
        persist_to: Option<&'a Path>,
    ) -> Self {
        let working = guard.clone();
        Self {
            store,
            guard,
            working,
            dirty: false,
            persist_to,
        }
    }
}

impl StoreTransaction for LockedTransaction<'_> {
    fn get(&self, key: &str) -> Option<String> {
        self.working.get(key).cloned()
    }

    fn contains(&self, key: &str) -> bool {
        self.working.contains_key(key)
    }

    fn set(&mut self, key: &str, value: String) {
        self.working.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let previous = self.working.remove(key);
        self.dirty |= previous.is_some();
        previous
    }

    fn scan_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.working
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn commit(mut self) -> Result<(), ContractError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = self.persist_to {
            file::write_snapshot(path, &self.working)
                .map_err(|e| ContractError::store(self.store, e.to_string()))?;
        }
        *self.guard = std::mem::take(&mut self.working);
        debug!(store = %self.store, keys = self.guard.len(), "Transaction committed");
        Ok(())
    }
}
