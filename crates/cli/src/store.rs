//! Registry store selection from configuration.

use contracts::{StoreConfig, StoreKind};
use registry::{FileStore, MemoryStore};
use tracing::{info, warn};

use crate::error::{CliError, Result};

/// Store chosen by `[store]`
///
/// The registry is generic over its store, so commands match on this and
/// run the same generic body for either kind.
pub enum OpenedStore {
    Memory(MemoryStore),
    File(FileStore),
}

/// Open the configured store, honoring `read_only`
pub fn open_store(config: &StoreConfig) -> Result<OpenedStore> {
    let store = match config.kind {
        StoreKind::Memory => {
            warn!(store = %config.name, "Memory store: registry changes end with this process");
            if config.read_only {
                OpenedStore::Memory(MemoryStore::read_only(&config.name))
            } else {
                OpenedStore::Memory(MemoryStore::new(&config.name))
            }
        }
        StoreKind::File => {
            let path = config
                .path
                .as_ref()
                .ok_or_else(|| CliError::invalid_argument("store.path", "file store requires a path"))?;
            let store = FileStore::open(&config.name, path)?;
            store.set_writable(!config.read_only);
            OpenedStore::File(store)
        }
    };

    info!(store = %config.name, kind = ?config.kind, read_only = config.read_only, "Registry store opened");
    Ok(store)
}
