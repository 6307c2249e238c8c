//! FileStore - PropertyStore persisted as a JSON snapshot file

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use contracts::{ContractError, PropertyStore};
use tracing::{debug, info, instrument};

use super::{LockedTransaction, State};

/// Store whose committed state survives restarts
///
/// Every commit rewrites the snapshot through a temporary file followed by a
/// rename, so a crash leaves either the old or the new snapshot on disk.
#[derive(Debug)]
pub struct FileStore {
    name: String,
    path: PathBuf,
    writable: AtomicBool,
    state: Mutex<State>,
}

impl FileStore {
    /// Open the snapshot at `path`, starting empty if it does not exist
    #[instrument(name = "file_store_open", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let state = if path.exists() {
            read_snapshot(&path).map_err(|e| ContractError::store(&name, e.to_string()))?
        } else {
            debug!(store = %name, "No snapshot yet, starting empty");
            State::new()
        };

        info!(store = %name, keys = state.len(), "FileStore opened");

        Ok(Self {
            name,
            path,
            writable: AtomicBool::new(true),
            state: Mutex::new(state),
        })
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flip the writable capability
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::Release);
    }
}

impl PropertyStore for FileStore {
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
        Ok(LockedTransaction::new(&self.name, guard, Some(&self.path)))
    }
}

fn read_snapshot(path: &Path) -> io::Result<State> {
    let file = File::open(path)?;
    serde_json::from_reader(file).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub(super) fn write_snapshot(path: &Path, state: &State) -> io::Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = File::create(&tmp_path)?;
    serde_json::to_writer_pretty(&mut file, state)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    file.write_all(b"\n")?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::StoreTransaction;
    use tempfile::tempdir;

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");

        {
            let store = FileStore::open("test", &path).unwrap();
            let mut tx = store.begin().unwrap();
            tx.set("k", "v".into());
            tx.commit().unwrap();
        }

        let store = FileStore::open("test", &path).unwrap();
        let tx = store.begin().unwrap();
        assert_eq!(tx.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_clean_commit_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("registry.json");

        let store = FileStore::open("test", &path).unwrap();
        let tx = store.begin().unwrap();
        assert_eq!(tx.get("k"), None);
        tx.commit().unwrap();

        // clean transactions never touch the disk
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_snapshot_is_a_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open("test", &path).unwrap_err();
        assert!(matches!(err, ContractError::Store { .. }));
    }
}
