//! PropertyStore trait - transactional key/value backing for the topic registry

use crate::ContractError;

/// Transactional string key/value store
///
/// A transaction sees a consistent snapshot. Its writes become visible to
/// later transactions only once [`StoreTransaction::commit`] returns `Ok`;
/// dropping an uncommitted transaction discards them.
pub trait PropertyStore: Send + Sync {
    /// Transaction handle borrowed from the store
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Store name (used for logging)
    fn name(&self) -> &str;

    /// Whether this instance currently accepts writes
    ///
    /// Read replicas answer `false`; callers treat mutations as no-ops then.
    fn is_writable(&self) -> bool;

    /// Open a transaction
    ///
    /// # Errors
    /// Returns a store error when the backing state cannot be accessed
    fn begin(&self) -> Result<Self::Transaction<'_>, ContractError>;
}

/// Open transaction against a [`PropertyStore`]
pub trait StoreTransaction {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Whether a key is present
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value
    fn set(&mut self, key: &str, value: String);

    /// Remove a key, returning its previous value
    fn remove(&mut self, key: &str) -> Option<String>;

    /// Every `(key, value)` whose key starts with `prefix`, ordered by key
    fn scan_prefix(&self, prefix: &str) -> Vec<(String, String)>;

    /// Publish the transaction's writes
    ///
    /// # Errors
    /// Returns a store error if the writes could not be made durable; in that
    /// case none of them are visible.
    fn commit(self) -> Result<(), ContractError>;
}
