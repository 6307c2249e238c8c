//! WriteExecutor trait - Dispatcher output interface
//!
//! Defines the abstract interface for query execution against the graph store.

use crate::{ContractError, WriteOperation};

/// Write execution trait
///
/// The dispatcher never runs queries itself; the embedding system supplies an
/// executor. Timeouts and retries are the executor's business.
#[trait_variant::make(WriteExecutor: Send)]
pub trait LocalWriteExecutor {
    /// Executor name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Execute one query with its batch of parameters
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&self, operation: &WriteOperation) -> Result<(), ContractError>;

    /// Flush buffered writes (if any)
    async fn flush(&self) -> Result<(), ContractError>;
}
