//! LogExecutor - logs write operations via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ContractError, WriteExecutor, WriteOperation};
use tracing::{debug, info, instrument};

/// Executor that logs operations instead of running them
///
/// Useful for dry runs and debugging topic routing.
#[derive(Debug)]
pub struct LogExecutor {
    name: String,
    writes: AtomicU64,
}

impl LogExecutor {
    /// Create a new LogExecutor with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writes: AtomicU64::new(0),
        }
    }

    /// Operations logged so far
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn log_operation(&self, operation: &WriteOperation) {
        let head = operation.query.lines().nth(1).unwrap_or(&operation.query);
        info!(
            executor = %self.name,
            rows = operation.len(),
            query = head,
            "WriteOperation received"
        );
        debug!(executor = %self.name, query = %operation.query, "Full query");
    }
}

impl WriteExecutor for LogExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_executor_write",
        skip(self, operation),
        fields(executor = %self.name, rows = operation.len())
    )]
    async fn write(&self, operation: &WriteOperation) -> Result<(), ContractError> {
        self.log_operation(operation);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    #[instrument(name = "log_executor_flush", skip(self))]
    async fn flush(&self) -> Result<(), ContractError> {
        // Nothing buffered
        Ok(())
    }
}
