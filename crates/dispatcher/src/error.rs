//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Executor creation error
    #[error("failed to create executor '{name}': {message}")]
    ExecutorCreation { name: String, message: String },

    /// Topic lookup failed (from registry)
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),

    /// Batch could not be decoded
    #[error("ingestion error: {0}")]
    Ingestion(#[from] ingestion::IngestionError),

    /// Executor write error (from contract)
    #[error("executor error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create an executor creation error
    pub fn executor_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutorCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
