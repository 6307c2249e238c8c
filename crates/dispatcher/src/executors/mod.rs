//! Executor implementations
//!
//! Contains LogExecutor and FileExecutor, plus the configuration-selected
//! [`ConfiguredExecutor`].

mod file;
mod log;

pub use self::file::FileExecutor;
pub use self::log::LogExecutor;

use contracts::{ContractError, ExecutorConfig, ExecutorKind, WriteExecutor, WriteOperation};
use tracing::instrument;

use crate::error::DispatcherError;

/// Executor chosen by an [`ExecutorConfig`]
pub enum ConfiguredExecutor {
    Log(LogExecutor),
    File(FileExecutor),
}

impl ConfiguredExecutor {
    /// Create the executor described by `config`
    #[instrument(
        name = "dispatcher_create_executor",
        skip(config),
        fields(executor = %config.name, kind = ?config.kind)
    )]
    pub fn from_config(config: &ExecutorConfig) -> Result<Self, DispatcherError> {
        match config.kind {
            ExecutorKind::Log => Ok(Self::Log(LogExecutor::new(&config.name))),
            ExecutorKind::File => {
                let path = config.path.as_ref().ok_or_else(|| {
                    DispatcherError::executor_creation(&config.name, "file executor requires a path")
                })?;
                let executor = FileExecutor::new(&config.name, path)
                    .map_err(|e| DispatcherError::executor_creation(&config.name, e.to_string()))?;
                Ok(Self::File(executor))
            }
        }
    }
}

impl WriteExecutor for ConfiguredExecutor {
    fn name(&self) -> &str {
        match self {
            Self::Log(e) => e.name(),
            Self::File(e) => e.name(),
        }
    }

    async fn write(&self, operation: &WriteOperation) -> Result<(), ContractError> {
        match self {
            Self::Log(e) => e.write(operation).await,
            Self::File(e) => e.write(operation).await,
        }
    }

    async fn flush(&self) -> Result<(), ContractError> {
        match self {
            Self::Log(e) => e.flush().await,
            Self::File(e) => e.flush().await,
        }
    }
}
