//! FileExecutor - appends write operations to a JSON lines file

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use contracts::{ContractError, WriteExecutor, WriteOperation};
use serde::Serialize;
use tracing::{debug, error, instrument};

/// One line of the output file
#[derive(Debug, Serialize)]
struct Record<'a> {
    timestamp: String,
    executor: &'a str,
    query: &'a str,
    events: &'a [serde_json::Value],
}

/// Executor that records every operation to disk
///
/// The output can be replayed against a graph database later.
pub struct FileExecutor {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileExecutor {
    /// Open (append) the output file, creating parent directories
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, operation: &WriteOperation) -> Result<(), ContractError> {
        let record = Record {
            timestamp: chrono::Utc::now().to_rfc3339(),
            executor: &self.name,
            query: &operation.query,
            events: &operation.events,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| ContractError::executor(&self.name, e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ContractError::executor(&self.name, "writer lock poisoned"))?;
        writeln!(writer, "{line}").map_err(|e| {
            error!(executor = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ContractError::executor(&self.name, e.to_string())
        })
    }

    fn flush_writer(&self) -> Result<(), ContractError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ContractError::executor(&self.name, "writer lock poisoned"))?;
        writer
            .flush()
            .map_err(|e| ContractError::executor(&self.name, e.to_string()))
    }
}

impl WriteExecutor for FileExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_executor_write",
        skip(self, operation),
        fields(executor = %self.name, rows = operation.len())
    )]
    async fn write(&self, operation: &WriteOperation) -> Result<(), ContractError> {
        self.append(operation)
    }

    #[instrument(name = "file_executor_flush", skip(self))]
    async fn flush(&self) -> Result<(), ContractError> {
        self.flush_writer()?;
        debug!(executor = %self.name, "FileExecutor flushed");
        Ok(())
    }
}
