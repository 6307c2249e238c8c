//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// A batch entry is not a valid change event
    #[error("failed to decode change event at batch index {index}: {message}")]
    Decode {
        /// Position of the entry in its batch
        index: usize,
        /// Decoder message
        message: String,
    },

    /// Raw bytes are not a valid change event
    #[error("failed to decode change event: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
