//! WriteOperation - unit of work handed to the write executor

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A query plus the batch of parameter maps it is applied to
///
/// Queries read the batch through the `$events` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOperation {
    pub query: String,
    pub events: Vec<Value>,
}

impl WriteOperation {
    /// Create a write operation
    pub fn new(query: impl Into<String>, events: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            events,
        }
    }

    /// Number of parameter rows
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No parameter rows
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
