//! Registry error types

use thiserror::Error;

/// Registry-specific errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Topic name cannot be stored
    #[error("invalid topic name '{topic}': {reason}")]
    InvalidTopicName { topic: String, reason: String },

    /// Store transaction failed (from contract)
    #[error("store error: {0}")]
    Store(#[from] contracts::ContractError),
}

impl RegistryError {
    /// Create an invalid topic name error
    pub fn invalid_topic_name(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTopicName {
            topic: topic.into(),
            reason: reason.into(),
        }
    }
}
