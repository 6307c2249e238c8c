//! SinkBlueprint - Config Loader output
//!
//! Describes the whole sink: registry store, topic routing, strategy settings, executor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::TopicsConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete sink configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SinkBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Registry backing store
    #[serde(default)]
    #[validate(nested)]
    pub store: StoreConfig,

    /// Topic routing, applied to the registry on startup
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Ingestion strategy settings
    #[serde(default)]
    #[validate(nested)]
    pub strategies: StrategyConfig,

    /// Write executor
    #[serde(default)]
    #[validate(nested)]
    pub executor: ExecutorConfig,
}

/// Registry store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Store name (used for logging)
    #[serde(default = "default_store_name")]
    #[validate(length(min = 1, message = "store name cannot be empty"))]
    pub name: String,

    /// Store kind
    #[serde(default)]
    pub kind: StoreKind,

    /// Snapshot file, required for `file`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Open as a read replica: every registry mutation becomes a no-op
    #[serde(default)]
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            kind: StoreKind::default(),
            path: None,
            read_only: false,
        }
    }
}

fn default_store_name() -> String {
    "registry".to_string()
}

/// Store kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Process-local, lost on exit
    #[default]
    Memory,
    /// JSON snapshot file, survives restarts
    File,
}

/// Strategy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StrategyConfig {
    #[serde(default)]
    #[validate(nested)]
    pub source_id: SourceIdStrategyConfig,
}

/// Settings of the source-id strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SourceIdStrategyConfig {
    /// Label put on every node written by the strategy
    #[serde(default = "default_label_name")]
    #[validate(length(min = 1, message = "label_name cannot be empty"))]
    pub label_name: String,

    /// Property holding the source id
    #[serde(default = "default_id_name")]
    #[validate(length(min = 1, message = "id_name cannot be empty"))]
    pub id_name: String,
}

impl Default for SourceIdStrategyConfig {
    fn default() -> Self {
        Self {
            label_name: default_label_name(),
            id_name: default_id_name(),
        }
    }
}

fn default_label_name() -> String {
    "SourceEvent".to_string()
}

fn default_id_name() -> String {
    "sourceId".to_string()
}

/// Write executor configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExecutorConfig {
    /// Executor name (used for logging/metrics)
    #[serde(default = "default_executor_name")]
    #[validate(length(min = 1, message = "executor name cannot be empty"))]
    pub name: String,

    /// Executor kind
    #[serde(default)]
    pub kind: ExecutorKind,

    /// Output file, required for `file`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: default_executor_name(),
            kind: ExecutorKind::default(),
            path: None,
        }
    }
}

fn default_executor_name() -> String {
    "graph".to_string()
}

/// Executor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorKind {
    /// Log every operation through tracing
    #[default]
    Log,
    /// Append every operation to a JSON lines file
    File,
}
