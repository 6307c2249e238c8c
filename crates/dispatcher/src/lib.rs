//! # Dispatcher
//!
//! Sink-side batch dispatch.
//!
//! Responsibilities:
//! - Resolve the type of the topic a batch arrived on
//! - Pass cypher batches through their template as a single operation
//! - Run CDC batches through their strategy, phase by phase
//! - Hand every operation to a [`WriteExecutor`]

pub mod dispatcher;
pub mod error;
pub mod executors;
pub mod metrics;

pub use contracts::{WriteExecutor, WriteOperation};
pub use dispatcher::{DispatchOutcome, DispatcherBuilder, DropReason, SinkDispatcher};
pub use error::DispatcherError;
pub use executors::{ConfiguredExecutor, FileExecutor, LogExecutor};
pub use metrics::{DispatchMetrics, MetricsSnapshot};
