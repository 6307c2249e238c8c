//! # Contracts
//!
//! Frozen interface contracts shared by every sink crate.
//! Business crates depend only on this crate, never on each other in reverse.
//!
//! ## Data flow
//! - A topic name resolves to a [`TopicType`] through the registry
//! - CDC batches decode into [`ChangeEvent`]s and run through an [`IngestionStrategy`]
//! - Every resulting [`WriteOperation`] is handed to a [`WriteExecutor`]

mod blueprint;
mod error;
mod event;
mod executor;
mod store;
mod strategy;
mod topic;
mod topics_config;
mod write;

pub use blueprint::*;
pub use error::*;
pub use event::*;
pub use executor::*;
pub use store::{PropertyStore, StoreTransaction};
pub use strategy::{IngestionPhase, IngestionStrategy};
pub use topic::*;
pub use topics_config::TopicsConfig;
pub use write::WriteOperation;
