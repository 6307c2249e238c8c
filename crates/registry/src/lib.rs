//! # Registry
//!
//! Persisted topic routing registry.
//!
//! Responsibilities:
//! - Map topic names to a [`TopicType`] and its configuration
//! - Keep each topic under a single type (registering it elsewhere moves it)
//! - Reverse lookup for the dispatcher, snapshot export for tooling
//!
//! Every operation runs in its own store transaction. Mutations against a
//! store that is not writable are silent no-ops.

mod error;
mod registry;
mod store;

pub use contracts::{PropertyStore, TopicType, TopicsConfig};
pub use error::RegistryError;
pub use registry::TopicRegistry;
pub use store::{FileStore, LockedTransaction, MemoryStore};

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
