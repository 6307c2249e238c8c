//! # Ingestion
//!
//! Change event decoding and CDC ingestion strategies.
//!
//! Responsibilities:
//! - Decode raw batch entries into [`contracts::ChangeEvent`]s
//! - Turn a decoded batch into write operations, phase by phase
//! - Resolve the strategy serving a CDC topic type
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{IngestionPhase, IngestionStrategy, StrategyConfig, TopicType};
//! use ingestion::{decode_batch, CdcStrategy};
//!
//! let strategy = CdcStrategy::for_topic_type(TopicType::CdcSchema, &StrategyConfig::default())
//!     .expect("cdc type");
//! let events = decode_batch(&batch)?;
//! for phase in IngestionPhase::ORDER {
//!     for op in strategy.events_for_phase(phase, &events) {
//!         executor.write(&op).await?;
//!     }
//! }
//! ```

mod decode;
mod error;
mod strategies;

pub use decode::{decode_batch, decode_change_event, decode_change_event_slice};
pub use error::{IngestionError, Result};
pub use strategies::{CdcStrategy, SchemaIngestionStrategy, SourceIdIngestionStrategy};
