//! IngestionStrategy trait - change events to graph write operations

use std::fmt;

use crate::{ChangeEvent, WriteOperation};

/// Extraction phase
///
/// Phases always execute in declaration order across a whole batch:
/// relationships need their nodes merged first. Node deletes run before the
/// relationship phases, so node delete queries must `DETACH DELETE` to drop
/// any relationships still attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IngestionPhase {
    MergeNodes,
    DeleteNodes,
    MergeRelationships,
    DeleteRelationships,
}

impl IngestionPhase {
    /// Every phase, in execution order
    pub const ORDER: [IngestionPhase; 4] = [
        IngestionPhase::MergeNodes,
        IngestionPhase::DeleteNodes,
        IngestionPhase::MergeRelationships,
        IngestionPhase::DeleteRelationships,
    ];

    /// Label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            IngestionPhase::MergeNodes => "merge_nodes",
            IngestionPhase::DeleteNodes => "delete_nodes",
            IngestionPhase::MergeRelationships => "merge_relationships",
            IngestionPhase::DeleteRelationships => "delete_relationships",
        }
    }
}

impl fmt::Display for IngestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-format transformation of a CDC batch
///
/// Implementations are pure: no I/O, no state. Each method sees the whole
/// batch and returns the operations of its phase, in the order they must run.
pub trait IngestionStrategy: Send + Sync {
    /// Node creations and updates
    fn merge_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation>;

    /// Node deletions
    fn delete_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation>;

    /// Relationship creations and updates
    fn merge_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation>;

    /// Relationship deletions
    fn delete_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation>;

    /// Operations of a single phase
    fn events_for_phase(&self, phase: IngestionPhase, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        match phase {
            IngestionPhase::MergeNodes => self.merge_node_events(events),
            IngestionPhase::DeleteNodes => self.delete_node_events(events),
            IngestionPhase::MergeRelationships => self.merge_relationship_events(events),
            IngestionPhase::DeleteRelationships => self.delete_relationship_events(events),
        }
    }
}
