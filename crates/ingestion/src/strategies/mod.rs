//! Ingestion strategies, one per CDC topic type

mod common;
mod schema;
mod source_id;

use contracts::{ChangeEvent, IngestionStrategy, StrategyConfig, TopicType, WriteOperation};

pub use schema::SchemaIngestionStrategy;
pub use source_id::SourceIdIngestionStrategy;

/// Closed set of CDC strategies
///
/// Resolved once per topic type, so dispatch never needs to inspect a
/// strategy's concrete type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdcStrategy {
    SourceId(SourceIdIngestionStrategy),
    Schema(SchemaIngestionStrategy),
}

impl CdcStrategy {
    /// Strategy handling `topic_type`, `None` for non-CDC types
    pub fn for_topic_type(topic_type: TopicType, config: &StrategyConfig) -> Option<Self> {
        match topic_type {
            TopicType::CdcSourceId => Some(CdcStrategy::SourceId(
                SourceIdIngestionStrategy::new(&config.source_id),
            )),
            TopicType::CdcSchema => Some(CdcStrategy::Schema(SchemaIngestionStrategy)),
            TopicType::Cypher => None,
        }
    }

    /// Topic type served by this strategy
    pub fn topic_type(&self) -> TopicType {
        match self {
            CdcStrategy::SourceId(_) => TopicType::CdcSourceId,
            CdcStrategy::Schema(_) => TopicType::CdcSchema,
        }
    }

    fn inner(&self) -> &dyn IngestionStrategy {
        match self {
            CdcStrategy::SourceId(s) => s,
            CdcStrategy::Schema(s) => s,
        }
    }
}

impl IngestionStrategy for CdcStrategy {
    fn merge_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        self.inner().merge_node_events(events)
    }

    fn delete_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        self.inner().delete_node_events(events)
    }

    fn merge_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        self.inner().merge_relationship_events(events)
    }

    fn delete_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        self.inner().delete_relationship_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_topic_type() {
        let config = StrategyConfig::default();
        for topic_type in TopicType::ALL {
            let strategy = CdcStrategy::for_topic_type(topic_type, &config);
            assert_eq!(strategy.is_some(), topic_type.is_cdc());
            if let Some(strategy) = strategy {
                assert_eq!(strategy.topic_type(), topic_type);
            }
        }
    }
}
