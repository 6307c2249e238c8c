//! TopicType - how a topic's batches are handled

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Common prefix of every persisted topic key
pub const STREAMS_TOPIC_KEY: &str = "streams.sink.topic";

/// Prefix shared by the CDC topic keys
pub const STREAMS_TOPIC_CDC_KEY: &str = "streams.sink.topic.cdc";

/// Separator used when a set of topic names is stored as one string
pub const CDC_TOPIC_SEPARATOR: char = ';';

/// Handling family of a topic type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicTypeGroup {
    /// One query template applied to the whole batch
    Cypher,
    /// Change events run through an ingestion strategy
    Cdc,
}

/// Topic handling mode
///
/// The set is closed: a new CDC convention means a new variant here and a new
/// strategy in `ingestion`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicType {
    /// CDC events keyed by the source database's internal ids
    CdcSourceId,
    /// Templated query per topic
    Cypher,
    /// CDC events keyed by the unique constraints carried in their schema
    CdcSchema,
}

impl TopicType {
    /// Every variant, in lookup order
    pub const ALL: [TopicType; 3] = [
        TopicType::CdcSourceId,
        TopicType::Cypher,
        TopicType::CdcSchema,
    ];

    /// Group this type belongs to
    pub fn group(self) -> TopicTypeGroup {
        match self {
            TopicType::Cypher => TopicTypeGroup::Cypher,
            TopicType::CdcSourceId | TopicType::CdcSchema => TopicTypeGroup::Cdc,
        }
    }

    /// Whether this type is handled by an ingestion strategy
    pub fn is_cdc(self) -> bool {
        self.group() == TopicTypeGroup::Cdc
    }

    /// Stable, namespaced key under which this type's configuration is persisted
    pub fn persistence_key(self) -> &'static str {
        match self {
            TopicType::CdcSourceId => "streams.sink.topic.cdc.sourceId",
            TopicType::Cypher => "streams.sink.topic.cypher",
            TopicType::CdcSchema => "streams.sink.topic.cdc.schema",
        }
    }

    /// CDC variants only
    pub fn cdc_types() -> impl Iterator<Item = TopicType> {
        Self::ALL.into_iter().filter(|t| t.is_cdc())
    }

    /// Short name used in configuration files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            TopicType::CdcSourceId => "cdc_source_id",
            TopicType::Cypher => "cypher",
            TopicType::CdcSchema => "cdc_schema",
        }
    }
}

impl fmt::Display for TopicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TopicType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cdc_source_id" | "cdc_sourceid" | "source_id" | "sourceid" => {
                Ok(TopicType::CdcSourceId)
            }
            "cypher" => Ok(TopicType::Cypher),
            "cdc_schema" | "schema" => Ok(TopicType::CdcSchema),
            other => Err(format!("unknown topic type: {other}")),
        }
    }
}
