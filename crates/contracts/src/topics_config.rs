//! TopicsConfig - configuration snapshot of every registered topic

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::TopicType;

/// Topic configuration, one section per [`TopicType`]
///
/// Used both as the `[topics]` table of a configuration file and as the
/// registry's read-only export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Topic name -> query template
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cypher: BTreeMap<String, String>,

    /// Topics carrying source-id keyed CDC events
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cdc_source_id: BTreeSet<String>,

    /// Topics carrying schema keyed CDC events
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cdc_schema: BTreeSet<String>,
}

impl TopicsConfig {
    /// No topic configured at all
    pub fn is_empty(&self) -> bool {
        self.cypher.is_empty() && self.cdc_source_id.is_empty() && self.cdc_schema.is_empty()
    }

    /// Member set of a CDC type, `None` for non-CDC types
    pub fn cdc_topics(&self, topic_type: TopicType) -> Option<&BTreeSet<String>> {
        match topic_type {
            TopicType::CdcSourceId => Some(&self.cdc_source_id),
            TopicType::CdcSchema => Some(&self.cdc_schema),
            TopicType::Cypher => None,
        }
    }

    /// Mutable member set of a CDC type
    pub fn cdc_topics_mut(&mut self, topic_type: TopicType) -> Option<&mut BTreeSet<String>> {
        match topic_type {
            TopicType::CdcSourceId => Some(&mut self.cdc_source_id),
            TopicType::CdcSchema => Some(&mut self.cdc_schema),
            TopicType::Cypher => None,
        }
    }

    /// Union of every configured topic name
    pub fn all_topics(&self) -> BTreeSet<String> {
        self.cypher
            .keys()
            .chain(self.cdc_source_id.iter())
            .chain(self.cdc_schema.iter())
            .cloned()
            .collect()
    }

    /// Types a topic is configured under, in lookup order (CDC first)
    pub fn types_of(&self, topic: &str) -> Vec<TopicType> {
        let mut types: Vec<TopicType> = TopicType::cdc_types()
            .filter(|t| self.cdc_topics(*t).is_some_and(|set| set.contains(topic)))
            .collect();
        if self.cypher.contains_key(topic) {
            types.push(TopicType::Cypher);
        }
        types
    }

    /// Resolve a topic the way the registry does: CDC membership first, then templates
    pub fn topic_type(&self, topic: &str) -> Option<TopicType> {
        self.types_of(topic).into_iter().next()
    }

    /// Topics configured under more than one type
    pub fn conflicts(&self) -> BTreeMap<String, Vec<TopicType>> {
        self.all_topics()
            .into_iter()
            .filter_map(|topic| {
                let types = self.types_of(&topic);
                (types.len() > 1).then_some((topic, types))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TopicsConfig {
        let mut config = TopicsConfig::default();
        config
            .cypher
            .insert("orders".into(), "UNWIND $events AS e RETURN e".into());
        config.cdc_source_id.insert("users".into());
        config.cdc_schema.insert("accounts".into());
        config
    }

    #[test]
    fn test_topic_type_resolution() {
        let config = sample();
        assert_eq!(config.topic_type("orders"), Some(TopicType::Cypher));
        assert_eq!(config.topic_type("users"), Some(TopicType::CdcSourceId));
        assert_eq!(config.topic_type("accounts"), Some(TopicType::CdcSchema));
        assert_eq!(config.topic_type("missing"), None);
    }

    #[test]
    fn test_conflicts() {
        let mut config = sample();
        assert!(config.conflicts().is_empty());

        config.cdc_schema.insert("orders".into());
        let conflicts = config.conflicts();
        assert_eq!(
            conflicts.get("orders"),
            Some(&vec![TopicType::CdcSchema, TopicType::Cypher])
        );
        // CDC membership wins during lookup
        assert_eq!(config.topic_type("orders"), Some(TopicType::CdcSchema));
    }

    #[test]
    fn test_all_topics() {
        let topics = sample().all_topics();
        assert_eq!(topics.len(), 3);
        assert!(topics.contains("users"));
    }
}
