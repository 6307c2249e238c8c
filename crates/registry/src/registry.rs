//! TopicRegistry - topic routing persisted in a PropertyStore

use std::collections::{BTreeMap, BTreeSet};

use contracts::{
    PropertyStore, StoreTransaction, TopicType, TopicsConfig, CDC_TOPIC_SEPARATOR,
    STREAMS_TOPIC_KEY,
};
use tracing::{debug, instrument};

use crate::{RegistryError, Result};

/// Topic -> type registry
///
/// Layout in the store:
/// - `streams.sink.topic.cypher.<topic>` holds one query template
/// - each CDC type's persistence key holds its member topics joined by `;`
///
/// The layout never leaves this module; callers only see topics and types.
#[derive(Debug)]
pub struct TopicRegistry<S> {
    store: S,
}

impl<S: PropertyStore> TopicRegistry<S> {
    /// Create a registry over a store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether mutations are currently applied
    pub fn is_writable(&self) -> bool {
        self.store.is_writable()
    }

    // ===== Cypher templates =====

    /// Register (or replace) the query template of a topic
    ///
    /// The topic leaves any CDC set it belonged to.
    #[instrument(name = "registry_set_cypher_template", skip(self, query), fields(store = %self.store.name()))]
    pub fn set_cypher_template(&self, topic: &str, query: &str) -> Result<()> {
        if !self.writable("set_cypher_template") {
            return Ok(());
        }
        validate_topic(topic)?;
        self.mutate("set_cypher_template", |tx| {
            release_topic(tx, topic, Some(TopicType::Cypher));
            tx.set(&cypher_key(topic), query.to_string());
            true
        })
    }

    /// Remove the query template of a topic; unknown topics are a no-op
    #[instrument(name = "registry_remove_cypher_template", skip(self), fields(store = %self.store.name()))]
    pub fn remove_cypher_template(&self, topic: &str) -> Result<()> {
        self.mutate("remove_cypher_template", |tx| {
            if tx.remove(&cypher_key(topic)).is_none() {
                debug!(topic, "No query registered for topic");
                return false;
            }
            true
        })
    }

    /// Register several templates, one transaction each
    ///
    /// Stops at the first failure; entries applied before it stay applied.
    pub fn set_all_cypher_templates<I, K, V>(&self, templates: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (topic, query) in templates {
            self.set_cypher_template(topic.as_ref(), query.as_ref())?;
        }
        Ok(())
    }

    /// Query template of a topic
    pub fn get_cypher_template(&self, topic: &str) -> Result<Option<String>> {
        self.read(|tx| {
            let template = tx.get(&cypher_key(topic));
            if template.is_none() {
                debug!(topic, "No query registered for topic");
            }
            template
        })
    }

    /// Every registered template, keyed by topic
    pub fn get_all_cypher_templates(&self) -> Result<BTreeMap<String, String>> {
        self.read(|tx| templates_in(tx))
    }

    // ===== CDC topic sets =====

    /// Replace the member set of a CDC type
    ///
    /// Silently ignored when `topics` is empty or `topic_type` is not CDC.
    /// New members leave whatever type they were registered under before.
    #[instrument(name = "registry_set_cdc_topics", skip(self, topics), fields(store = %self.store.name()))]
    pub fn set_cdc_topics<I, T>(&self, topic_type: TopicType, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let topics: BTreeSet<String> = topics.into_iter().map(Into::into).collect();
        if !topic_type.is_cdc() || topics.is_empty() {
            debug!(%topic_type, count = topics.len(), "Ignoring CDC topic set");
            return Ok(());
        }
        if !self.writable("set_cdc_topics") {
            return Ok(());
        }
        for topic in &topics {
            validate_topic(topic)?;
        }

        self.mutate("set_cdc_topics", |tx| {
            for topic in &topics {
                release_topic(tx, topic, Some(topic_type));
            }
            write_cdc_set(tx, topic_type, &topics);
            true
        })
    }

    /// Add one topic to the member set of a CDC type
    #[instrument(name = "registry_add_cdc_topic", skip(self), fields(store = %self.store.name()))]
    pub fn add_cdc_topic(&self, topic_type: TopicType, topic: &str) -> Result<()> {
        if !topic_type.is_cdc() {
            debug!(%topic_type, "Not a CDC topic type");
            return Ok(());
        }
        if !self.writable("add_cdc_topic") {
            return Ok(());
        }
        validate_topic(topic)?;

        self.mutate("add_cdc_topic", |tx| {
            let released = release_topic(tx, topic, Some(topic_type));
            let mut members = read_cdc_set(tx, topic_type);
            let inserted = members.insert(topic.to_string());
            if inserted {
                write_cdc_set(tx, topic_type, &members);
            }
            released || inserted
        })
    }

    /// Remove one topic from the member set of a CDC type
    #[instrument(name = "registry_remove_cdc_topic", skip(self), fields(store = %self.store.name()))]
    pub fn remove_cdc_topic(&self, topic_type: TopicType, topic: &str) -> Result<()> {
        if !topic_type.is_cdc() {
            debug!(%topic_type, "Not a CDC topic type");
            return Ok(());
        }

        self.mutate("remove_cdc_topic", |tx| {
            let mut members = read_cdc_set(tx, topic_type);
            if !members.remove(topic) {
                debug!(topic, %topic_type, "Topic not in CDC set");
                return false;
            }
            write_cdc_set(tx, topic_type, &members);
            true
        })
    }

    /// Every CDC type with its members; types without members map to an empty set
    pub fn get_all_cdc_topics(&self) -> Result<BTreeMap<TopicType, BTreeSet<String>>> {
        self.read(|tx| {
            TopicType::cdc_types()
                .map(|t| (t, read_cdc_set(tx, t)))
                .collect()
        })
    }

    // ===== Whole registry =====

    /// Drop every association of a topic, whatever its type
    #[instrument(name = "registry_remove_topic", skip(self), fields(store = %self.store.name()))]
    pub fn remove_topic(&self, topic: &str) -> Result<()> {
        self.mutate("remove_topic", |tx| {
            let released = release_topic(tx, topic, None);
            if !released {
                debug!(topic, "Topic not registered");
            }
            released
        })
    }

    /// Remove every registry key
    #[instrument(name = "registry_clear_all", skip(self), fields(store = %self.store.name()))]
    pub fn clear_all(&self) -> Result<()> {
        self.mutate("clear_all", |tx| {
            let entries = tx.scan_prefix(STREAMS_TOPIC_KEY);
            for (key, _) in &entries {
                tx.remove(key);
            }
            debug!(removed = entries.len(), "Registry cleared");
            !entries.is_empty()
        })
    }

    /// Type a topic is registered under
    ///
    /// CDC sets are searched first, then templates.
    pub fn get_topic_type(&self, topic: &str) -> Result<Option<TopicType>> {
        self.read(|tx| topic_type_in(tx, topic))
    }

    /// Every registered topic name
    pub fn get_all_topics(&self) -> Result<BTreeSet<String>> {
        self.read(|tx| snapshot_in(tx).all_topics())
    }

    /// Consistent export of the whole registry
    pub fn snapshot(&self) -> Result<TopicsConfig> {
        self.read(|tx| snapshot_in(tx))
    }

    /// Apply a configuration snapshot through the per-type setters
    ///
    /// Templates are applied first, then each CDC set.
    #[instrument(
        name = "registry_apply",
        skip(self, topics),
        fields(store = %self.store.name(), topics = topics.all_topics().len())
    )]
    pub fn apply(&self, topics: &TopicsConfig) -> Result<()> {
        self.set_all_cypher_templates(&topics.cypher)?;
        for topic_type in TopicType::cdc_types() {
            if let Some(members) = topics.cdc_topics(topic_type) {
                self.set_cdc_topics(topic_type, members)?;
            }
        }
        Ok(())
    }
}

impl<S: PropertyStore> TopicRegistry<S> {
    fn read<'s, R>(&'s self, f: impl FnOnce(&S::Transaction<'s>) -> R) -> Result<R> {
        let tx = self.store.begin()?;
        Ok(f(&tx))
    }

    /// Mutations against a store that is not writable are skipped before any
    /// argument is looked at
    fn writable(&self, operation: &str) -> bool {
        let writable = self.store.is_writable();
        if !writable {
            debug!(store = %self.store.name(), operation, "Store not writable, skipping");
        }
        writable
    }

    /// Run `f` in a write transaction, committing when it reports a change
    fn mutate<'s>(
        &'s self,
        operation: &str,
        f: impl FnOnce(&mut S::Transaction<'s>) -> bool,
    ) -> Result<()> {
        if !self.writable(operation) {
            return Ok(());
        }
        let mut tx = self.store.begin()?;
        if f(&mut tx) {
            tx.commit()?;
        }
        Ok(())
    }
}

fn validate_topic(topic: &str) -> Result<()> {
    if topic.is_empty() {
        return Err(RegistryError::invalid_topic_name(
            topic,
            "topic name cannot be empty",
        ));
    }
    if topic.contains(CDC_TOPIC_SEPARATOR) {
        return Err(RegistryError::invalid_topic_name(
            topic,
            format!("topic name cannot contain '{CDC_TOPIC_SEPARATOR}'"),
        ));
    }
    Ok(())
}

fn cypher_prefix() -> String {
    format!("{}.", TopicType::Cypher.persistence_key())
}

fn cypher_key(topic: &str) -> String {
    format!("{}{}", cypher_prefix(), topic)
}

fn decode_set(raw: &str) -> BTreeSet<String> {
    raw.split(CDC_TOPIC_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn encode_set(members: &BTreeSet<String>) -> String {
    let separator = CDC_TOPIC_SEPARATOR.to_string();
    members
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&separator)
}

fn read_cdc_set<T: StoreTransaction>(tx: &T, topic_type: TopicType) -> BTreeSet<String> {
    tx.get(topic_type.persistence_key())
        .map(|raw| decode_set(&raw))
        .unwrap_or_default()
}

fn write_cdc_set<T: StoreTransaction>(tx: &mut T, topic_type: TopicType, members: &BTreeSet<String>) {
    if members.is_empty() {
        tx.remove(topic_type.persistence_key());
    } else {
        tx.set(topic_type.persistence_key(), encode_set(members));
    }
}

/// Remove every association of `topic` except the one under `keep`
fn release_topic<T: StoreTransaction>(tx: &mut T, topic: &str, keep: Option<TopicType>) -> bool {
    let mut released = false;

    if keep != Some(TopicType::Cypher) && tx.remove(&cypher_key(topic)).is_some() {
        debug!(topic, previous = %TopicType::Cypher, "Topic released from previous type");
        released = true;
    }

    for topic_type in TopicType::cdc_types().filter(|t| Some(*t) != keep) {
        let mut members = read_cdc_set(tx, topic_type);
        if members.remove(topic) {
            write_cdc_set(tx, topic_type, &members);
            debug!(topic, previous = %topic_type, "Topic released from previous type");
            released = true;
        }
    }

    released
}

fn templates_in<T: StoreTransaction>(tx: &T) -> BTreeMap<String, String> {
    let prefix = cypher_prefix();
    tx.scan_prefix(&prefix)
        .into_iter()
        .map(|(key, query)| (key[prefix.len()..].to_string(), query))
        .collect()
}

fn topic_type_in<T: StoreTransaction>(tx: &T, topic: &str) -> Option<TopicType> {
    TopicType::cdc_types()
        .find(|t| read_cdc_set(tx, *t).contains(topic))
        .or_else(|| {
            tx.contains(&cypher_key(topic))
                .then_some(TopicType::Cypher)
        })
}

fn snapshot_in<T: StoreTransaction>(tx: &T) -> TopicsConfig {
    TopicsConfig {
        cypher: templates_in(tx),
        cdc_source_id: read_cdc_set(tx, TopicType::CdcSourceId),
        cdc_schema: read_cdc_set(tx, TopicType::CdcSchema),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    const TEMPLATE: &str = "UNWIND $events AS e MERGE (:T{id:e.id})";

    fn registry() -> TopicRegistry<MemoryStore> {
        TopicRegistry::new(MemoryStore::new("test"))
    }

    #[test]
    fn test_set_cypher_template_is_idempotent() {
        let registry = registry();
        registry.set_cypher_template("t1", TEMPLATE).unwrap();
        registry.set_cypher_template("t1", TEMPLATE).unwrap();

        assert_eq!(
            registry.get_cypher_template("t1").unwrap().as_deref(),
            Some(TEMPLATE)
        );
        assert_eq!(registry.get_all_cypher_templates().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_unknown_template_is_noop() {
        let registry = registry();
        registry.remove_cypher_template("never-set").unwrap();
        assert!(registry.get_all_topics().unwrap().is_empty());
    }

    #[test]
    fn test_remove_template() {
        let registry = registry();
        registry.set_cypher_template("t1", TEMPLATE).unwrap();
        registry.remove_cypher_template("t1").unwrap();
        assert_eq!(registry.get_cypher_template("t1").unwrap(), None);
        assert_eq!(registry.get_topic_type("t1").unwrap(), None);
    }

    #[test]
    fn test_topic_type_resolution() {
        let registry = registry();
        registry
            .set_cdc_topics(TopicType::CdcSourceId, ["cdc-topic"])
            .unwrap();
        registry.set_cypher_template("cypher-topic", TEMPLATE).unwrap();

        assert_eq!(
            registry.get_topic_type("cdc-topic").unwrap(),
            Some(TopicType::CdcSourceId)
        );
        assert_eq!(
            registry.get_topic_type("cypher-topic").unwrap(),
            Some(TopicType::Cypher)
        );
        assert_eq!(registry.get_topic_type("unregistered").unwrap(), None);
    }

    #[test]
    fn test_cdc_set_round_trip() {
        let registry = registry();
        registry
            .set_cdc_topics(TopicType::CdcSchema, ["c", "a", "b"])
            .unwrap();

        let expected: BTreeSet<String> = ["a", "b", "c"].into_iter().map(String::from).collect();
        let all = registry.get_all_cdc_topics().unwrap();
        assert_eq!(all[&TopicType::CdcSchema], expected);
        assert!(all[&TopicType::CdcSourceId].is_empty());
    }

    #[test]
    fn test_set_cdc_topics_replaces_wholesale() {
        let registry = registry();
        registry
            .set_cdc_topics(TopicType::CdcSchema, ["a", "b"])
            .unwrap();
        registry.set_cdc_topics(TopicType::CdcSchema, ["c"]).unwrap();

        assert_eq!(registry.get_topic_type("a").unwrap(), None);
        assert_eq!(
            registry.get_topic_type("c").unwrap(),
            Some(TopicType::CdcSchema)
        );
    }

    #[test]
    fn test_set_cdc_topics_guards() {
        let registry = registry();
        registry
            .set_cdc_topics(TopicType::CdcSchema, ["a"])
            .unwrap();

        // empty set keeps the previous members
        registry
            .set_cdc_topics(TopicType::CdcSchema, Vec::<String>::new())
            .unwrap();
        // non-CDC type is ignored
        registry.set_cdc_topics(TopicType::Cypher, ["b"]).unwrap();

        assert_eq!(
            registry.get_topic_type("a").unwrap(),
            Some(TopicType::CdcSchema)
        );
        assert_eq!(registry.get_topic_type("b").unwrap(), None);
    }

    #[test]
    fn test_add_and_remove_cdc_topic() {
        let registry = registry();
        registry.add_cdc_topic(TopicType::CdcSourceId, "a").unwrap();
        registry.add_cdc_topic(TopicType::CdcSourceId, "b").unwrap();
        registry.add_cdc_topic(TopicType::CdcSourceId, "a").unwrap();
        registry.add_cdc_topic(TopicType::Cypher, "ignored").unwrap();

        let all = registry.get_all_cdc_topics().unwrap();
        assert_eq!(all[&TopicType::CdcSourceId].len(), 2);
        assert_eq!(registry.get_topic_type("ignored").unwrap(), None);

        registry.remove_cdc_topic(TopicType::CdcSourceId, "a").unwrap();
        registry.remove_cdc_topic(TopicType::CdcSourceId, "zzz").unwrap();
        assert_eq!(
            registry.get_all_topics().unwrap(),
            BTreeSet::from(["b".to_string()])
        );
    }

    #[test]
    fn test_registering_moves_topic_between_types() {
        let registry = registry();
        registry.set_cypher_template("t", TEMPLATE).unwrap();
        registry.add_cdc_topic(TopicType::CdcSchema, "t").unwrap();

        assert_eq!(registry.get_cypher_template("t").unwrap(), None);
        assert_eq!(
            registry.get_topic_type("t").unwrap(),
            Some(TopicType::CdcSchema)
        );

        registry
            .set_cdc_topics(TopicType::CdcSourceId, ["t", "u"])
            .unwrap();
        let all = registry.get_all_cdc_topics().unwrap();
        assert!(all[&TopicType::CdcSchema].is_empty());
        assert_eq!(all[&TopicType::CdcSourceId].len(), 2);

        registry.set_cypher_template("u", TEMPLATE).unwrap();
        assert_eq!(
            registry.get_all_cdc_topics().unwrap()[&TopicType::CdcSourceId],
            BTreeSet::from(["t".to_string()])
        );
        assert_eq!(registry.get_topic_type("u").unwrap(), Some(TopicType::Cypher));
    }

    #[test]
    fn test_invalid_topic_names_are_rejected() {
        let registry = registry();
        let err = registry.add_cdc_topic(TopicType::CdcSchema, "a;b").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTopicName { .. }));
        assert!(registry.set_cypher_template("", TEMPLATE).is_err());
        assert!(registry.get_all_topics().unwrap().is_empty());
    }

    #[test]
    fn test_read_only_store_ignores_mutations() {
        let registry = TopicRegistry::new(MemoryStore::read_only("replica"));
        assert!(!registry.is_writable());

        registry.set_cypher_template("t1", TEMPLATE).unwrap();
        registry.add_cdc_topic(TopicType::CdcSchema, "t2").unwrap();
        registry.set_cdc_topics(TopicType::CdcSourceId, ["t3"]).unwrap();

        assert!(registry.get_all_topics().unwrap().is_empty());

        registry.store().set_writable(true);
        registry.set_cypher_template("t1", TEMPLATE).unwrap();
        assert_eq!(registry.get_topic_type("t1").unwrap(), Some(TopicType::Cypher));
    }

    #[test]
    fn test_read_only_store_skips_name_checks() {
        let registry = TopicRegistry::new(MemoryStore::read_only("replica"));

        registry.add_cdc_topic(TopicType::CdcSchema, "a;b").unwrap();
        registry.set_cypher_template("", TEMPLATE).unwrap();
        registry.set_cdc_topics(TopicType::CdcSourceId, ["ok", "x;y"]).unwrap();
        registry
            .set_all_cypher_templates([("", TEMPLATE), ("a;b", TEMPLATE)])
            .unwrap();

        assert!(registry.get_all_topics().unwrap().is_empty());
    }

    #[test]
    fn test_set_all_cypher_templates_stops_at_first_invalid_entry() {
        let registry = registry();
        let templates = vec![
            ("first", "UNWIND $events AS e MERGE (:A{id:e.id})"),
            ("bad;name", TEMPLATE),
            ("third", "UNWIND $events AS e MERGE (:C{id:e.id})"),
        ];

        let err = registry.set_all_cypher_templates(templates).unwrap_err();
        assert!(
            matches!(err, RegistryError::InvalidTopicName { ref topic, .. } if topic == "bad;name"),
            "got: {err}"
        );

        assert_eq!(
            registry.get_cypher_template("first").unwrap().as_deref(),
            Some("UNWIND $events AS e MERGE (:A{id:e.id})")
        );
        assert_eq!(registry.get_cypher_template("third").unwrap(), None);
        assert_eq!(
            registry.get_all_topics().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["first".to_string()]
        );
    }

    #[test]
    fn test_clear_all() {
        let registry = registry();
        registry.set_cypher_template("t1", TEMPLATE).unwrap();
        registry.add_cdc_topic(TopicType::CdcSchema, "t2").unwrap();
        registry.clear_all().unwrap();
        assert!(registry.get_all_topics().unwrap().is_empty());
        assert!(registry.snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_remove_topic() {
        let registry = registry();
        registry.add_cdc_topic(TopicType::CdcSchema, "t").unwrap();
        registry.remove_topic("t").unwrap();
        registry.remove_topic("t").unwrap();
        assert_eq!(registry.get_topic_type("t").unwrap(), None);
    }

    #[test]
    fn test_apply_and_snapshot() {
        let registry = registry();
        let mut config = TopicsConfig::default();
        config.cypher.insert("orders".into(), TEMPLATE.into());
        config.cypher.insert("items".into(), TEMPLATE.into());
        config.cdc_source_id.insert("users".into());
        config.cdc_schema.insert("accounts".into());

        registry.apply(&config).unwrap();

        assert_eq!(registry.snapshot().unwrap(), config);
        assert_eq!(registry.get_all_topics().unwrap(), config.all_topics());
    }

    #[test]
    fn test_prefix_does_not_leak_between_types() {
        let registry = registry();
        registry
            .set_cdc_topics(TopicType::CdcSourceId, ["a"])
            .unwrap();
        // CDC keys share the namespace but are not templates
        assert!(registry.get_all_cypher_templates().unwrap().is_empty());
    }
}
