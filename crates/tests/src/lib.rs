//! # Integration Tests
//!
//! End-to-end flows across crates.
//!
//! Covers:
//! - Contract snapshot checks
//! - Registry persistence across restarts
//! - Configuration -> registry -> dispatcher -> executor

#[cfg(test)]
mod contract_tests {
    use contracts::{TopicType, STREAMS_TOPIC_KEY};

    #[test]
    fn test_persistence_keys_are_stable() {
        // Persisted registries depend on these exact keys
        assert_eq!(
            TopicType::CdcSourceId.persistence_key(),
            "streams.sink.topic.cdc.sourceId"
        );
        assert_eq!(TopicType::Cypher.persistence_key(), "streams.sink.topic.cypher");
        assert_eq!(
            TopicType::CdcSchema.persistence_key(),
            "streams.sink.topic.cdc.schema"
        );
        assert_eq!(STREAMS_TOPIC_KEY, "streams.sink.topic");
    }
}

#[cfg(test)]
mod registry_tests {
    use contracts::{PropertyStore, TopicType, TopicsConfig};
    use registry::{FileStore, TopicRegistry};

    #[test]
    fn test_file_registry_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("registry.json");

        let mut topics = TopicsConfig::default();
        topics
            .cypher
            .insert("people".into(), "UNWIND $events AS e MERGE (:P {id: e.id})".into());
        topics.cdc_source_id.insert("users".into());
        topics.cdc_schema.insert("catalog".into());

        {
            let registry = TopicRegistry::new(FileStore::open("registry", &path).unwrap());
            registry.apply(&topics).unwrap();
            // Moves `people` from cypher to the schema set
            registry.add_cdc_topic(TopicType::CdcSchema, "people").unwrap();
        }

        let registry = TopicRegistry::new(FileStore::open("registry", &path).unwrap());
        assert_eq!(
            registry.get_topic_type("people").unwrap(),
            Some(TopicType::CdcSchema)
        );
        assert_eq!(registry.get_cypher_template("people").unwrap(), None);
        assert_eq!(
            registry.get_topic_type("users").unwrap(),
            Some(TopicType::CdcSourceId)
        );

        let snapshot = registry.snapshot().unwrap();
        assert!(snapshot.conflicts().is_empty());
        assert_eq!(snapshot.all_topics().len(), 3);
    }

    #[test]
    fn test_read_only_replica_sees_but_cannot_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        {
            let writer = TopicRegistry::new(FileStore::open("primary", &path).unwrap());
            writer.add_cdc_topic(TopicType::CdcSourceId, "users").unwrap();
        }

        let store = FileStore::open("replica", &path).unwrap();
        store.set_writable(false);
        let replica = TopicRegistry::new(store);
        assert!(!replica.store().is_writable());

        replica.remove_topic("users").unwrap();
        replica.add_cdc_topic(TopicType::CdcSchema, "catalog").unwrap();
        replica.clear_all().unwrap();

        assert_eq!(
            replica.get_all_topics().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["users".to_string()]
        );

        let reopened = TopicRegistry::new(FileStore::open("primary", &path).unwrap());
        assert_eq!(
            reopened.get_topic_type("users").unwrap(),
            Some(TopicType::CdcSourceId)
        );
        assert_eq!(reopened.get_topic_type("catalog").unwrap(), None);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ContractError, WriteExecutor, WriteOperation};
    use dispatcher::{
        ConfiguredExecutor, DispatchOutcome, DispatcherBuilder, DropReason, SinkDispatcher,
    };
    use registry::{MemoryStore, TopicRegistry};
    use serde_json::{json, Value};

    /// Keeps every operation it is handed
    #[derive(Default)]
    struct RecordingExecutor {
        writes: Mutex<Vec<WriteOperation>>,
    }

    impl RecordingExecutor {
        fn writes(&self) -> Vec<WriteOperation> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl WriteExecutor for RecordingExecutor {
        fn name(&self) -> &str {
            "recording"
        }

        async fn write(&self, operation: &WriteOperation) -> Result<(), ContractError> {
            self.writes.lock().unwrap().push(operation.clone());
            Ok(())
        }

        async fn flush(&self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    const SINK_TOML: &str = r#"
[topics]
cdc_source_id = ["users"]
cdc_schema = ["catalog"]

[topics.cypher]
people = "UNWIND $events AS e MERGE (p:Person {id: e.id}) SET p.name = e.name"

[strategies.source_id]
label_name = "Imported"
id_name = "importId"
"#;

    fn dispatcher_from(
        content: &str,
        format: ConfigFormat,
    ) -> SinkDispatcher<MemoryStore, RecordingExecutor> {
        let blueprint = ConfigLoader::load_from_str(content, format).unwrap();
        let registry = Arc::new(TopicRegistry::new(MemoryStore::new(&blueprint.store.name)));
        registry.apply(&blueprint.topics).unwrap();
        DispatcherBuilder::new(registry, RecordingExecutor::default())
            .strategies(blueprint.strategies)
            .build()
    }

    fn source_id_node(id: &str, op: &str, labels: &[&str]) -> Value {
        let state = json!({ "labels": labels, "properties": { "name": format!("user-{id}") } });
        let (before, after) = match op {
            "created" => (Value::Null, state),
            "deleted" => (state, Value::Null),
            _ => (state.clone(), state),
        };
        json!({
            "meta": { "operation": op, "txId": 7 },
            "payload": { "type": "node", "id": id, "before": before, "after": after },
            "schema": { "constraints": [] }
        })
    }

    fn schema_node(sku: &str, op: &str) -> Value {
        let state = json!({ "labels": ["Product"], "properties": { "sku": sku, "price": 10 } });
        let (before, after) = match op {
            "deleted" => (state, Value::Null),
            _ => (Value::Null, state),
        };
        json!({
            "meta": { "operation": op },
            "payload": { "type": "node", "id": sku, "before": before, "after": after },
            "schema": { "constraints": [
                { "label": "Product", "properties": ["sku"], "type": "UNIQUE" }
            ] }
        })
    }

    #[tokio::test]
    async fn test_cypher_topic_from_config() {
        let dispatcher = dispatcher_from(SINK_TOML, ConfigFormat::Toml);
        let batch = vec![json!({"id": 1, "name": "a"}), json!({"id": 2, "name": "b"})];

        let outcome = dispatcher.write_for_topic("people", &batch).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Written {
                operations: 1,
                events: 2
            }
        );

        let writes = dispatcher.executor().writes();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].query.starts_with("UNWIND $events AS e MERGE (p:Person"));
        assert_eq!(writes[0].events, batch);
    }

    #[tokio::test]
    async fn test_source_id_topic_uses_configured_label() {
        let dispatcher = dispatcher_from(SINK_TOML, ConfigFormat::Toml);
        let batch = vec![
            source_id_node("1", "created", &["User"]),
            source_id_node("2", "created", &["User"]),
            source_id_node("3", "deleted", &["User"]),
        ];

        let outcome = dispatcher.write_for_topic("users", &batch).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Written {
                operations: 2,
                events: 3
            }
        );

        let writes = dispatcher.executor().writes();
        assert!(writes[0].query.contains("MERGE (n:`Imported`{`importId`: event.id})"));
        assert!(writes[0].query.contains("SET n:`User`"));
        assert_eq!(writes[0].len(), 2);
        assert!(writes[1].query.contains("DETACH DELETE n"));
        assert_eq!(writes[1].events, vec![json!({"id": "3"})]);
    }

    #[tokio::test]
    async fn test_schema_topic_merges_by_constraint() {
        let dispatcher = dispatcher_from(SINK_TOML, ConfigFormat::Toml);
        let batch = vec![schema_node("p-1", "created"), schema_node("p-2", "deleted")];

        dispatcher.write_for_topic("catalog", &batch).await.unwrap();

        let writes = dispatcher.executor().writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[0].query.contains("MERGE (n:`Product`{`sku`: event.keys.`sku`})"));
        assert_eq!(writes[0].events[0]["keys"], json!({"sku": "p-1"}));
        assert!(writes[1].query.contains("DETACH DELETE n"));
        assert_eq!(writes[1].events[0]["keys"], json!({"sku": "p-2"}));
    }

    #[tokio::test]
    async fn test_properties_config_and_rerouting() {
        let properties = "\
streams.sink.topic.cypher.people=UNWIND $events AS e MERGE (:Person {id: e.id})
streams.sink.topic.cdc.schema=catalog
";
        let dispatcher = dispatcher_from(properties, ConfigFormat::Properties);
        let registry = Arc::clone(dispatcher.registry());

        let outcome = dispatcher
            .write_for_topic("users", &[source_id_node("1", "created", &["User"])])
            .await
            .unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Dropped {
                reason: DropReason::UnknownTopic
            }
        );

        // Reconfigured at runtime; the next call picks it up
        registry
            .add_cdc_topic(contracts::TopicType::CdcSourceId, "users")
            .unwrap();
        let outcome = dispatcher
            .write_for_topic("users", &[source_id_node("1", "created", &["User"])])
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Written { operations: 1, .. }));

        let snapshot = dispatcher.metrics_snapshot();
        assert_eq!(snapshot.batches_received, 2);
        assert_eq!(snapshot.batches_dropped, 1);
    }

    #[tokio::test]
    async fn test_file_executor_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("ops.jsonl");
        let config = format!(
            "{SINK_TOML}\n[executor]\nname = \"audit\"\nkind = \"file\"\npath = {:?}\n",
            output.display().to_string()
        );

        let blueprint = ConfigLoader::load_from_str(&config, ConfigFormat::Toml).unwrap();
        let registry = Arc::new(TopicRegistry::new(MemoryStore::new("registry")));
        registry.apply(&blueprint.topics).unwrap();
        let executor = ConfiguredExecutor::from_config(&blueprint.executor).unwrap();
        let dispatcher = DispatcherBuilder::new(registry, executor)
            .strategies(blueprint.strategies)
            .build();

        dispatcher
            .write_for_topic("people", &[json!({"id": 1})])
            .await
            .unwrap();
        dispatcher
            .write_for_topic(
                "users",
                &[
                    source_id_node("1", "created", &["User"]),
                    source_id_node("2", "deleted", &["User"]),
                ],
            )
            .await
            .unwrap();
        dispatcher.flush().await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l["executor"] == "audit"));
        assert_eq!(lines[0]["events"], json!([{"id": 1}]));
    }
}
