//! SourceIdIngestionStrategy - entities keyed by their source database id
//!
//! Every node gets the configured label plus an id property holding its
//! source id; relationships carry the same id property.

use contracts::{ChangeEvent, IngestionStrategy, NodePayload, SourceIdStrategyConfig, WriteOperation};
use serde_json::{json, Value};

use super::common::{
    group_ordered, label_clause, node_events, quote, relationship_events, sorted_labels, UNWIND,
};

/// Strategy for `cdc_source_id` topics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdIngestionStrategy {
    label_name: String,
    id_name: String,
}

/// Label changes shared by one merge query
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LabelChange {
    add: Vec<String>,
    remove: Vec<String>,
}

impl SourceIdIngestionStrategy {
    /// Create from configuration
    pub fn new(config: &SourceIdStrategyConfig) -> Self {
        Self {
            label_name: config.label_name.clone(),
            id_name: config.id_name.clone(),
        }
    }

    fn label_change(&self, node: &NodePayload) -> LabelChange {
        let after = node.labels_after();
        let add = sorted_labels(after, |l| l == self.label_name);
        let remove = sorted_labels(node.labels_before(), |l| {
            l == self.label_name || after.iter().any(|a| a == l)
        });
        LabelChange { add, remove }
    }

    fn node_merge_query(&self, change: &LabelChange) -> String {
        let label = quote(&self.label_name);
        let id = quote(&self.id_name);
        let mut query = format!(
            "{UNWIND}\nMERGE (n:{label}{{{id}: event.id}})\nSET n = event.properties\nSET n.{id} = event.id"
        );
        if !change.remove.is_empty() {
            query.push_str(&format!("\nREMOVE n{}", label_clause(&change.remove)));
        }
        if !change.add.is_empty() {
            query.push_str(&format!("\nSET n{}", label_clause(&change.add)));
        }
        query
    }

    fn node_delete_query(&self) -> String {
        format!(
            "{UNWIND}\nMATCH (n:{}{{{}: event.id}})\nDETACH DELETE n",
            quote(&self.label_name),
            quote(&self.id_name)
        )
    }

    fn relationship_merge_query(&self, rel_type: &str) -> String {
        let label = quote(&self.label_name);
        let id = quote(&self.id_name);
        let rel_type = quote(rel_type);
        format!(
            "{UNWIND}\n\
             MERGE (start:{label}{{{id}: event.start}})\n\
             MERGE (end:{label}{{{id}: event.end}})\n\
             MERGE (start)-[r:{rel_type}{{{id}: event.id}}]->(end)\n\
             SET r = event.properties\n\
             SET r.{id} = event.id"
        )
    }

    fn relationship_delete_query(&self, rel_type: &str) -> String {
        format!(
            "{UNWIND}\nMATCH ()-[r:{}{{{}: event.id}}]-()\nDELETE r",
            quote(rel_type),
            quote(&self.id_name)
        )
    }
}

impl Default for SourceIdIngestionStrategy {
    fn default() -> Self {
        Self::new(&SourceIdStrategyConfig::default())
    }
}

impl IngestionStrategy for SourceIdIngestionStrategy {
    fn merge_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let rows = node_events(events, false).into_iter().map(|node| {
            let properties = node
                .after
                .as_ref()
                .map(|s| Value::Object(s.properties.clone()))
                .unwrap_or_else(|| json!({}));
            (
                self.label_change(node),
                json!({ "id": node.id, "properties": properties }),
            )
        });

        group_ordered(rows)
            .into_iter()
            .map(|(change, rows)| WriteOperation::new(self.node_merge_query(&change), rows))
            .collect()
    }

    fn delete_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let rows: Vec<Value> = node_events(events, true)
            .into_iter()
            .map(|node| json!({ "id": node.id }))
            .collect();
        if rows.is_empty() {
            return Vec::new();
        }
        vec![WriteOperation::new(self.node_delete_query(), rows)]
    }

    fn merge_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let rows = relationship_events(events, false)
            .into_iter()
            .map(|rel| {
                let properties = rel
                    .after
                    .as_ref()
                    .map(|s| Value::Object(s.properties.clone()))
                    .unwrap_or_else(|| json!({}));
                (
                    rel.label.clone(),
                    json!({
                        "id": rel.id,
                        "start": rel.start.id,
                        "end": rel.end.id,
                        "properties": properties,
                    }),
                )
            });

        group_ordered(rows)
            .into_iter()
            .map(|(rel_type, rows)| {
                WriteOperation::new(self.relationship_merge_query(&rel_type), rows)
            })
            .collect()
    }

    fn delete_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let rows = relationship_events(events, true)
            .into_iter()
            .map(|rel| (rel.label.clone(), json!({ "id": rel.id })));

        group_ordered(rows)
            .into_iter()
            .map(|(rel_type, rows)| {
                WriteOperation::new(self.relationship_delete_query(&rel_type), rows)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(raw: Value) -> ChangeEvent {
        serde_json::from_value(raw).unwrap()
    }

    fn node(id: &str, op: &str, before: Value, after: Value) -> ChangeEvent {
        event(json!({
            "meta": { "operation": op },
            "payload": { "type": "node", "id": id, "before": before, "after": after }
        }))
    }

    fn rel(id: &str, op: &str, label: &str, after: Value) -> ChangeEvent {
        event(json!({
            "meta": { "operation": op },
            "payload": { "type": "relationship", "id": id, "label": label,
                         "start": { "id": "1", "labels": ["User"] },
                         "end": { "id": "2", "labels": ["User"] },
                         "before": null, "after": after }
        }))
    }

    #[test]
    fn test_merge_nodes_grouped_by_labels() {
        let strategy = SourceIdIngestionStrategy::default();
        let events = vec![
            node("1", "created", json!(null), json!({ "labels": ["User"], "properties": { "name": "ann" } })),
            node("2", "created", json!(null), json!({ "labels": ["User"], "properties": { "name": "bob" } })),
            node("3", "created", json!(null), json!({ "labels": ["Admin"], "properties": {} })),
        ];

        let ops = strategy.merge_node_events(&events);
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0].query,
            "UNWIND $events AS event\n\
             MERGE (n:`SourceEvent`{`sourceId`: event.id})\n\
             SET n = event.properties\n\
             SET n.`sourceId` = event.id\n\
             SET n:`User`"
        );
        assert_eq!(ops[0].events.len(), 2);
        assert_eq!(ops[0].events[1], json!({ "id": "2", "properties": { "name": "bob" } }));
        assert!(ops[1].query.ends_with("SET n:`Admin`"));
    }

    #[test]
    fn test_merge_node_removes_dropped_labels() {
        let strategy = SourceIdIngestionStrategy::default();
        let events = vec![node(
            "1",
            "updated",
            json!({ "labels": ["User", "Trial"], "properties": {} }),
            json!({ "labels": ["User"], "properties": {} }),
        )];

        let ops = strategy.merge_node_events(&events);
        assert_eq!(ops.len(), 1);
        assert!(ops[0].query.contains("\nREMOVE n:`Trial`\nSET n:`User`"));
    }

    #[test]
    fn test_merge_nodes_keep_last_change() {
        let strategy = SourceIdIngestionStrategy::default();
        let events = vec![
            node("1", "created", json!(null), json!({ "labels": ["User"], "properties": { "v": 1 } })),
            node("1", "updated", json!(null), json!({ "labels": ["User"], "properties": { "v": 2 } })),
        ];

        let ops = strategy.merge_node_events(&events);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].events, vec![json!({ "id": "1", "properties": { "v": 2 } })]);
    }

    #[test]
    fn test_delete_nodes() {
        let strategy = SourceIdIngestionStrategy::default();
        let events = vec![
            node("1", "deleted", json!({ "labels": ["User"], "properties": {} }), json!(null)),
            node("2", "created", json!(null), json!({ "labels": ["User"], "properties": {} })),
        ];

        let ops = strategy.delete_node_events(&events);
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0].query,
            "UNWIND $events AS event\nMATCH (n:`SourceEvent`{`sourceId`: event.id})\nDETACH DELETE n"
        );
        assert_eq!(ops[0].events, vec![json!({ "id": "1" })]);
        assert!(strategy.delete_node_events(&events[1..]).is_empty());
    }

    #[test]
    fn test_relationship_phases() {
        let strategy = SourceIdIngestionStrategy::new(&SourceIdStrategyConfig {
            label_name: "Src".into(),
            id_name: "srcId".into(),
        });
        let events = vec![
            rel("10", "created", "KNOWS", json!({ "properties": { "since": 2020 } })),
            rel("11", "created", "LIKES", json!({ "properties": {} })),
            rel("12", "deleted", "KNOWS", json!(null)),
        ];

        let merges = strategy.merge_relationship_events(&events);
        assert_eq!(merges.len(), 2);
        assert!(merges[0]
            .query
            .contains("MERGE (start)-[r:`KNOWS`{`srcId`: event.id}]->(end)"));
        assert_eq!(
            merges[0].events[0],
            json!({ "id": "10", "start": "1", "end": "2", "properties": { "since": 2020 } })
        );

        let deletes = strategy.delete_relationship_events(&events);
        assert_eq!(deletes.len(), 1);
        assert_eq!(
            deletes[0].query,
            "UNWIND $events AS event\nMATCH ()-[r:`KNOWS`{`srcId`: event.id}]-()\nDELETE r"
        );
    }
}
