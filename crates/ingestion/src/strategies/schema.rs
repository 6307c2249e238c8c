//! SchemaIngestionStrategy - entities keyed by their source constraints
//!
//! A node is merged on the smallest identifying constraint (UNIQUE or
//! NODE_KEY) whose label it carries and whose properties it has. Events
//! without a usable key are skipped.

use std::collections::BTreeSet;

use contracts::{
    ChangeEvent, Constraint, IngestionStrategy, NodeState, Properties, RelationshipEnd,
    WriteOperation,
};
use metrics::counter;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::common::{group_ordered, keep_last, label_clause, quote, sorted_labels, UNWIND};

/// Strategy for `cdc_schema` topics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaIngestionStrategy;

/// Label plus key property names identifying one node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct NodeKey {
    label: String,
    properties: Vec<String>,
}

impl NodeKey {
    /// `:`Label`{`k`: <source>.`k`}` pattern
    fn pattern(&self, source: &str) -> String {
        let props = self
            .properties
            .iter()
            .map(|p| format!("{}: {source}.{}", quote(p), quote(p)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(":{}{{{props}}}", quote(&self.label))
    }

    fn values(&self, properties: &Properties) -> Value {
        let values: Map<String, Value> = self
            .properties
            .iter()
            .filter_map(|p| properties.get(p).map(|v| (p.clone(), v.clone())))
            .collect();
        Value::Object(values)
    }
}

/// Merge query shape for a group of nodes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct NodeMergeShape {
    key: NodeKey,
    add: Vec<String>,
    remove: Vec<String>,
}

/// Query shape for a group of relationships
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RelationshipShape {
    rel_type: String,
    start: NodeKey,
    end: NodeKey,
}

/// Events of one kind, last change per entity
fn latest(events: &[ChangeEvent], deleted: bool, nodes: bool) -> Vec<&ChangeEvent> {
    let selected = events
        .iter()
        .filter(|e| e.is_delete() == deleted && e.as_node().is_some() == nodes)
        .collect();
    keep_last(selected, |e| e.payload.id().to_owned())
}

fn skipped(phase: &'static str, id: &str, reason: &'static str) {
    debug!(phase, id, reason, "Skipping schema event");
    counter!("streams_sink_events_skipped_total", "strategy" => "schema", "phase" => phase)
        .increment(1);
}

/// Smallest identifying constraint matching `state`
fn node_key(constraints: &[Constraint], state: &NodeState) -> Option<NodeKey> {
    constraints
        .iter()
        .filter(|c| c.constraint_type.is_identifying())
        .filter_map(|c| c.label.as_ref().map(|label| (label, &c.properties)))
        .filter(|(label, _)| state.labels.contains(label))
        .filter(|(_, props)| !props.is_empty())
        .filter(|(_, props)| props.iter().all(|p| state.properties.contains_key(p)))
        .min_by(|(la, pa), (lb, pb)| {
            pa.len()
                .cmp(&pb.len())
                .then_with(|| la.cmp(lb))
                .then_with(|| pa.cmp(pb))
        })
        .map(|(label, props)| NodeKey {
            label: label.clone(),
            properties: props.iter().cloned().collect(),
        })
}

/// Key of a relationship endpoint
///
/// Prefers the label whose identifying constraint covers exactly the
/// endpoint's id properties, then the lowest label.
fn endpoint_key(constraints: &[Constraint], end: &RelationshipEnd) -> Option<NodeKey> {
    if end.ids.is_empty() {
        return None;
    }
    let ids: BTreeSet<&String> = end.ids.keys().collect();
    let label = constraints
        .iter()
        .filter(|c| c.constraint_type.is_identifying())
        .filter_map(|c| c.label.as_ref().map(|label| (label, &c.properties)))
        .filter(|(label, props)| {
            end.labels.contains(label) && props.iter().collect::<BTreeSet<_>>() == ids
        })
        .map(|(label, _)| label)
        .min()
        .or_else(|| end.labels.iter().min())?;

    Some(NodeKey {
        label: label.clone(),
        properties: ids.into_iter().cloned().collect(),
    })
}

fn merge_node_query(shape: &NodeMergeShape) -> String {
    let mut query = format!(
        "{UNWIND}\nMERGE (n{})\nSET n = event.properties",
        shape.key.pattern("event.keys")
    );
    if !shape.remove.is_empty() {
        query.push_str(&format!("\nREMOVE n{}", label_clause(&shape.remove)));
    }
    if !shape.add.is_empty() {
        query.push_str(&format!("\nSET n{}", label_clause(&shape.add)));
    }
    query
}

fn delete_node_query(key: &NodeKey) -> String {
    format!(
        "{UNWIND}\nMATCH (n{})\nDETACH DELETE n",
        key.pattern("event.keys")
    )
}

fn merge_relationship_query(shape: &RelationshipShape) -> String {
    format!(
        "{UNWIND}\n\
         MERGE (start{})\n\
         MERGE (end{})\n\
         MERGE (start)-[r:{}]->(end)\n\
         SET r = event.properties",
        shape.start.pattern("event.start"),
        shape.end.pattern("event.end"),
        quote(&shape.rel_type)
    )
}

fn delete_relationship_query(shape: &RelationshipShape) -> String {
    format!(
        "{UNWIND}\nMATCH (start{})-[r:{}]->(end{})\nDELETE r",
        shape.start.pattern("event.start"),
        quote(&shape.rel_type),
        shape.end.pattern("event.end")
    )
}

impl SchemaIngestionStrategy {
    fn relationship_rows(
        &self,
        events: &[ChangeEvent],
        deleted: bool,
    ) -> Vec<(RelationshipShape, Value)> {
        let phase = if deleted {
            "delete_relationships"
        } else {
            "merge_relationships"
        };
        let mut rows = Vec::new();
        for event in latest(events, deleted, false) {
            let Some(rel) = event.as_relationship() else {
                continue;
            };
            let constraints = &event.schema.constraints;
            let (Some(start), Some(end)) = (
                endpoint_key(constraints, &rel.start),
                endpoint_key(constraints, &rel.end),
            ) else {
                skipped(phase, &rel.id, "endpoint without key");
                continue;
            };
            let properties = rel
                .after
                .as_ref()
                .map(|s| Value::Object(s.properties.clone()))
                .unwrap_or_else(|| json!({}));
            let row = json!({
                "start": Value::Object(rel.start.ids.clone()),
                "end": Value::Object(rel.end.ids.clone()),
                "properties": properties,
            });
            let shape = RelationshipShape {
                rel_type: rel.label.clone(),
                start,
                end,
            };
            rows.push((shape, row));
        }
        rows
    }
}

impl IngestionStrategy for SchemaIngestionStrategy {
    fn merge_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let mut rows = Vec::new();
        for event in latest(events, false, true) {
            let Some(node) = event.as_node() else {
                continue;
            };
            let Some(after) = node.after.as_ref() else {
                skipped("merge_nodes", &node.id, "missing after state");
                continue;
            };
            let Some(key) = node_key(&event.schema.constraints, after) else {
                skipped("merge_nodes", &node.id, "no identifying constraint");
                continue;
            };
            let add = sorted_labels(&after.labels, |l| l == key.label);
            let remove = sorted_labels(node.labels_before(), |l| {
                after.labels.iter().any(|a| a == l)
            });
            let row = json!({
                "keys": key.values(&after.properties),
                "properties": Value::Object(after.properties.clone()),
            });
            rows.push((NodeMergeShape { key, add, remove }, row));
        }

        group_ordered(rows)
            .into_iter()
            .map(|(shape, rows)| WriteOperation::new(merge_node_query(&shape), rows))
            .collect()
    }

    fn delete_node_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        let mut rows = Vec::new();
        for event in latest(events, true, true) {
            let Some(node) = event.as_node() else {
                continue;
            };
            let Some(key) = node
                .before
                .as_ref()
                .and_then(|before| node_key(&event.schema.constraints, before))
            else {
                skipped("delete_nodes", &node.id, "no identifying constraint");
                continue;
            };
            let keys = node
                .before
                .as_ref()
                .map(|before| key.values(&before.properties))
                .unwrap_or_else(|| json!({}));
            rows.push((key, json!({ "keys": keys })));
        }

        group_ordered(rows)
            .into_iter()
            .map(|(key, rows)| WriteOperation::new(delete_node_query(&key), rows))
            .collect()
    }

    fn merge_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        group_ordered(self.relationship_rows(events, false))
            .into_iter()
            .map(|(shape, rows)| WriteOperation::new(merge_relationship_query(&shape), rows))
            .collect()
    }

    fn delete_relationship_events(&self, events: &[ChangeEvent]) -> Vec<WriteOperation> {
        group_ordered(self.relationship_rows(events, true))
            .into_iter()
            .map(|(shape, rows)| WriteOperation::new(delete_relationship_query(&shape), rows))
            .collect()
    }
}
