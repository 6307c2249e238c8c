//! ChangeEvent - one decoded CDC record
//!
//! Wire layout (JSON):
//!
//! ```json
//! {
//!   "meta": { "timestamp": 1, "username": "neo4j", "txId": 3, "txEventId": 0,
//!             "txEventsCount": 1, "operation": "created", "source": {} },
//!   "payload": { "type": "node", "id": "0", "before": null,
//!                "after": { "labels": ["User"], "properties": { "name": "ann" } } },
//!   "schema": { "properties": { "name": "String" },
//!               "constraints": [{ "label": "User", "properties": ["name"], "type": "UNIQUE" }] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Property map of a node or relationship
pub type Properties = Map<String, Value>;

/// Decoded change event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Transaction metadata
    pub meta: Meta,

    /// Changed entity
    pub payload: Payload,

    /// Schema of the changed entity at capture time
    #[serde(default)]
    pub schema: Schema,
}

impl ChangeEvent {
    /// Operation kind of this event
    pub fn operation(&self) -> OperationType {
        self.meta.operation
    }

    /// Whether this event deletes its entity
    pub fn is_delete(&self) -> bool {
        self.meta.operation == OperationType::Deleted
    }

    /// Node payload, if this event changes a node
    pub fn as_node(&self) -> Option<&NodePayload> {
        match &self.payload {
            Payload::Node(node) => Some(node),
            Payload::Relationship(_) => None,
        }
    }

    /// Relationship payload, if this event changes a relationship
    pub fn as_relationship(&self) -> Option<&RelationshipPayload> {
        match &self.payload {
            Payload::Relationship(rel) => Some(rel),
            Payload::Node(_) => None,
        }
    }
}

/// Transaction metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Commit timestamp (ms)
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub username: String,

    /// Source transaction id
    #[serde(default)]
    pub tx_id: i64,

    /// Index of this event inside its transaction
    #[serde(default)]
    pub tx_event_id: i64,

    /// Number of events in the source transaction
    #[serde(default)]
    pub tx_events_count: i64,

    pub operation: OperationType,

    /// Free-form source information (hostname, database...)
    #[serde(default)]
    pub source: BTreeMap<String, Value>,
}

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Created,
    Updated,
    Deleted,
}

/// Changed entity, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Node(NodePayload),
    Relationship(RelationshipPayload),
}

impl Payload {
    /// Source id of the changed entity
    pub fn id(&self) -> &str {
        match self {
            Payload::Node(node) => &node.id,
            Payload::Relationship(rel) => &rel.id,
        }
    }
}

/// Node change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    pub id: String,
    #[serde(default)]
    pub before: Option<NodeState>,
    #[serde(default)]
    pub after: Option<NodeState>,
}

impl NodePayload {
    /// Labels after the change, empty when deleted
    pub fn labels_after(&self) -> &[String] {
        self.after.as_ref().map(|s| s.labels.as_slice()).unwrap_or(&[])
    }

    /// Labels before the change, empty when created
    pub fn labels_before(&self) -> &[String] {
        self.before
            .as_ref()
            .map(|s| s.labels.as_slice())
            .unwrap_or(&[])
    }
}

/// Node state snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
}

/// Relationship change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipPayload {
    pub id: String,

    /// Relationship type
    pub label: String,

    pub start: RelationshipEnd,
    pub end: RelationshipEnd,

    #[serde(default)]
    pub before: Option<RelationshipState>,
    #[serde(default)]
    pub after: Option<RelationshipState>,
}

/// One endpoint of a relationship
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEnd {
    /// Source id of the endpoint node
    pub id: String,

    #[serde(default)]
    pub labels: Vec<String>,

    /// Key properties identifying the endpoint node
    #[serde(default)]
    pub ids: Properties,
}

/// Relationship state snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipState {
    #[serde(default)]
    pub properties: Properties,
}

/// Schema attached to an event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Property name -> type name
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

/// Constraint declared on the source database
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub label: Option<String>,

    pub properties: BTreeSet<String>,

    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
}

/// Kind of constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    Unique,
    NodeKey,
    NodePropertyExists,
    RelationshipPropertyExists,
}

impl ConstraintType {
    /// Whether the constraint guarantees node identity
    pub fn is_identifying(self) -> bool {
        matches!(self, ConstraintType::Unique | ConstraintType::NodeKey)
    }
}
