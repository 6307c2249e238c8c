//! Shared helpers for strategy implementations

use contracts::{ChangeEvent, NodePayload, RelationshipPayload};
use std::collections::BTreeMap;

/// Prologue of every batched query
pub const UNWIND: &str = "UNWIND $events AS event";

/// Quote an identifier with backticks
pub fn quote(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

/// `:`A`:`B`` label suffix, empty for no labels
pub fn label_clause<S: AsRef<str>>(labels: &[S]) -> String {
    labels
        .iter()
        .map(|l| format!(":{}", quote(l.as_ref())))
        .collect()
}

/// Keep only the last item per key
///
/// Survivors stay in input order, so an entity sits at the position of its
/// most recent change.
pub fn keep_last<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut last = BTreeMap::new();
    for (index, item) in items.iter().enumerate() {
        last.insert(key(item), index);
    }
    items
        .into_iter()
        .enumerate()
        .filter(|(index, item)| last.get(&key(item)) == Some(index))
        .map(|(_, item)| item)
        .collect()
}

/// Group values by key, groups ordered by their first member
pub fn group_ordered<K, V, I>(items: I) -> Vec<(K, Vec<V>)>
where
    K: Ord + Clone,
    I: IntoIterator<Item = (K, V)>,
{
    let mut positions: BTreeMap<K, usize> = BTreeMap::new();
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();
    for (key, value) in items {
        match positions.get(&key) {
            Some(&position) => groups[position].1.push(value),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }
    groups
}

/// Sorted, deduplicated copy of `labels` without the excluded ones
pub fn sorted_labels<'a>(
    labels: impl IntoIterator<Item = &'a String>,
    exclude: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut labels: Vec<String> = labels
        .into_iter()
        .filter(|l| !exclude(l.as_str()))
        .cloned()
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

/// Node changes of one kind, last change per node
pub fn node_events(events: &[ChangeEvent], deleted: bool) -> Vec<&NodePayload> {
    let nodes = events
        .iter()
        .filter(|e| e.is_delete() == deleted)
        .filter_map(ChangeEvent::as_node)
        .collect();
    keep_last(nodes, |n| n.id.clone())
}

/// Relationship changes of one kind, last change per relationship
pub fn relationship_events(
    events: &[ChangeEvent],
    deleted: bool,
) -> Vec<&RelationshipPayload> {
    let rels = events
        .iter()
        .filter(|e| e.is_delete() == deleted)
        .filter_map(ChangeEvent::as_relationship)
        .collect();
    keep_last(rels, |r| r.id.clone())
}
