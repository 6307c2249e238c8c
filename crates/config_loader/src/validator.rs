//! Configuration validation
//!
//! Rules:
//! - derive rules on the blueprint (non-empty names)
//! - a topic is routed under one type only
//! - topic names are non-empty and free of the list separator
//! - cypher templates are non-empty
//! - file store / file executor have a path

use contracts::{
    ContractError, ExecutorKind, SinkBlueprint, StoreKind, TopicType, CDC_TOPIC_SEPARATOR,
};
use validator::Validate;

/// Validate a SinkBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_topic_names(blueprint)?;
    validate_topic_ownership(blueprint)?;
    validate_templates(blueprint)?;
    validate_store(blueprint)?;
    validate_executor(blueprint)?;
    Ok(())
}

/// Derive rules declared on the blueprint structs
fn validate_fields(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string().replace('\n', "; ")))
}

fn validate_topic_names(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    for topic in blueprint.topics.all_topics() {
        let field = match blueprint.topics.topic_type(&topic) {
            Some(t) => format!("topics.{}[{topic}]", t.name()),
            None => format!("topics[{topic}]"),
        };
        if topic.trim().is_empty() {
            return Err(ContractError::config_validation(field, "topic name cannot be empty"));
        }
        if topic.contains(CDC_TOPIC_SEPARATOR) {
            return Err(ContractError::config_validation(
                field,
                format!("topic name cannot contain '{CDC_TOPIC_SEPARATOR}'"),
            ));
        }
    }
    Ok(())
}

/// A topic listed under several types is ambiguous
fn validate_topic_ownership(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    if let Some((topic, types)) = blueprint.topics.conflicts().into_iter().next() {
        let types: Vec<&str> = types.iter().map(|t| TopicType::name(*t)).collect();
        return Err(ContractError::config_validation(
            format!("topics[{topic}]"),
            format!("duplicate topic under types {}", types.join(", ")),
        ));
    }
    Ok(())
}

fn validate_templates(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    for (topic, template) in &blueprint.topics.cypher {
        if template.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("topics.cypher[{topic}]"),
                "cypher template cannot be empty",
            ));
        }
    }
    Ok(())
}

fn validate_store(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    let store = &blueprint.store;
    if store.kind == StoreKind::File && store.path.is_none() {
        return Err(ContractError::config_validation(
            "store.path",
            "file store requires a path",
        ));
    }
    Ok(())
}

fn validate_executor(blueprint: &SinkBlueprint) -> Result<(), ContractError> {
    let executor = &blueprint.executor;
    if executor.kind == ExecutorKind::File && executor.path.is_none() {
        return Err(ContractError::config_validation(
            "executor.path",
            "file executor requires a path",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TopicsConfig;

    fn minimal_blueprint() -> SinkBlueprint {
        let mut topics = TopicsConfig::default();
        topics
            .cypher
            .insert("people".into(), "UNWIND $events AS e MERGE (:P {id: e.id})".into());
        topics.cdc_source_id.insert("users".into());
        topics.cdc_schema.insert("catalog".into());
        SinkBlueprint {
            topics,
            ..SinkBlueprint::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let bp = minimal_blueprint();
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_duplicate_topic() {
        let mut bp = minimal_blueprint();
        bp.topics.cdc_schema.insert("users".into());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate topic"), "got: {err}");
        assert!(err.contains("topics[users]"), "got: {err}");
    }

    #[test]
    fn test_separator_in_topic_name() {
        let mut bp = minimal_blueprint();
        bp.topics.cdc_schema.insert("a;b".into());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot contain ';'"), "got: {err}");
    }

    #[test]
    fn test_empty_template() {
        let mut bp = minimal_blueprint();
        bp.topics.cypher.insert("blank".into(), "  ".into());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cypher template cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_file_store_requires_path() {
        let mut bp = minimal_blueprint();
        bp.store.kind = StoreKind::File;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("file store requires a path"), "got: {err}");

        bp.store.path = Some("/tmp/registry.json".into());
        assert!(validate(&bp).is_ok());
    }

    #[test]
    fn test_file_executor_requires_path() {
        let mut bp = minimal_blueprint();
        bp.executor.kind = ExecutorKind::File;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("file executor requires a path"), "got: {err}");
    }

    #[test]
    fn test_empty_strategy_label() {
        let mut bp = minimal_blueprint();
        bp.strategies.source_id.label_name = String::new();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }
}
