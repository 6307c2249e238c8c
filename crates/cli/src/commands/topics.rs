//! `topics` command implementation.

use std::io::Write;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{PropertyStore, SinkBlueprint, TopicType};
use registry::TopicRegistry;
use tracing::{info, warn};

use crate::cli::{ExportFormat, TopicsArgs, TopicsCommand};
use crate::store::{open_store, OpenedStore};

/// Execute the `topics` command
pub fn run_topics(args: &TopicsArgs) -> Result<()> {
    let blueprint = super::load_blueprint(&args.config).with_context(|| {
        format!("Failed to load config from {}", args.config.config.display())
    })?;

    let mut stdout = std::io::stdout().lock();
    match open_store(&blueprint.store)? {
        OpenedStore::Memory(store) => {
            execute(&TopicRegistry::new(store), &blueprint, &args.command, &mut stdout)
        }
        OpenedStore::File(store) => {
            execute(&TopicRegistry::new(store), &blueprint, &args.command, &mut stdout)
        }
    }
}

impl TopicsCommand {
    fn mutates(&self) -> bool {
        !matches!(self, TopicsCommand::List { .. } | TopicsCommand::Export { .. })
    }
}

fn execute<S: PropertyStore, W: Write>(
    registry: &TopicRegistry<S>,
    blueprint: &SinkBlueprint,
    command: &TopicsCommand,
    out: &mut W,
) -> Result<()> {
    if command.mutates() && !registry.is_writable() {
        warn!(store = %registry.store().name(), "Store is read only, registry left unchanged");
    }

    match command {
        TopicsCommand::List { json } => list(registry, *json, out)?,
        TopicsCommand::Export { format } => export(registry, blueprint, *format, out)?,
        TopicsCommand::SetCypher { topic, query } => {
            registry.set_cypher_template(topic, query)?;
            info!(topic = %topic, "Cypher template set");
        }
        TopicsCommand::RemoveCypher { topic } => {
            registry.remove_cypher_template(topic)?;
            info!(topic = %topic, "Cypher template removed");
        }
        TopicsCommand::AddCdc { kind, topic } => {
            let topic_type = TopicType::from(*kind);
            registry.add_cdc_topic(topic_type, topic)?;
            info!(topic = %topic, %topic_type, "CDC topic added");
        }
        TopicsCommand::RemoveCdc { kind, topic } => {
            let topic_type = TopicType::from(*kind);
            registry.remove_cdc_topic(topic_type, topic)?;
            info!(topic = %topic, %topic_type, "CDC topic removed");
        }
        TopicsCommand::SetCdc { kind, topics } => {
            let topic_type = TopicType::from(*kind);
            registry.set_cdc_topics(topic_type, topics)?;
            info!(%topic_type, count = topics.len(), "CDC topic set replaced");
        }
        TopicsCommand::Remove { topic } => {
            registry.remove_topic(topic)?;
            info!(topic = %topic, "Topic removed");
        }
        TopicsCommand::Clear => {
            registry.clear_all()?;
            info!("Registry cleared");
        }
        TopicsCommand::Apply => {
            registry.apply(&blueprint.topics)?;
            info!(
                topics = blueprint.topics.all_topics().len(),
                "Configured topics applied"
            );
        }
    }

    Ok(())
}

fn list<S: PropertyStore, W: Write>(
    registry: &TopicRegistry<S>,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let snapshot = registry.snapshot()?;
    let topics: Vec<(String, TopicType)> = snapshot
        .all_topics()
        .into_iter()
        .filter_map(|topic| {
            let topic_type = snapshot.topic_type(&topic)?;
            Some((topic, topic_type))
        })
        .collect();

    if json {
        let map: serde_json::Map<String, serde_json::Value> = topics
            .into_iter()
            .map(|(topic, topic_type)| (topic, topic_type.name().into()))
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
        return Ok(());
    }

    if topics.is_empty() {
        writeln!(out, "No topics registered")?;
        return Ok(());
    }

    let width = topics.iter().map(|(t, _)| t.len()).max().unwrap_or(0);
    for (topic, topic_type) in &topics {
        writeln!(out, "{topic:<width$}  {topic_type}")?;
    }
    Ok(())
}

/// Print the registry content as a configuration document
///
/// Store, strategy and executor sections come from the loaded configuration,
/// so the output can be used as a config file directly.
fn export<S: PropertyStore, W: Write>(
    registry: &TopicRegistry<S>,
    blueprint: &SinkBlueprint,
    format: ExportFormat,
    out: &mut W,
) -> Result<()> {
    let exported = SinkBlueprint {
        topics: registry.snapshot()?,
        ..blueprint.clone()
    };

    let rendered = match format {
        ExportFormat::Toml => ConfigLoader::to_toml(&exported)?,
        ExportFormat::Json => ConfigLoader::to_json(&exported)?,
        ExportFormat::Properties => ConfigLoader::to_properties(&exported),
    };
    write!(out, "{rendered}")?;
    if !rendered.ends_with('\n') {
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CdcKind;
    use config_loader::ConfigFormat;
    use registry::MemoryStore;

    fn run(registry: &TopicRegistry<MemoryStore>, command: TopicsCommand) -> String {
        let blueprint = SinkBlueprint::default();
        let mut out = Vec::new();
        execute(registry, &blueprint, &command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_mutations_then_list() {
        let registry = TopicRegistry::new(MemoryStore::new("cli"));
        run(
            &registry,
            TopicsCommand::SetCypher {
                topic: "people".into(),
                query: "UNWIND $events AS e MERGE (:P {id: e.id})".into(),
            },
        );
        run(
            &registry,
            TopicsCommand::SetCdc {
                kind: CdcKind::SourceId,
                topics: vec!["users".into(), "orders".into()],
            },
        );
        run(
            &registry,
            TopicsCommand::AddCdc {
                kind: CdcKind::Schema,
                topic: "orders".into(),
            },
        );

        let output = run(&registry, TopicsCommand::List { json: false });
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("orders") && lines[0].ends_with("cdc_schema"));
        assert!(lines[1].starts_with("people") && lines[1].ends_with("cypher"));
        assert!(lines[2].starts_with("users") && lines[2].ends_with("cdc_source_id"));

        run(&registry, TopicsCommand::Remove { topic: "people".into() });
        let json: serde_json::Value =
            serde_json::from_str(&run(&registry, TopicsCommand::List { json: true })).unwrap();
        assert!(json.get("people").is_none());
        assert_eq!(json["users"], "cdc_source_id");
    }

    #[test]
    fn test_clear_and_empty_list() {
        let registry = TopicRegistry::new(MemoryStore::new("cli"));
        run(
            &registry,
            TopicsCommand::AddCdc {
                kind: CdcKind::Schema,
                topic: "catalog".into(),
            },
        );
        run(&registry, TopicsCommand::Clear);
        assert_eq!(
            run(&registry, TopicsCommand::List { json: false }).trim(),
            "No topics registered"
        );
    }

    #[test]
    fn test_apply_and_export_round_trip() {
        let registry = TopicRegistry::new(MemoryStore::new("cli"));
        let mut blueprint = SinkBlueprint::default();
        blueprint.topics.cdc_schema.insert("catalog".into());
        blueprint
            .topics
            .cypher
            .insert("people".into(), "UNWIND $events AS e MERGE (:P {id: e.id})".into());

        let mut sink = Vec::new();
        execute(&registry, &blueprint, &TopicsCommand::Apply, &mut sink).unwrap();

        for (format, parse_as) in [
            (ExportFormat::Toml, ConfigFormat::Toml),
            (ExportFormat::Json, ConfigFormat::Json),
            (ExportFormat::Properties, ConfigFormat::Properties),
        ] {
            let mut out = Vec::new();
            execute(
                &registry,
                &SinkBlueprint::default(),
                &TopicsCommand::Export { format },
                &mut out,
            )
            .unwrap();
            let exported =
                ConfigLoader::load_from_str(&String::from_utf8(out).unwrap(), parse_as).unwrap();
            assert_eq!(exported.topics, blueprint.topics, "format {format:?}");
        }
    }

    #[test]
    fn test_read_only_store_is_left_unchanged() {
        let registry = TopicRegistry::new(MemoryStore::read_only("replica"));
        run(
            &registry,
            TopicsCommand::AddCdc {
                kind: CdcKind::Schema,
                topic: "catalog".into(),
            },
        );
        assert!(registry.get_all_topics().unwrap().is_empty());
    }
}
