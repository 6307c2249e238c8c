//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::{SinkBlueprint, TopicType};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    store: StoreInfo,
    executor: ExecutorInfo,
    strategies: StrategyInfo,
    /// topic -> type
    topics: BTreeMap<String, TopicType>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    templates: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct StoreInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    read_only: bool,
}

#[derive(Serialize)]
struct ExecutorInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Serialize)]
struct StrategyInfo {
    source_id_label: String,
    source_id_property: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Loading configuration info");

    let blueprint = super::load_blueprint(&args.config).with_context(|| {
        format!("Failed to load config from {}", args.config.config.display())
    })?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn topic_map(blueprint: &SinkBlueprint) -> BTreeMap<String, TopicType> {
    blueprint
        .topics
        .all_topics()
        .into_iter()
        .filter_map(|topic| {
            let topic_type = blueprint.topics.topic_type(&topic)?;
            Some((topic, topic_type))
        })
        .collect()
}

fn build_config_info(blueprint: &SinkBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        store: StoreInfo {
            name: blueprint.store.name.clone(),
            kind: format!("{:?}", blueprint.store.kind),
            path: blueprint.store.path.as_ref().map(|p| p.display().to_string()),
            read_only: blueprint.store.read_only,
        },
        executor: ExecutorInfo {
            name: blueprint.executor.name.clone(),
            kind: format!("{:?}", blueprint.executor.kind),
            path: blueprint
                .executor
                .path
                .as_ref()
                .map(|p| p.display().to_string()),
        },
        strategies: StrategyInfo {
            source_id_label: blueprint.strategies.source_id.label_name.clone(),
            source_id_property: blueprint.strategies.source_id.id_name.clone(),
        },
        topics: topic_map(blueprint),
        templates: blueprint
            .topics
            .cypher
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn print_config_info(blueprint: &SinkBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Streams Sink Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let store = &blueprint.store;
    println!("🗄  Store");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", store.name);
    println!("   ├─ Kind: {:?}", store.kind);
    if let Some(ref path) = store.path {
        println!("   ├─ Path: {}", path.display());
    }
    println!("   └─ Read only: {}", store.read_only);

    let executor = &blueprint.executor;
    println!("\n📤 Executor");
    println!("   ├─ Name: {}", executor.name);
    match executor.path {
        Some(ref path) => {
            println!("   ├─ Kind: {:?}", executor.kind);
            println!("   └─ Path: {}", path.display());
        }
        None => println!("   └─ Kind: {:?}", executor.kind),
    }

    let source_id = &blueprint.strategies.source_id;
    println!("\n⚙️  Strategies");
    println!("   └─ Source id: label {}, property {}", source_id.label_name, source_id.id_name);

    let topics = topic_map(blueprint);
    println!("\n📨 Topics ({})", topics.len());
    for (i, (topic, topic_type)) in topics.iter().enumerate() {
        let is_last = i == topics.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({})", prefix, topic, topic_type);
        if let Some(template) = blueprint.topics.cypher.get(topic) {
            for line in template.lines() {
                println!("   {}  {}", child_prefix, line.trim());
            }
        }
    }

    println!();
}
