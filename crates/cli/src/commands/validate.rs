//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ExecutorKind, SinkBlueprint, StoreKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    store: String,
    executor: String,
    cypher_topics: usize,
    cdc_source_id_topics: usize,
    cdc_schema_topics: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.config.display().to_string();

    match super::load_blueprint(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    store: format!("{} ({:?})", blueprint.store.name, blueprint.store.kind),
                    executor: format!("{} ({:?})", blueprint.executor.name, blueprint.executor.kind),
                    cypher_topics: blueprint.topics.cypher.len(),
                    cdc_source_id_topics: blueprint.topics.cdc_source_id.len(),
                    cdc_schema_topics: blueprint.topics.cdc_schema.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &SinkBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.topics.is_empty() {
        warnings.push("No topics configured - every batch will be dropped until the registry is populated".to_string());
    }

    if blueprint.store.read_only && !blueprint.topics.is_empty() {
        warnings.push("store.read_only is set - the [topics] section cannot be applied".to_string());
    }

    if blueprint.store.kind == StoreKind::Memory {
        warnings.push("Memory store - registry changes are lost on exit".to_string());
    }

    if blueprint.executor.kind == ExecutorKind::Log {
        warnings.push("Log executor - operations are logged, not persisted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Store: {}", summary.store);
            println!("  Executor: {}", summary.executor);
            println!("  Cypher topics: {}", summary.cypher_topics);
            println!("  CDC source-id topics: {}", summary.cdc_source_id_topics);
            println!("  CDC schema topics: {}", summary.cdc_schema_topics);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
