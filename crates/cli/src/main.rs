//! # Streams Sink CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration validation and inspection
//! - Topic registry management against the configured store
//! - Batch ingestion of JSON lines through the sink dispatcher

mod cli;
mod commands;
mod error;
mod stats;
mod store;

use anyhow::Result;
use clap::Parser;
use observability::{LogTarget, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_ingest, run_topics, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Streams Sink CLI starting"
    );

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
        Commands::Topics(args) => run_topics(args),
        Commands::Ingest(args) => run_ingest(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging settings from the global flags
///
/// Logs go to stderr so `topics export` output stays clean. Metrics are
/// started by `ingest` on request.
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    ObservabilityConfig {
        log_format: cli.log_format.into(),
        log_target: LogTarget::Stderr,
        metrics_port: None,
        default_log_level: default_log_level.to_string(),
        log_filter: cli.quiet.then(|| "warn".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(["streams-sink"].iter().chain(args).chain(&["validate"]))
    }

    #[test]
    fn test_observability_config_from_flags() {
        let config = observability_config(&parse(&["--log-format", "json"]));
        assert_eq!(config.log_format, observability::LogFormat::Json);
        assert_eq!(config.log_target, LogTarget::Stderr);
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert!(config.log_filter.is_none());

        let config = observability_config(&parse(&["-vv", "--log-format", "compact"]));
        assert_eq!(config.log_format, observability::LogFormat::Compact);
        assert_eq!(config.default_log_level, "trace");

        let config = observability_config(&parse(&["-q"]));
        assert_eq!(config.log_format, observability::LogFormat::Pretty);
        assert_eq!(config.log_filter.as_deref(), Some("warn"));
    }
}
