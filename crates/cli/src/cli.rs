//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::TopicType;
use std::path::PathBuf;

/// Streams Sink - topic routing and CDC ingestion for a graph sink
#[derive(Parser, Debug)]
#[command(
    name = "streams-sink",
    author,
    version,
    about = "Topic routing registry and CDC ingestion for a graph sink",
    long_about = "Manages the persisted topic registry of a graph sink and dispatches\n\
                  message batches through it.\n\n\
                  Cypher topics run their template once per batch; CDC topics are decoded\n\
                  into change events and written phase by phase."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STREAMS_SINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STREAMS_SINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Inspect or modify the topic registry
    Topics(TopicsArgs),

    /// Dispatch a JSON lines file as batches of one topic
    Ingest(IngestArgs),
}

/// Configuration path shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArg {
    /// Path to configuration file (TOML, JSON or properties)
    #[arg(
        short,
        long,
        default_value = "sink.toml",
        env = "STREAMS_SINK_CONFIG"
    )]
    pub config: PathBuf,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `topics` command
#[derive(Parser, Debug)]
pub struct TopicsArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    #[command(subcommand)]
    pub command: TopicsCommand,
}

/// Registry operations
#[derive(Subcommand, Debug, Clone)]
pub enum TopicsCommand {
    /// List every registered topic with its type
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the registry as a configuration document
    Export {
        /// Output format
        #[arg(long, value_enum, default_value = "toml")]
        format: ExportFormat,
    },

    /// Register (or replace) the template of a cypher topic
    SetCypher {
        /// Topic name
        topic: String,
        /// Query template, run with the batch bound to `$events`
        query: String,
    },

    /// Remove the template of a cypher topic
    RemoveCypher {
        /// Topic name
        topic: String,
    },

    /// Add one topic to a CDC type
    AddCdc {
        /// CDC type
        #[arg(long = "type", value_enum)]
        kind: CdcKind,
        /// Topic name
        topic: String,
    },

    /// Remove one topic from a CDC type
    RemoveCdc {
        /// CDC type
        #[arg(long = "type", value_enum)]
        kind: CdcKind,
        /// Topic name
        topic: String,
    },

    /// Replace the member set of a CDC type
    SetCdc {
        /// CDC type
        #[arg(long = "type", value_enum)]
        kind: CdcKind,
        /// Topic names
        #[arg(required = true)]
        topics: Vec<String>,
    },

    /// Drop a topic whatever its type
    Remove {
        /// Topic name
        topic: String,
    },

    /// Remove every registered topic
    Clear,

    /// Apply the `[topics]` section of the configuration
    Apply,
}

/// Arguments for the `ingest` command
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Topic the batches are received on
    #[arg(short, long)]
    pub topic: String,

    /// JSON lines input, one message per line (`-` for stdin)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Messages per batch
    #[arg(long, default_value = "100", env = "STREAMS_SINK_BATCH_SIZE")]
    pub batch_size: usize,

    /// Apply the `[topics]` section to the registry before dispatching
    #[arg(long)]
    pub apply_config: bool,

    /// Keep going after a batch fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "STREAMS_SINK_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

/// Registry export format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Toml,
    Json,
    Properties,
}

/// CDC topic types accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CdcKind {
    /// Keyed by source-database ids
    SourceId,
    /// Keyed by unique constraints
    Schema,
}

impl From<CdcKind> for TopicType {
    fn from(kind: CdcKind) -> Self {
        match kind {
            CdcKind::SourceId => TopicType::CdcSourceId,
            CdcKind::Schema => TopicType::CdcSchema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_topics_add_cdc() {
        let cli = Cli::parse_from([
            "streams-sink",
            "topics",
            "--config",
            "sink.toml",
            "add-cdc",
            "--type",
            "schema",
            "catalog",
        ]);
        let Commands::Topics(args) = cli.command else {
            panic!("expected topics command");
        };
        assert_eq!(args.config.config, PathBuf::from("sink.toml"));
        match args.command {
            TopicsCommand::AddCdc { kind, topic } => {
                assert_eq!(TopicType::from(kind), TopicType::CdcSchema);
                assert_eq!(topic, "catalog");
            }
            other => panic!("unexpected subcommand: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ingest_defaults() {
        let cli = Cli::parse_from([
            "streams-sink",
            "-vv",
            "ingest",
            "--topic",
            "users",
            "--input",
            "events.jsonl",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest command");
        };
        assert_eq!(args.batch_size, 100);
        assert!(!args.apply_config);
        assert_eq!(args.metrics_port, 0);
    }
}
