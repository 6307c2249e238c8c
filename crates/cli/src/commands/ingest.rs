//! `ingest` command implementation.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{PropertyStore, SinkBlueprint, WriteExecutor};
use dispatcher::{ConfiguredExecutor, DispatchOutcome, DispatcherBuilder, SinkDispatcher};
use registry::TopicRegistry;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::cli::IngestArgs;
use crate::error::CliError;
use crate::stats::IngestStats;
use crate::store::{open_store, OpenedStore};

/// Execute the `ingest` command
pub async fn run_ingest(args: &IngestArgs) -> Result<()> {
    if args.batch_size == 0 {
        return Err(CliError::invalid_argument("--batch-size", "must be at least 1").into());
    }

    let blueprint = super::load_blueprint(&args.config).with_context(|| {
        format!("Failed to load config from {}", args.config.config.display())
    })?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let stats = match open_store(&blueprint.store)? {
        OpenedStore::Memory(store) => ingest(store, &blueprint, args).await?,
        OpenedStore::File(store) => ingest(store, &blueprint, args).await?,
    };

    info!(
        messages = stats.messages_dispatched,
        batches = stats.dispatch.total_batches,
        duration_secs = stats.duration.as_secs_f64(),
        "Ingest finished"
    );
    stats.print_summary();
    Ok(())
}

async fn ingest<S: PropertyStore>(
    store: S,
    blueprint: &SinkBlueprint,
    args: &IngestArgs,
) -> Result<IngestStats> {
    let registry = Arc::new(TopicRegistry::new(store));
    if args.apply_config {
        registry.apply(&blueprint.topics)?;
        info!(
            topics = blueprint.topics.all_topics().len(),
            "Configured topics applied"
        );
    }

    let executor = ConfiguredExecutor::from_config(&blueprint.executor)?;
    let dispatcher = DispatcherBuilder::new(registry, executor)
        .strategies(blueprint.strategies.clone())
        .build();

    let messages = read_messages(&args.input).await?;
    info!(
        input = %args.input.display(),
        messages = messages.len(),
        topic = %args.topic,
        "Input read"
    );

    let options = DispatchOptions {
        topic: &args.topic,
        batch_size: args.batch_size,
        continue_on_error: args.continue_on_error,
    };
    let stats = dispatch_messages(&dispatcher, &messages, &options, shutdown_signal()).await?;
    dispatcher.flush().await.context("Failed to flush executor")?;
    Ok(stats)
}

/// Read JSON lines from a file, or stdin for `-`
async fn read_messages(input: &Path) -> Result<Vec<Value>, CliError> {
    if input.as_os_str() == "-" {
        parse_lines(BufReader::new(tokio::io::stdin())).await
    } else {
        let file = tokio::fs::File::open(input).await?;
        parse_lines(BufReader::new(file)).await
    }
}

/// One JSON message per line; blank lines are skipped
async fn parse_lines<R: AsyncBufRead + Unpin>(reader: R) -> Result<Vec<Value>, CliError> {
    let mut lines = reader.lines();
    let mut messages = Vec::new();
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let message = serde_json::from_str(&line)
            .map_err(|e| CliError::invalid_input(line_no, e.to_string()))?;
        messages.push(message);
    }

    Ok(messages)
}

struct DispatchOptions<'a> {
    topic: &'a str,
    batch_size: usize,
    continue_on_error: bool,
}

/// Dispatch `messages` in batches until done or `shutdown` resolves
///
/// The shutdown signal is checked between batches; a batch in flight runs to
/// completion.
async fn dispatch_messages<S, E>(
    dispatcher: &SinkDispatcher<S, E>,
    messages: &[Value],
    options: &DispatchOptions<'_>,
    shutdown: impl Future<Output = ()>,
) -> Result<IngestStats>
where
    S: PropertyStore,
    E: WriteExecutor + Sync,
{
    let started = Instant::now();
    let mut stats = IngestStats {
        messages_read: messages.len() as u64,
        ..IngestStats::default()
    };
    tokio::pin!(shutdown);

    for batch in messages.chunks(options.batch_size) {
        let batch_started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping ingest...");
                stats.interrupted = true;
                break;
            }
            result = dispatcher.write_for_topic(options.topic, batch) => result,
        };

        let latency_ms = batch_started.elapsed().as_secs_f64() * 1000.0;
        stats
            .dispatch
            .record_batch(options.topic, batch.len(), latency_ms);
        stats.messages_dispatched += batch.len() as u64;

        match result {
            Ok(DispatchOutcome::Written { operations, events }) => {
                stats.dispatch.record_written(operations, events);
            }
            Ok(DispatchOutcome::Dropped { reason }) => {
                stats.dispatch.record_drop();
                warn!(topic = options.topic, reason = reason.as_str(), "Batch dropped");
            }
            Err(e) => {
                stats.dispatch.record_failure();
                error!(topic = options.topic, error = %e, "Batch failed");
                if !options.continue_on_error {
                    return Err(e).context("Batch dispatch failed");
                }
            }
        }
    }

    stats.duration = started.elapsed();
    Ok(stats)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
