//! SinkDispatcher - routes topic batches to the write executor

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use contracts::{
    IngestionPhase, IngestionStrategy, PropertyStore, StrategyConfig, TopicType, TopicTypeGroup,
    WriteExecutor, WriteOperation,
};
use ingestion::{decode_batch, CdcStrategy};
use registry::TopicRegistry;

use crate::error::DispatcherError;
use crate::metrics::{DispatchMetrics, MetricsSnapshot};

/// Why a batch produced no writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Batch had no entries
    EmptyBatch,
    /// Topic is not registered under any type
    UnknownTopic,
    /// Cypher topic without a template
    MissingTemplate,
    /// CDC topic type with no strategy configured
    MissingStrategy,
}

impl DropReason {
    /// Label used in logs and metrics
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::EmptyBatch => "empty_batch",
            DropReason::UnknownTopic => "unknown_topic",
            DropReason::MissingTemplate => "missing_template",
            DropReason::MissingStrategy => "missing_strategy",
        }
    }
}

/// Result of one `write_for_topic` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing was written
    Dropped { reason: DropReason },
    /// Operations were handed to the executor
    Written { operations: usize, events: usize },
}

/// Builder for creating a SinkDispatcher
pub struct DispatcherBuilder<S: PropertyStore, E: WriteExecutor> {
    registry: Arc<TopicRegistry<S>>,
    executor: E,
    strategies: StrategyConfig,
}

impl<S: PropertyStore, E: WriteExecutor> DispatcherBuilder<S, E> {
    /// Create a new DispatcherBuilder
    pub fn new(registry: Arc<TopicRegistry<S>>, executor: E) -> Self {
        Self {
            registry,
            executor,
            strategies: StrategyConfig::default(),
        }
    }

    /// Strategy settings (defaults otherwise)
    pub fn strategies(mut self, strategies: StrategyConfig) -> Self {
        self.strategies = strategies;
        self
    }

    /// Build the dispatcher, resolving one strategy per CDC topic type
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(executor = %self.executor.name()))]
    pub fn build(self) -> SinkDispatcher<S, E> {
        let strategies: HashMap<TopicType, CdcStrategy> = TopicType::cdc_types()
            .filter_map(|t| CdcStrategy::for_topic_type(t, &self.strategies).map(|s| (t, s)))
            .collect();
        debug!(strategies = strategies.len(), "Strategies resolved");

        SinkDispatcher {
            registry: self.registry,
            executor: self.executor,
            strategies,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }
}

/// Routes each batch by the type its topic is registered under
///
/// Request-driven: every call runs to completion on the caller's task. The
/// topic type and template are re-read from the registry on every call.
pub struct SinkDispatcher<S: PropertyStore, E: WriteExecutor> {
    registry: Arc<TopicRegistry<S>>,
    executor: E,
    strategies: HashMap<TopicType, CdcStrategy>,
    metrics: Arc<DispatchMetrics>,
}

impl<S: PropertyStore, E: WriteExecutor + Sync> SinkDispatcher<S, E> {
    /// Shorthand for `DispatcherBuilder::new(..).build()`
    pub fn new(registry: Arc<TopicRegistry<S>>, executor: E) -> Self {
        DispatcherBuilder::new(registry, executor).build()
    }

    /// Registry handle
    pub fn registry(&self) -> &Arc<TopicRegistry<S>> {
        &self.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Snapshot of the counters
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Write one batch received on `topic`
    ///
    /// Batches for unregistered topics are dropped silently. For CDC topics
    /// the first malformed entry fails the whole batch before anything is
    /// written. A failing write stops the batch; earlier writes stay applied.
    #[instrument(
        name = "dispatcher_write_for_topic",
        skip(self, batch),
        fields(topic = %topic, events = batch.len())
    )]
    pub async fn write_for_topic(
        &self,
        topic: &str,
        batch: &[Value],
    ) -> Result<DispatchOutcome, DispatcherError> {
        let started = Instant::now();
        self.metrics.inc_batches_received();
        observability::record_batch_received(topic, batch.len());

        let result = self.dispatch(topic, batch).await;
        observability::record_dispatch_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

        if let Ok(DispatchOutcome::Dropped { reason }) = &result {
            self.metrics.inc_batches_dropped();
            observability::record_batch_dropped(topic, reason.as_str());
            debug!(reason = reason.as_str(), "Batch dropped");
        }
        result
    }

    /// Flush the executor
    pub async fn flush(&self) -> Result<(), DispatcherError> {
        Ok(self.executor.flush().await?)
    }

    async fn dispatch(&self, topic: &str, batch: &[Value]) -> Result<DispatchOutcome, DispatcherError> {
        if batch.is_empty() {
            return Ok(DispatchOutcome::Dropped {
                reason: DropReason::EmptyBatch,
            });
        }

        let Some(topic_type) = self.registry.get_topic_type(topic)? else {
            return Ok(DispatchOutcome::Dropped {
                reason: DropReason::UnknownTopic,
            });
        };

        match topic_type.group() {
            TopicTypeGroup::Cypher => self.write_cypher(topic, batch).await,
            TopicTypeGroup::Cdc => match self.strategies.get(&topic_type) {
                Some(strategy) => self.write_cdc(topic_type, strategy, batch).await,
                None => {
                    warn!(topic_type = %topic_type, "No strategy for CDC topic type");
                    Ok(DispatchOutcome::Dropped {
                        reason: DropReason::MissingStrategy,
                    })
                }
            },
        }
    }

    async fn write_cypher(&self, topic: &str, batch: &[Value]) -> Result<DispatchOutcome, DispatcherError> {
        let Some(template) = self.registry.get_cypher_template(topic)? else {
            return Ok(DispatchOutcome::Dropped {
                reason: DropReason::MissingTemplate,
            });
        };

        let operation = WriteOperation::new(template, batch.to_vec());
        self.execute(TopicType::Cypher, None, &operation).await?;
        Ok(DispatchOutcome::Written {
            operations: 1,
            events: operation.len(),
        })
    }

    async fn write_cdc(
        &self,
        topic_type: TopicType,
        strategy: &CdcStrategy,
        batch: &[Value],
    ) -> Result<DispatchOutcome, DispatcherError> {
        let events = decode_batch(batch)?;

        let (mut operations, mut rows) = (0, 0);
        for phase in IngestionPhase::ORDER {
            for operation in strategy.events_for_phase(phase, &events) {
                self.execute(topic_type, Some(phase), &operation).await?;
                operations += 1;
                rows += operation.len();
            }
        }

        info!(topic_type = %topic_type, operations, rows, "CDC batch written");
        Ok(DispatchOutcome::Written {
            operations,
            events: rows,
        })
    }

    async fn execute(
        &self,
        topic_type: TopicType,
        phase: Option<IngestionPhase>,
        operation: &WriteOperation,
    ) -> Result<(), DispatcherError> {
        match self.executor.write(operation).await {
            Ok(()) => {
                self.metrics.add_operation_written(operation.len());
                observability::record_operation_written(topic_type, phase, operation.len());
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_write_failures();
                observability::record_write_failure(self.executor.name());
                warn!(
                    executor = %self.executor.name(),
                    phase = phase.map(IngestionPhase::as_str).unwrap_or("cypher"),
                    error = %e,
                    "Write failed"
                );
                Err(e.into())
            }
        }
    }
}
