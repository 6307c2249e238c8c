//! Dispatch metrics
//!
//! Prometheus counters for the sink dispatcher plus an in-memory aggregator
//! used by the CLI to print run summaries.

use std::collections::BTreeMap;

use contracts::{IngestionPhase, TopicType};
use metrics::{counter, histogram};

/// Record a batch handed to the dispatcher
pub fn record_batch_received(topic: &str, events: usize) {
    counter!("streams_sink_batches_received_total", "topic" => topic.to_string()).increment(1);
    histogram!("streams_sink_batch_size").record(events as f64);
}

/// Record a batch dropped without writes (unknown topic or empty batch)
pub fn record_batch_dropped(topic: &str, reason: &'static str) {
    counter!(
        "streams_sink_batches_dropped_total",
        "topic" => topic.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// Record one executed write operation
pub fn record_operation_written(topic_type: TopicType, phase: Option<IngestionPhase>, events: usize) {
    let phase = phase.map(IngestionPhase::as_str).unwrap_or("cypher");
    counter!(
        "streams_sink_operations_written_total",
        "topic_type" => topic_type.name(),
        "phase" => phase
    )
    .increment(1);
    counter!("streams_sink_events_written_total", "topic_type" => topic_type.name())
        .increment(events as u64);
}

/// Record a failed write
pub fn record_write_failure(executor: &str) {
    counter!("streams_sink_write_failures_total", "executor" => executor.to_string())
        .increment(1);
}

/// Record the wall time of one `write_for_topic` call
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("streams_sink_dispatch_latency_ms").record(latency_ms);
}

/// Dispatch metrics aggregator
///
/// Aggregates in memory so a run can print a summary without scraping.
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// Batches seen
    pub total_batches: u64,

    /// Batches dropped without writes
    pub dropped_batches: u64,

    /// Batches that failed (decode or write)
    pub failed_batches: u64,

    /// Write operations executed
    pub total_operations: u64,

    /// Events carried by executed operations
    pub total_events: u64,

    /// Batch size statistics
    pub batch_stats: RunningStats,

    /// Dispatch latency statistics (ms)
    pub latency_stats: RunningStats,

    /// Batches per topic
    pub topic_counts: BTreeMap<String, u64>,
}

impl DispatchMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one batch
    pub fn record_batch(&mut self, topic: &str, events: usize, latency_ms: f64) {
        self.total_batches += 1;
        *self.topic_counts.entry(topic.to_string()).or_insert(0) += 1;
        self.batch_stats.push(events as f64);
        self.latency_stats.push(latency_ms);
    }

    /// Account for a dropped batch
    pub fn record_drop(&mut self) {
        self.dropped_batches += 1;
    }

    /// Account for a failed batch
    pub fn record_failure(&mut self) {
        self.failed_batches += 1;
    }

    /// Account for the writes of one batch
    pub fn record_written(&mut self, operations: usize, events: usize) {
        self.total_operations += operations as u64;
        self.total_events += events as u64;
    }

    /// Summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_batches: self.total_batches,
            dropped_batches: self.dropped_batches,
            failed_batches: self.failed_batches,
            total_operations: self.total_operations,
            total_events: self.total_events,
            drop_rate: if self.total_batches > 0 {
                self.dropped_batches as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
            topic_counts: self.topic_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_batches: u64,
    pub dropped_batches: u64,
    pub failed_batches: u64,
    pub total_operations: u64,
    pub total_events: u64,
    pub drop_rate: f64,
    pub batch_size: StatsSummary,
    pub latency_ms: StatsSummary,
    pub topic_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(
            f,
            "Dropped batches: {} ({:.2}%)",
            self.dropped_batches, self.drop_rate
        )?;
        writeln!(f, "Failed batches: {}", self.failed_batches)?;
        writeln!(f, "Write operations: {}", self.total_operations)?;
        writeln!(f, "Events written: {}", self.total_events)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.topic_counts.is_empty() {
            writeln!(f, "Batches per topic:")?;
            for (topic, count) in &self.topic_counts {
                writeln!(f, "  {}: {}", topic, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
