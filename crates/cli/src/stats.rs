//! Ingest run statistics.

use std::time::Duration;

use observability::DispatchMetricsAggregator;

/// Statistics from an `ingest` run
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Messages read from the input
    pub messages_read: u64,

    /// Messages handed to the dispatcher
    pub messages_dispatched: u64,

    /// Whether the run stopped on a shutdown signal
    pub interrupted: bool,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-batch dispatch metrics
    pub dispatch: DispatchMetricsAggregator,
}

impl IngestStats {
    /// Messages per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.messages_dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Ingest Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Messages read: {}", self.messages_read);
        println!("   ├─ Messages dispatched: {}", self.messages_dispatched);
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!("   └─ Interrupted: {}", self.interrupted);

        let summary = self.dispatch.summary();

        println!("\n📈 Dispatch");
        println!("   ├─ Batches: {}", summary.total_batches);
        println!(
            "   ├─ Dropped: {} ({:.2}%)",
            summary.dropped_batches, summary.drop_rate
        );
        println!("   ├─ Failed: {}", summary.failed_batches);
        println!("   ├─ Write operations: {}", summary.total_operations);
        println!("   ├─ Rows written: {}", summary.total_events);
        println!("   ├─ Batch size: {}", summary.batch_size);
        println!("   └─ Latency (ms): {}", summary.latency_ms);

        println!();
    }
}
