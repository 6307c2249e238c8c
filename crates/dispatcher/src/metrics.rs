//! Dispatch counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of a single dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Batches handed to `write_for_topic`
    batches_received: AtomicU64,
    /// Batches dropped without writes
    batches_dropped: AtomicU64,
    /// Successful executor writes
    operations_written: AtomicU64,
    /// Parameter rows carried by successful writes
    events_written: AtomicU64,
    /// Failed executor writes
    write_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches_received(&self) -> u64 {
        self.batches_received.load(Ordering::Relaxed)
    }

    pub fn inc_batches_received(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batches_dropped(&self) -> u64 {
        self.batches_dropped.load(Ordering::Relaxed)
    }

    pub fn inc_batches_dropped(&self) {
        self.batches_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn operations_written(&self) -> u64 {
        self.operations_written.load(Ordering::Relaxed)
    }

    /// Count one successful write carrying `events` rows
    pub fn add_operation_written(&self, events: usize) {
        self.operations_written.fetch_add(1, Ordering::Relaxed);
        self.events_written
            .fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn events_written(&self) -> u64 {
        self.events_written.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn inc_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received(),
            batches_dropped: self.batches_dropped(),
            operations_written: self.operations_written(),
            events_written: self.events_written(),
            write_failures: self.write_failures(),
        }
    }
}

/// Snapshot of dispatch counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub batches_dropped: u64,
    pub operations_written: u64,
    pub events_written: u64,
    pub write_failures: u64,
}
