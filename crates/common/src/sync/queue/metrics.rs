use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

use serde::{Deserialize, Serialize};

/// Queue metrics for monitoring
#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub total_enqueued: AtomicU64,
    pub total_replaced: AtomicU64,
    pub total_replayed: AtomicU64,
    pub total_requeued: AtomicU64,
    pub total_dropped: AtomicU64,
    pub current_size: AtomicUsize,
    pub queue_depth_max: AtomicUsize,
}

impl QueueMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry
    pub fn record_enqueue(&self) {
        self.total_enqueued.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record an entry overwritten by a newer intent
    pub fn record_replacement(&self) {
        self.total_replaced.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record a successful replay
    pub fn record_replay(&self) {
        self.total_replayed.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record an entry moved to the back after a transient failure
    pub fn record_requeue(&self) {
        self.total_requeued.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Record an entry discarded after a permanent failure
    pub fn record_drop(&self) {
        self.total_dropped.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Update current size
    pub fn update_size(&self, size: usize) {
        self.current_size.store(size, AtomicOrdering::Relaxed);
        self.queue_depth_max.fetch_max(size, AtomicOrdering::Relaxed);
    }

    /// Get a snapshot of metrics
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            total_enqueued: self.total_enqueued.load(AtomicOrdering::Relaxed),
            total_replaced: self.total_replaced.load(AtomicOrdering::Relaxed),
            total_replayed: self.total_replayed.load(AtomicOrdering::Relaxed),
            total_requeued: self.total_requeued.load(AtomicOrdering::Relaxed),
            total_dropped: self.total_dropped.load(AtomicOrdering::Relaxed),
            current_size: self.current_size.load(AtomicOrdering::Relaxed),
            queue_depth_max: self.queue_depth_max.load(AtomicOrdering::Relaxed),
        }
    }
}

/// Immutable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetricsSnapshot {
    pub total_enqueued: u64,
    pub total_replaced: u64,
    pub total_replayed: u64,
    pub total_requeued: u64,
    pub total_dropped: u64,
    pub current_size: usize,
    pub queue_depth_max: usize,
}

impl QueueMetricsSnapshot {
    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Queue Metrics:\n\
            - Current Size: {} (max {})\n\
            - Total Enqueued: {} (replaced {})\n\
            - Replayed: {}, Requeued: {}, Dropped: {}",
            self.current_size,
            self.queue_depth_max,
            self.total_enqueued,
            self.total_replaced,
            self.total_replayed,
            self.total_requeued,
            self.total_dropped
        )
    }
}
