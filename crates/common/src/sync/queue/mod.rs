// Deduplicating work queue
// Keyed replace-on-collision storage with FIFO replay order

mod core;
pub mod metrics;
mod types;

pub use self::core::DedupQueue;
pub use self::metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use self::types::{DedupItem, PushOutcome, QueuedEntry};
