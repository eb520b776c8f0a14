//! Synchronization primitives for deferred delivery
//!
//! ## Submodules
//!
//! - **`queue`**: deduplicating in-memory work queue with generation-aware
//!   completion, used to park requests until a backend is reachable

pub mod queue;

// Re-export commonly used types from queue
pub use queue::{DedupItem, DedupQueue, PushOutcome, QueueMetrics, QueueMetricsSnapshot, QueuedEntry};
