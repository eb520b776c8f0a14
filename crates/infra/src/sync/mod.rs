//! Pending work queue and replay

pub mod pending_queue;

pub use pending_queue::{
    DrainConfig, DrainSummary, PendingQueue, QueuedRequest, ReplayCallbacks,
};
