//! # Tether Infrastructure
//!
//! Infrastructure implementations of the core ports and the resilient
//! client built on top of them.
//!
//! This crate contains:
//! - The reqwest HTTP transport, health prober and request dispatcher
//! - Connection tracking and network observers
//! - The pending request queue and its drain
//! - The resilient executor, client facade and background monitor
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `tether-core`
//! - Depends on `tether-common`, `tether-domain` and `tether-core`
//! - Contains all "impure" code (network I/O, timers, tasks)

pub mod api;
pub mod config;
pub mod connection;
pub mod health;
pub mod http;
pub mod observability;
pub mod sync;

// Re-export commonly used items
pub use api::{
    ApiError, ApiResult, ExecuteOptions, ExecuteOutcome, ResilientClient, ResilientClientBuilder,
};
pub use connection::{ConnectionTracker, ManualNetworkObserver, SocketProbeObserver};
pub use health::{HealthMonitor, HttpHealthProber, MonitorConfig};
pub use observability::init_logging;
pub use sync::{DrainSummary, PendingQueue, ReplayCallbacks};
