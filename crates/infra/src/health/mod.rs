//! Endpoint health probing and the background monitor

pub mod monitor;
pub mod prober;

pub use monitor::{HealthMonitor, MonitorConfig};
pub use prober::HttpHealthProber;
