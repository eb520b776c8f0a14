//! Connection state and network reachability

pub mod network;
pub mod tracker;

pub use network::{AlwaysOnline, ManualNetworkObserver, SocketProbeObserver};
pub use tracker::{ConnectionTracker, TrackerConfig};
