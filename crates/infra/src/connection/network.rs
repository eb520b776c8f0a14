//! Network reachability observers
//!
//! - [`AlwaysOnline`]: server-side contexts with no reachability signal
//! - [`ManualNetworkObserver`]: host-driven, pushes changes over a
//!   `tokio::sync::watch` channel
//! - [`SocketProbeObserver`]: periodically opens a TCP connection to a
//!   well-known address

use std::time::Duration;

use async_trait::async_trait;
use tether_core::NetworkObserver;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::debug;

/// Observer for environments that are always connected
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl NetworkObserver for AlwaysOnline {
    async fn is_online(&self) -> bool {
        true
    }

    fn subscribe(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// Observer whose verdict is set by the host application
#[derive(Debug)]
pub struct ManualNetworkObserver {
    tx: watch::Sender<bool>,
}

impl ManualNetworkObserver {
    pub fn new(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Publish a new verdict; subscribers are only woken on change
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            let changed = *current != online;
            *current = online;
            changed
        });
    }
}

impl Default for ManualNetworkObserver {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl NetworkObserver for ManualNetworkObserver {
    async fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> Option<watch::Receiver<bool>> {
        Some(self.tx.subscribe())
    }
}

/// Observer that treats a successful TCP connect as "online"
#[derive(Debug, Clone)]
pub struct SocketProbeObserver {
    target: String,
    connect_timeout: Duration,
    interval: Duration,
}

impl SocketProbeObserver {
    /// `target` is a `host:port` pair, e.g. `"1.1.1.1:443"`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connect_timeout: Duration::from_secs(3),
            interval: Duration::from_secs(10),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl NetworkObserver for SocketProbeObserver {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(target = %self.target, error = %err, "Reachability probe refused");
                false
            }
            Err(_) => {
                debug!(target = %self.target, "Reachability probe timed out");
                false
            }
        }
    }

    fn subscribe(&self) -> Option<watch::Receiver<bool>> {
        None
    }

    fn poll_interval(&self) -> Option<Duration> {
        Some(self.interval)
    }
}
