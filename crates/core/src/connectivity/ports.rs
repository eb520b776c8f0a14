//! Port interfaces for connectivity

use std::time::Duration;

use async_trait::async_trait;
use tether_domain::{Endpoint, HealthCheckResult};
use tokio::sync::watch;

/// Trait for probing backend health
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe a single endpoint
    ///
    /// Never fails: any transport error is reported as unreachable.
    async fn probe(&self, endpoint: &Endpoint) -> HealthCheckResult;

    /// Probe endpoints in order and return the first reachable one
    ///
    /// Callers pass the registry's `ordered()` list so the primary is always
    /// tried before backups.
    async fn probe_all(&self, endpoints: &[Endpoint]) -> Option<Endpoint> {
        for endpoint in endpoints {
            if self.probe(endpoint).await.reachable {
                return Some(endpoint.clone());
            }
        }
        None
    }
}

/// Trait for observing the host's network reachability
#[async_trait]
pub trait NetworkObserver: Send + Sync {
    /// Current reachability verdict
    async fn is_online(&self) -> bool;

    /// Subscribe to reachability changes
    ///
    /// Returns `None` when the observer never reports changes.
    fn subscribe(&self) -> Option<watch::Receiver<bool>>;

    /// How often `is_online` should be re-read by a background poller
    ///
    /// Push-based observers (and observers that are always online) return
    /// `None`.
    fn poll_interval(&self) -> Option<Duration> {
        None
    }
}

/// Trait for providing bearer tokens
///
/// Token storage and refresh belong to the session subsystem; the client only
/// asks for whatever token is current.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current bearer token, if the user is signed in
    async fn bearer_token(&self) -> Option<String>;
}
