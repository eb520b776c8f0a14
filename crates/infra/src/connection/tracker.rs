//! Connection state tracker
//!
//! Owns the single [`ConnectionState`] for a client and broadcasts a
//! `backend-status-change` event after every status write. State is guarded
//! by a `parking_lot::Mutex`; events and signals are sent only after the
//! guard is dropped.
//!
//! Two [`Notify`] signals connect the tracker to background work without a
//! reference cycle:
//! - `drain`: fired on the `Unavailable -> Available` transition and after
//!   the device comes back online
//! - `rearm`: fired whenever `using_backup` flips so the poller picks the new
//!   interval immediately

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tether_core::HealthProbe;
use tether_domain::constants::{
    DEGRADED_POLL_INTERVAL_SECS, EVENT_CHANNEL_CAPACITY, HEALTHY_POLL_INTERVAL_SECS,
    ONLINE_SETTLE_DELAY_MS,
};
use tether_domain::{BackendAvailability, ClientEvent, ConnectionState, Endpoint, EndpointRegistry};
use tokio::sync::{broadcast, Notify};
use tracing::{debug, info, instrument, warn};

/// Timing knobs for the tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Poll interval while on the primary and not known to be down
    pub healthy_interval: Duration,
    /// Poll interval while on a backup or with no endpoint reachable
    pub degraded_interval: Duration,
    /// Delay between coming back online and draining the queue
    pub online_settle: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            healthy_interval: Duration::from_secs(HEALTHY_POLL_INTERVAL_SECS),
            degraded_interval: Duration::from_secs(DEGRADED_POLL_INTERVAL_SECS),
            online_settle: Duration::from_millis(ONLINE_SETTLE_DELAY_MS),
        }
    }
}

/// Process-lifetime connectivity verdict shared by every component
pub struct ConnectionTracker {
    registry: EndpointRegistry,
    probe: Arc<dyn HealthProbe>,
    config: TrackerConfig,
    state: Mutex<ConnectionState>,
    events: broadcast::Sender<ClientEvent>,
    drain_signal: Notify,
    rearm_signal: Notify,
}

impl ConnectionTracker {
    pub fn new(registry: EndpointRegistry, probe: Arc<dyn HealthProbe>) -> Self {
        Self::with_config(registry, probe, TrackerConfig::default())
    }

    pub fn with_config(
        registry: EndpointRegistry,
        probe: Arc<dyn HealthProbe>,
        config: TrackerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let state = ConnectionState::initial(registry.primary().clone());
        Self {
            registry,
            probe,
            config,
            state: Mutex::new(state),
            events,
            drain_signal: Notify::new(),
            rearm_signal: Notify::new(),
        }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    pub fn is_online(&self) -> bool {
        self.state.lock().is_online
    }

    pub fn active_endpoint(&self) -> Endpoint {
        self.state.lock().active_endpoint.clone()
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Subscribe to status and queue events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Record a health verdict
    ///
    /// When `endpoint` is given it becomes the active endpoint and
    /// `using_backup` follows its role. Without one, `using_backup = false`
    /// reverts to the primary; asking for a backup without naming one is
    /// ignored.
    pub fn set_status(
        &self,
        available: bool,
        using_backup: bool,
        endpoint: Option<Endpoint>,
    ) -> ConnectionState {
        let (snapshot, previous, backup_flipped) = {
            let mut state = self.state.lock();
            let previous = state.backend_available;
            let was_backup = state.using_backup;

            match endpoint {
                Some(endpoint) => {
                    if endpoint.is_backup() != using_backup {
                        debug!(
                            url = %endpoint.url,
                            requested = using_backup,
                            "using_backup derived from endpoint role"
                        );
                    }
                    state.using_backup = endpoint.is_backup();
                    state.active_endpoint = endpoint;
                }
                None if !using_backup && state.using_backup => {
                    state.using_backup = false;
                    state.active_endpoint = self.registry.primary().clone();
                }
                None if using_backup && !state.using_backup => {
                    warn!("Ignoring request to use a backup without naming one");
                }
                None => {}
            }

            state.backend_available = BackendAvailability::from_verdict(available);
            state.consecutive_failures =
                if available { 0 } else { state.consecutive_failures.saturating_add(1) };
            state.last_checked_at = Some(Utc::now());

            (state.clone(), previous, was_backup != state.using_backup)
        };

        if previous != snapshot.backend_available || backup_flipped {
            info!(
                from = %previous,
                to = %snapshot.backend_available,
                using_backup = snapshot.using_backup,
                url = %snapshot.active_endpoint.url,
                "Backend status changed"
            );
        }

        self.emit(ClientEvent::status_from(&snapshot));

        if previous.is_unavailable() && snapshot.backend_available.is_available() {
            debug!("Backend recovered; scheduling queue drain");
            self.drain_signal.notify_one();
        }
        if backup_flipped {
            self.rearm_signal.notify_one();
        }

        snapshot
    }

    /// Record the host's network reachability
    ///
    /// Going from offline to online schedules an immediate health check and
    /// a queue drain after the settle delay. Requires a Tokio runtime for
    /// that recovery work; without one only the flag is updated.
    pub fn set_online(self: &Arc<Self>, online: bool) {
        let (changed, snapshot) = {
            let mut state = self.state.lock();
            let changed = state.is_online != online;
            state.is_online = online;
            (changed, state.clone())
        };

        if !changed {
            return;
        }

        info!(online, "Network reachability changed");
        self.emit(ClientEvent::status_from(&snapshot));

        if !online {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let tracker = Arc::clone(self);
                handle.spawn(async move {
                    tracker.check_health().await;
                    tokio::time::sleep(tracker.config.online_settle).await;
                    tracker.drain_signal.notify_one();
                });
            }
            Err(_) => warn!("No Tokio runtime; skipping recovery health check"),
        }
    }

    /// Probe the fleet and apply the verdict
    ///
    /// Returns the endpoint that answered, if any.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> Option<Endpoint> {
        let endpoints = self.registry.ordered();
        match self.probe.probe_all(&endpoints).await {
            Some(endpoint) => {
                let using_backup = endpoint.is_backup();
                self.set_status(true, using_backup, Some(endpoint.clone()));
                Some(endpoint)
            }
            None => {
                let using_backup = self.state.lock().using_backup;
                warn!(endpoints = endpoints.len(), "No backend endpoint reachable");
                self.set_status(false, using_backup, None);
                None
            }
        }
    }

    /// Interval until the next background health check
    pub fn poll_interval(&self) -> Duration {
        if self.state.lock().on_healthy_primary() {
            self.config.healthy_interval
        } else {
            self.config.degraded_interval
        }
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub(crate) async fn drain_requested(&self) {
        self.drain_signal.notified().await;
    }

    pub(crate) async fn rearm_requested(&self) {
        self.rearm_signal.notified().await;
    }
}
