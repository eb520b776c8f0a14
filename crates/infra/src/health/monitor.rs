//! Background health monitor
//!
//! One spawned task drives three loops until cancelled:
//!
//! - **poller**: re-checks fleet health on the tracker's adaptive interval
//!   (short on a healthy primary, long on a backup or during an outage) and
//!   restarts its timer when the tracker flips `using_backup`
//! - **drain worker**: runs a queue drain each time the tracker signals
//!   recovery
//! - **reachability listener**: forwards the network observer's verdicts to
//!   the tracker, by subscription or by polling

use std::sync::Arc;
use std::time::Duration;

use tether_core::NetworkObserver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::api::errors::{ApiError, ApiResult};
use crate::connection::ConnectionTracker;
use crate::sync::pending_queue::PendingQueue;

/// Configuration for the health monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Run a health check as soon as the monitor starts
    pub check_on_start: bool,
    /// Maximum time to wait for the task on stop
    pub join_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { check_on_start: true, join_timeout: Duration::from_secs(5) }
    }
}

/// Lifecycle owner for the background loops
pub struct HealthMonitor {
    tracker: Arc<ConnectionTracker>,
    queue: Arc<PendingQueue>,
    observer: Arc<dyn NetworkObserver>,
    config: MonitorConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    pub fn new(
        tracker: Arc<ConnectionTracker>,
        queue: Arc<PendingQueue>,
        observer: Arc<dyn NetworkObserver>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            tracker,
            queue,
            observer,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Start the background loops
    ///
    /// The observer is subscribed before its verdict is read, so a change
    /// published while the task is being spawned still reaches the tracker.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> ApiResult<()> {
        if self.is_running() {
            return Err(ApiError::Internal("Health monitor already running".to_string()));
        }

        info!("Starting health monitor");
        self.cancellation = CancellationToken::new();

        let mut reachability = self.observer.subscribe();
        let online = match reachability.as_mut() {
            Some(rx) => *rx.borrow_and_update(),
            None => self.observer.is_online().await,
        };
        self.tracker.set_online(online);

        let tracker = Arc::clone(&self.tracker);
        let queue = Arc::clone(&self.queue);
        let observer = Arc::clone(&self.observer);
        let check_on_start = self.config.check_on_start;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            tokio::join!(
                Self::poll_loop(Arc::clone(&tracker), check_on_start, cancel.clone()),
                Self::drain_loop(Arc::clone(&tracker), queue, cancel.clone()),
                Self::reachability_loop(tracker, observer, reachability, cancel),
            );
        });

        self.task_handle = Some(handle);
        info!("Health monitor started");
        Ok(())
    }

    /// Stop the loops and wait for the task to finish
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> ApiResult<()> {
        if !self.is_running() {
            return Err(ApiError::Internal("Health monitor not running".to_string()));
        }

        info!("Stopping health monitor");
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Health monitor task panicked: {}", e);
                    return Err(ApiError::Internal("Health monitor task panicked".to_string()));
                }
                Err(_) => {
                    warn!("Health monitor task did not complete within timeout");
                    return Err(ApiError::Timeout(self.config.join_timeout));
                }
            }
        }

        info!("Health monitor stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn poll_loop(
        tracker: Arc<ConnectionTracker>,
        check_on_start: bool,
        cancel: CancellationToken,
    ) {
        if check_on_start && tracker.is_online() {
            tracker.check_health().await;
        }

        loop {
            let interval = tracker.poll_interval();
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Health poller cancelled");
                    break;
                }
                _ = tracker.rearm_requested() => {
                    debug!(next = ?tracker.poll_interval(), "Poll interval re-armed");
                }
                _ = tokio::time::sleep(interval) => {
                    if tracker.is_online() {
                        tracker.check_health().await;
                    } else {
                        debug!("Device offline; skipping scheduled health check");
                    }
                }
            }
        }
    }

    async fn drain_loop(
        tracker: Arc<ConnectionTracker>,
        queue: Arc<PendingQueue>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Drain worker cancelled");
                    break;
                }
                _ = tracker.drain_requested() => {
                    let summary = queue.drain().await;
                    debug!(?summary, "Scheduled drain finished");
                }
            }
        }
    }

    async fn reachability_loop(
        tracker: Arc<ConnectionTracker>,
        observer: Arc<dyn NetworkObserver>,
        reachability: Option<watch::Receiver<bool>>,
        cancel: CancellationToken,
    ) {
        if let Some(mut rx) = reachability {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            debug!("Network observer closed its channel");
                            break;
                        }
                        let online = *rx.borrow_and_update();
                        tracker.set_online(online);
                    }
                }
            }
        } else if let Some(interval) = observer.poll_interval() {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        let online = observer.is_online().await;
                        tracker.set_online(online);
                    }
                }
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("HealthMonitor dropped while running; cancelling tasks");
            self.cancellation.cancel();
            if let Some(handle) = self.task_handle.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tether_common::testing::poll_until;
    use tether_core::HealthProbe;
    use tether_domain::{Endpoint, EndpointRegistry, HealthCheckResult, RequestDescriptor};

    use super::*;
    use crate::api::dispatch::Dispatch;
    use crate::connection::{ManualNetworkObserver, TrackerConfig};
    use crate::sync::pending_queue::{DrainConfig, ReplayCallbacks};

    #[derive(Default)]
    struct CountingProbe {
        healthy: std::sync::atomic::AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HealthProbe for CountingProbe {
        async fn probe(&self, endpoint: &Endpoint) -> HealthCheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy.load(Ordering::SeqCst) {
                HealthCheckResult::reachable(endpoint.clone(), 200, Duration::ZERO)
            } else {
                HealthCheckResult::unreachable(endpoint.clone(), None, Duration::ZERO)
            }
        }
    }

    #[derive(Default)]
    struct CountingDispatch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Dispatch for CountingDispatch {
        async fn dispatch(&self, _: &Endpoint, _: &RequestDescriptor) -> ApiResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"ok": true}))
        }
    }

    struct Fixture {
        probe: Arc<CountingProbe>,
        dispatch: Arc<CountingDispatch>,
        tracker: Arc<ConnectionTracker>,
        queue: Arc<PendingQueue>,
        observer: Arc<ManualNetworkObserver>,
    }

    fn fixture() -> Fixture {
        let probe = Arc::new(CountingProbe::default());
        let dispatch = Arc::new(CountingDispatch::default());
        let registry =
            EndpointRegistry::new("https://primary.example.com", &[] as &[&str], "/health").unwrap();
        let tracker = Arc::new(ConnectionTracker::with_config(
            registry,
            probe.clone(),
            TrackerConfig {
                healthy_interval: Duration::from_millis(20),
                degraded_interval: Duration::from_millis(40),
                online_settle: Duration::from_millis(5),
            },
        ));
        let queue = Arc::new(PendingQueue::new(
            tracker.clone(),
            dispatch.clone(),
            DrainConfig { batch_size: 5, batch_pause: Duration::from_millis(1) },
        ));
        let observer = Arc::new(ManualNetworkObserver::new(true));
        Fixture { probe, dispatch, tracker, queue, observer }
    }

    fn monitor(f: &Fixture) -> HealthMonitor {
        HealthMonitor::new(f.tracker.clone(), f.queue.clone(), f.observer.clone(), MonitorConfig::default())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn start_twice_fails_and_stop_is_clean() {
        let f = fixture();
        let mut monitor = monitor(&f);

        monitor.start().await.unwrap();
        assert!(monitor.is_running());
        assert!(monitor.start().await.is_err());

        monitor.stop().await.unwrap();
        assert!(!monitor.is_running());
        assert!(monitor.stop().await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn poller_keeps_checking_health() {
        let f = fixture();
        f.probe.healthy.store(true, Ordering::SeqCst);
        let mut monitor = monitor(&f);
        monitor.start().await.unwrap();

        let probe = f.probe.clone();
        let polled = poll_until(Duration::from_secs(2), Duration::from_millis(10), || {
            let probe = probe.clone();
            async move { probe.calls.load(Ordering::SeqCst) >= 3 }
        })
        .await;
        assert!(polled);
        assert!(f.tracker.current().backend_available.is_available());

        monitor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn recovery_drains_queue() {
        let f = fixture();
        f.tracker.set_status(false, false, None);
        f.queue.enqueue(RequestDescriptor::post("/tasks", json!({"t": 1})), ReplayCallbacks::default());

        let mut monitor = monitor(&f);
        monitor.start().await.unwrap();
        f.probe.healthy.store(true, Ordering::SeqCst);

        let queue = f.queue.clone();
        let drained = poll_until(Duration::from_secs(2), Duration::from_millis(10), || {
            let queue = queue.clone();
            async move { queue.is_empty() }
        })
        .await;
        assert!(drained);
        assert_eq!(f.dispatch.calls.load(Ordering::SeqCst), 1);

        monitor.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn observer_changes_reach_tracker() {
        let f = fixture();
        f.probe.healthy.store(true, Ordering::SeqCst);
        let mut monitor = monitor(&f);
        monitor.start().await.unwrap();

        f.observer.set_online(false);
        let tracker = f.tracker.clone();
        tether_common::assert_eventually_async!(Duration::from_secs(1), async {
            !tracker.is_online()
        });

        f.queue.enqueue(RequestDescriptor::get("/profile"), ReplayCallbacks::default());
        f.observer.set_online(true);
        let queue = f.queue.clone();
        tether_common::assert_eventually_async!(Duration::from_secs(2), async {
            queue.is_empty()
        });

        monitor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reachability_change_right_after_start_is_not_lost() {
        let f = fixture();
        f.probe.healthy.store(true, Ordering::SeqCst);
        let observer = Arc::new(ManualNetworkObserver::new(false));
        let mut monitor =
            HealthMonitor::new(f.tracker.clone(), f.queue.clone(), observer.clone(), MonitorConfig::default());

        monitor.start().await.unwrap();
        assert!(!f.tracker.is_online());
        // No await between start and the flip; the spawned task has not run yet
        observer.set_online(true);

        let tracker = f.tracker.clone();
        tether_common::assert_eventually_async!(Duration::from_secs(1), async {
            tracker.is_online()
        });

        monitor.stop().await.unwrap();
    }

    /// Healthy only on backups
    #[derive(Default)]
    struct BackupOnlyProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HealthProbe for BackupOnlyProbe {
        async fn probe(&self, endpoint: &Endpoint) -> HealthCheckResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if endpoint.is_backup() {
                HealthCheckResult::reachable(endpoint.clone(), 200, Duration::ZERO)
            } else {
                HealthCheckResult::unreachable(endpoint.clone(), Some(503), Duration::ZERO)
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failover_rearms_poll_timer() {
        let probe = Arc::new(BackupOnlyProbe::default());
        let registry = EndpointRegistry::new(
            "https://primary.example.com",
            &["https://backup.example.com"],
            "/health",
        )
        .unwrap();
        let tracker = Arc::new(ConnectionTracker::with_config(
            registry,
            probe.clone(),
            TrackerConfig {
                healthy_interval: Duration::from_secs(60),
                degraded_interval: Duration::from_millis(30),
                online_settle: Duration::from_millis(5),
            },
        ));
        let queue = Arc::new(PendingQueue::new(
            tracker.clone(),
            Arc::new(CountingDispatch::default()),
            DrainConfig::default(),
        ));
        let mut monitor = HealthMonitor::new(
            tracker.clone(),
            queue,
            Arc::new(ManualNetworkObserver::new(true)),
            MonitorConfig { check_on_start: false, ..MonitorConfig::default() },
        );

        monitor.start().await.unwrap();
        // Poller is now sleeping out the 60s healthy-primary interval
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);

        let active = tracker.check_health().await.unwrap();
        assert!(active.is_backup());
        let after_failover = probe.calls.load(Ordering::SeqCst);

        let polled = poll_until(Duration::from_secs(2), Duration::from_millis(10), || {
            let probe = probe.clone();
            async move { probe.calls.load(Ordering::SeqCst) > after_failover }
        })
        .await;
        assert!(polled, "poller should switch to the degraded interval after failover");
        assert_eq!(tracker.poll_interval(), Duration::from_millis(30));

        monitor.stop().await.unwrap();
    }
}
