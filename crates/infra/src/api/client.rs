//! Resilient API client
//!
//! The entry point applications hold. Wires the endpoint registry, health
//! prober, connection tracker, pending queue and executor together from a
//! [`ClientConfig`], and owns the background [`HealthMonitor`].

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tether_common::LinearBackoff;
use tether_core::{CredentialStore, HealthProbe, NetworkObserver};
use tether_domain::{ClientConfig, ClientEvent, ConnectionState, Endpoint, RequestDescriptor};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use super::auth::NoCredentials;
use super::dispatch::{Dispatch, HttpDispatcher};
use super::errors::{ApiError, ApiResult};
use super::executor::{ExecuteOptions, ExecuteOutcome, ExecutorConfig, ResilientExecutor};
use crate::connection::{AlwaysOnline, ConnectionTracker, TrackerConfig};
use crate::health::{HealthMonitor, HttpHealthProber, MonitorConfig};
use crate::http::HttpClient;
use crate::sync::pending_queue::{DrainConfig, DrainSummary, PendingQueue};

/// Multi-endpoint API client with failover, offline fallback and queueing
pub struct ResilientClient {
    config: ClientConfig,
    tracker: Arc<ConnectionTracker>,
    queue: Arc<PendingQueue>,
    dispatcher: Arc<dyn Dispatch>,
    executor: ResilientExecutor,
    monitor: HealthMonitor,
}

impl ResilientClient {
    /// Create a builder for configuring the client
    pub fn builder() -> ResilientClientBuilder {
        ResilientClientBuilder::default()
    }

    /// Create a client with HTTP transport, no credentials and an
    /// always-online network observer
    pub fn from_config(config: ClientConfig) -> ApiResult<Self> {
        Self::builder().config(config).build()
    }

    /// Send a described request with failover
    ///
    /// The descriptor is also what gets queued when `options.should_queue`
    /// is set.
    #[instrument(skip(self, options), fields(method = %request.method, path = %request.endpoint))]
    pub async fn request<T>(
        &self,
        request: RequestDescriptor,
        options: ExecuteOptions,
    ) -> ApiResult<ExecuteOutcome<T>>
    where
        T: DeserializeOwned,
    {
        let options =
            if options.request.is_none() { options.describe(request.clone()) } else { options };
        let dispatcher = &self.dispatcher;
        let request = &request;

        self.executor
            .execute(
                |endpoint| async move {
                    let body = dispatcher.dispatch(&endpoint, request).await?;
                    Ok(serde_json::from_value::<T>(body)?)
                },
                options,
            )
            .await
    }

    /// GET `path`, never queued
    pub async fn get<T>(&self, path: &str) -> ApiResult<ExecuteOutcome<T>>
    where
        T: DeserializeOwned,
    {
        self.request(RequestDescriptor::get(path), ExecuteOptions::new()).await
    }

    /// POST `payload` to `path`, queued for replay if it cannot be delivered
    pub async fn post<T>(&self, path: &str, payload: Value) -> ApiResult<ExecuteOutcome<T>>
    where
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::post(path, payload);
        self.request(request.clone(), ExecuteOptions::new().queue(request)).await
    }

    /// Run an arbitrary request function with failover
    pub async fn execute<T, F, Fut>(
        &self,
        request_fn: F,
        options: ExecuteOptions,
    ) -> ApiResult<ExecuteOutcome<T>>
    where
        F: Fn(Endpoint) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        self.executor.execute(request_fn, options).await
    }

    pub fn state(&self) -> ConnectionState {
        self.tracker.current()
    }

    /// Subscribe to `backend-status-change` and `pending-requests-change`
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tracker.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.size()
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn tracker(&self) -> &Arc<ConnectionTracker> {
        &self.tracker
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replay queued requests now
    pub async fn drain(&self) -> DrainSummary {
        self.queue.drain().await
    }

    /// Forward a host reachability change
    pub fn set_online(&self, online: bool) {
        self.tracker.set_online(online);
    }

    /// Probe the fleet and update the connection state
    pub async fn check_health(&self) -> Option<Endpoint> {
        self.tracker.check_health().await
    }

    /// Start background health polling, reachability tracking and drains
    pub async fn start(&mut self) -> ApiResult<()> {
        self.monitor.start().await
    }

    pub async fn stop(&mut self) -> ApiResult<()> {
        self.monitor.stop().await
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }
}

/// Builder for [`ResilientClient`]
///
/// Every collaborator is optional except the configuration; defaults are
/// the HTTP prober and dispatcher, no credentials and [`AlwaysOnline`].
#[derive(Default)]
pub struct ResilientClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<Arc<dyn CredentialStore>>,
    observer: Option<Arc<dyn NetworkObserver>>,
    probe: Option<Arc<dyn HealthProbe>>,
    dispatcher: Option<Arc<dyn Dispatch>>,
    monitor: Option<MonitorConfig>,
}

impl ResilientClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn network_observer(mut self, observer: Arc<dyn NetworkObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn health_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Replace the HTTP dispatcher (credentials are then ignored)
    pub fn dispatcher(mut self, dispatcher: Arc<dyn Dispatch>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn monitor_config(mut self, config: MonitorConfig) -> Self {
        self.monitor = Some(config);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if no configuration was set, it fails
    /// validation, or the HTTP transport cannot be built.
    pub fn build(self) -> ApiResult<ResilientClient> {
        let config =
            self.config.ok_or_else(|| ApiError::Config("Client configuration not set".to_string()))?;
        config.validate()?;
        let registry = config.registry()?;

        let probe: Arc<dyn HealthProbe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(HttpHealthProber::with_timeout(
                registry.health_path(),
                config.http.probe_timeout(),
            )?),
        };

        let tracker = Arc::new(ConnectionTracker::with_config(
            registry,
            probe,
            TrackerConfig {
                healthy_interval: config.polling.healthy_interval(),
                degraded_interval: config.polling.degraded_interval(),
                online_settle: config.polling.online_settle(),
            },
        ));

        let dispatcher: Arc<dyn Dispatch> = match self.dispatcher {
            Some(dispatcher) => dispatcher,
            None => {
                let http = HttpClient::builder()
                    .timeout(config.http.request_timeout())
                    .user_agent(config.http.user_agent.clone())
                    .build()?;
                let credentials = self.credentials.unwrap_or_else(|| Arc::new(NoCredentials));
                Arc::new(HttpDispatcher::with_credentials(http, credentials))
            }
        };

        let queue = Arc::new(PendingQueue::new(
            Arc::clone(&tracker),
            Arc::clone(&dispatcher),
            DrainConfig { batch_size: config.queue.batch_size, batch_pause: config.queue.batch_pause() },
        ));

        let executor = ResilientExecutor::new(
            Arc::clone(&tracker),
            Arc::clone(&queue),
            ExecutorConfig {
                max_retries: config.retry.max_retries,
                backoff: LinearBackoff::new(config.retry.base_delay()),
                probe_failure_threshold: config.retry.probe_failure_threshold,
            },
        );

        let observer = self.observer.unwrap_or_else(|| Arc::new(AlwaysOnline));
        let monitor = HealthMonitor::new(
            Arc::clone(&tracker),
            Arc::clone(&queue),
            observer,
            self.monitor.unwrap_or_default(),
        );

        info!(
            primary = %tracker.registry().primary().url,
            backups = tracker.registry().backups().len(),
            "Resilient client ready"
        );

        Ok(ResilientClient { config, tracker, queue, dispatcher, executor, monitor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_config() {
        let result = ResilientClient::builder().build();
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let result = ResilientClient::from_config(ClientConfig::default());
        assert!(matches!(result, Err(ApiError::Config(_))));

        let mut config = ClientConfig::with_primary("https://primary.example.com");
        config.endpoints.backup_urls = vec!["not a url".to_string()];
        assert!(matches!(ResilientClient::from_config(config), Err(ApiError::Config(_))));
    }

    #[test]
    fn build_wires_registry_from_config() {
        let mut config = ClientConfig::with_primary("https://primary.example.com/");
        config.endpoints.backup_urls = vec!["https://backup.example.com".to_string()];
        config.retry.max_retries = 4;

        let client = ResilientClient::from_config(config).unwrap();
        let state = client.state();
        assert_eq!(state.active_endpoint.url, "https://primary.example.com");
        assert!(!state.using_backup);
        assert_eq!(client.tracker().registry().backups().len(), 1);
        assert_eq!(client.pending_count(), 0);
        assert!(!client.is_running());
        assert_eq!(client.config().retry.max_retries, 4);
    }
}
