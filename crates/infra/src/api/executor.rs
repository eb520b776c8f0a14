//! Resilient request execution
//!
//! Wraps a caller-supplied request function with retry, failover, offline
//! fallback and queueing.
//!
//! ## Attempt loop
//!
//! | Failure        | Probing                         | Next step                         |
//! |----------------|---------------------------------|-----------------------------------|
//! | network        | fleet probed                    | retry at once if an endpoint answers, otherwise stop |
//! | 5xx            | fleet probed                    | linear backoff, then retry        |
//! | 4xx            | none                            | surfaced immediately              |
//!
//! On exhaustion the request is queued (when asked and the device is
//! online) and the caller receives the fallback payload, the queued
//! acknowledgement, or the last error, in that order of preference.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tether_common::{ErrorClassification, LinearBackoff};
use tether_core::fallback::{self, FallbackCategory};
use tether_domain::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_PROBE_FAILURE_THRESHOLD, DEFAULT_RETRY_BASE_DELAY_MS,
};
use tether_domain::{Endpoint, FallbackResponse, QueuedAcknowledgement, RequestDescriptor};
use tracing::{debug, info, instrument, warn};

use super::errors::{ApiError, ApiErrorCategory, ApiResult};
use crate::connection::ConnectionTracker;
use crate::sync::pending_queue::{PendingQueue, ReplayCallbacks};

/// Retry policy for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Delay before each retry that follows a server error
    pub backoff: LinearBackoff,
    /// Skip the opportunistic pre-flight probe once this many consecutive
    /// failures have been recorded
    pub probe_failure_threshold: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: LinearBackoff::new(Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS)),
            probe_failure_threshold: DEFAULT_PROBE_FAILURE_THRESHOLD,
        }
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Serve `local_fallback_data` instead of failing
    pub use_local_fallback: bool,
    /// Payload served when `use_local_fallback` is set
    pub local_fallback_data: Option<Value>,
    /// Queue the request for replay when it cannot be delivered
    pub should_queue: bool,
    /// Overrides the configured retry count
    pub max_retries: Option<u32>,
    /// Descriptor used when the request has to be queued
    pub request: Option<RequestDescriptor>,
    /// Attached to the queued entry and run when it is replayed
    pub callbacks: ReplayCallbacks,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` (tagged offline) when the backend cannot be reached
    pub fn with_fallback(mut self, data: Value) -> Self {
        self.use_local_fallback = true;
        self.local_fallback_data = Some(data);
        self
    }

    /// Serve generated canned content for `category` as the fallback
    pub fn with_generated_fallback(self, category: FallbackCategory, hints: &Value) -> Self {
        self.with_fallback(fallback::generate(category, hints))
    }

    /// Queue `request` for replay if it cannot be delivered now
    pub fn queue(mut self, request: RequestDescriptor) -> Self {
        self.should_queue = true;
        self.request = Some(request);
        self
    }

    /// Attach the descriptor without asking for queueing
    ///
    /// Used for log context and by a later `queue` decision.
    pub fn describe(mut self, request: RequestDescriptor) -> Self {
        self.request = Some(request);
        self
    }

    /// Override the configured retry count for this call
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Callbacks for the replay of this request, if it ends up queued
    pub fn callbacks(mut self, callbacks: ReplayCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    fn fallback(&self) -> Option<FallbackResponse> {
        if !self.use_local_fallback {
            return None;
        }
        self.local_fallback_data.clone().map(FallbackResponse::new)
    }
}

/// What `execute` produced
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteOutcome<T> {
    /// The backend answered
    Delivered(T),
    /// Local data served instead, tagged offline
    Fallback(FallbackResponse),
    /// The request was parked for replay
    Queued(QueuedAcknowledgement),
}

impl<T> ExecuteOutcome<T> {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    pub fn into_delivered(self) -> Option<T> {
        match self {
            Self::Delivered(value) => Some(value),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackResponse> {
        match self {
            Self::Fallback(response) => Some(response),
            _ => None,
        }
    }

    pub fn queued(&self) -> Option<&QueuedAcknowledgement> {
        match self {
            Self::Queued(ack) => Some(ack),
            _ => None,
        }
    }
}

/// Retry, failover, fallback and enqueue around a request function
#[derive(Clone)]
pub struct ResilientExecutor {
    tracker: Arc<ConnectionTracker>,
    queue: Arc<PendingQueue>,
    config: ExecutorConfig,
}

impl ResilientExecutor {
    pub fn new(
        tracker: Arc<ConnectionTracker>,
        queue: Arc<PendingQueue>,
        config: ExecutorConfig,
    ) -> Self {
        Self { tracker, queue, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `request_fn` against the active endpoint with failover
    ///
    /// `request_fn` receives the endpoint to use for each attempt. It is not
    /// invoked at all while the device is offline.
    ///
    /// # Errors
    ///
    /// - `ApiError::ClientRequest` as soon as the backend answers 4xx
    /// - `ApiError::Offline` when offline with neither fallback nor queueing
    /// - `ApiError::BackendUnreachable` when no endpoint answers a probe
    /// - the last attempt's error when retries run out
    #[instrument(skip_all, fields(path = options.request.as_ref().map(|r| r.endpoint.as_str()).unwrap_or("-")))]
    pub async fn execute<T, F, Fut>(
        &self,
        request_fn: F,
        options: ExecuteOptions,
    ) -> ApiResult<ExecuteOutcome<T>>
    where
        F: Fn(Endpoint) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let state = self.tracker.current();
        if !state.is_online {
            return self.offline_outcome(options);
        }

        if state.backend_available.is_unavailable()
            && state.consecutive_failures < self.config.probe_failure_threshold
        {
            debug!(failures = state.consecutive_failures, "Backend marked down; probing first");
            self.tracker.check_health().await;
        }

        let max_retries = options.max_retries.unwrap_or(self.config.max_retries);
        let mut last_error: Option<ApiError> = None;
        let mut fleet_dead = false;
        let mut retry_immediately = false;

        for attempt in 0..=max_retries {
            if attempt > 0 && !retry_immediately {
                self.config.backoff.wait(attempt).await;
            }
            retry_immediately = false;

            let endpoint = self.tracker.active_endpoint();
            debug!(attempt, url = %endpoint.url, "Attempting request");

            let err = match request_fn(endpoint.clone()).await {
                Ok(value) => {
                    self.tracker.set_status(true, endpoint.is_backup(), Some(endpoint));
                    return Ok(ExecuteOutcome::Delivered(value));
                }
                Err(err) => err,
            };

            match err.category() {
                ApiErrorCategory::Client => {
                    debug!(status = ?err.status(), "Client error; not retrying");
                    return Err(err);
                }
                ApiErrorCategory::Connectivity => {
                    warn!(
                        attempt,
                        url = %endpoint.url,
                        error = %err,
                        severity = %err.severity(),
                        "Request failed; probing for a working endpoint"
                    );
                    last_error = Some(err);
                    match self.tracker.check_health().await {
                        Some(found) => {
                            if found != endpoint {
                                info!(from = %endpoint.url, to = %found.url, "Failing over");
                            }
                            retry_immediately = true;
                        }
                        None => {
                            fleet_dead = true;
                            break;
                        }
                    }
                }
                ApiErrorCategory::Server => {
                    warn!(
                        attempt,
                        url = %endpoint.url,
                        error = %err,
                        severity = %err.severity(),
                        "Server error; probing before retry"
                    );
                    last_error = Some(err);
                    self.tracker.check_health().await;
                }
                ApiErrorCategory::Config => return Err(err),
            }
        }

        let err = if fleet_dead {
            ApiError::BackendUnreachable
        } else {
            last_error.unwrap_or_else(|| ApiError::Internal("no attempt was made".to_string()))
        };
        self.exhausted(err, options)
    }

    fn offline_outcome<T>(&self, options: ExecuteOptions) -> ApiResult<ExecuteOutcome<T>> {
        if let Some(fallback) = options.fallback() {
            debug!("Offline; serving local fallback");
            return Ok(ExecuteOutcome::Fallback(fallback));
        }
        if options.should_queue {
            if let Some(ack) = self.enqueue(options) {
                return Ok(ExecuteOutcome::Queued(ack));
            }
        }
        Err(ApiError::Offline)
    }

    fn exhausted<T>(&self, err: ApiError, options: ExecuteOptions) -> ApiResult<ExecuteOutcome<T>> {
        let fallback = options.fallback();
        let queued = if options.should_queue && self.tracker.is_online() {
            self.enqueue(options)
        } else {
            None
        };

        if let Some(fallback) = fallback {
            info!(error = %err, queued = queued.is_some(), "Retries exhausted; serving local fallback");
            return Ok(ExecuteOutcome::Fallback(fallback));
        }
        if let Some(ack) = queued {
            info!(error = %err, queue_size = ack.queue_size, "Retries exhausted; request queued");
            return Ok(ExecuteOutcome::Queued(ack));
        }
        Err(err)
    }

    fn enqueue(&self, options: ExecuteOptions) -> Option<QueuedAcknowledgement> {
        match options.request {
            Some(request) => Some(self.queue.enqueue(request, options.callbacks)),
            None => {
                warn!("should_queue set without a request descriptor; not queueing");
                None
            }
        }
    }
}
