//! Pending work queue
//!
//! Holds requests that could not be delivered, at most one per dedup key,
//! and replays them once the backend is reachable again.
//!
//! ## Drain
//!
//! A drain snapshots the queue and replays it in sequential batches; the
//! requests inside a batch run concurrently and a fixed pause separates
//! batches. Each replayed entry is settled against the generation observed
//! in the snapshot, so an entry replaced by a newer intent while in flight
//! is never removed and its replacement is never replayed by the same pass.
//!
//! | Replay result    | Action                                 |
//! |------------------|----------------------------------------|
//! | success          | `on_success`, removed                  |
//! | 4xx              | `on_error`, dropped                    |
//! | network / 5xx    | moved to the back for the next drain   |

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tether_common::error::ErrorClassification;
use tether_common::sync::{DedupItem, DedupQueue, QueueMetricsSnapshot, QueuedEntry};
use tether_domain::constants::{DEFAULT_DRAIN_BATCH_PAUSE_MS, DEFAULT_DRAIN_BATCH_SIZE};
use tether_domain::{ClientEvent, Endpoint, PendingRequest, QueuedAcknowledgement, RequestDescriptor};
use tracing::{debug, info, instrument, warn};

use crate::api::dispatch::Dispatch;
use crate::api::errors::ApiError;
use crate::connection::ConnectionTracker;

/// Invoked with the response body after a queued request is delivered
pub type SuccessCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Invoked when a queued request is rejected by the backend (4xx)
pub type ErrorCallback = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Optional replay callbacks attached to a queued request
#[derive(Clone, Default)]
pub struct ReplayCallbacks {
    /// Called once the replay is delivered
    pub on_success: Option<SuccessCallback>,
    /// Called when the backend rejects the replay
    pub on_error: Option<ErrorCallback>,
}

impl ReplayCallbacks {
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_success.is_none() && self.on_error.is_none()
    }
}

impl fmt::Debug for ReplayCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// A pending request plus the callbacks that travel with it
#[derive(Debug, Clone)]
pub struct QueuedRequest {
    pub pending: PendingRequest,
    pub callbacks: ReplayCallbacks,
}

impl DedupItem for QueuedRequest {
    fn dedup_key(&self) -> &str {
        &self.pending.dedup_key
    }
}

/// Drain pacing
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Requests replayed concurrently per batch; `0` is treated as `1`
    pub batch_size: usize,
    /// Pause between consecutive batches
    pub batch_pause: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_DRAIN_BATCH_SIZE,
            batch_pause: Duration::from_millis(DEFAULT_DRAIN_BATCH_PAUSE_MS),
        }
    }
}

/// What a single drain pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// `true` when the pass did nothing (already draining, empty, offline)
    pub skipped: bool,
    /// Replayed successfully and removed
    pub delivered: usize,
    /// Failed transiently and moved to the back of the queue
    pub requeued: usize,
    /// Rejected by the backend and removed
    pub dropped: usize,
    /// Entries replaced by a newer intent while their replay was in flight
    pub superseded: usize,
}

impl DrainSummary {
    fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }

    /// Entries whose replay finished with any result
    pub fn settled(&self) -> usize {
        self.delivered + self.requeued + self.dropped + self.superseded
    }

    fn record(&mut self, result: ReplayResult) {
        match result {
            ReplayResult::Delivered => self.delivered += 1,
            ReplayResult::Requeued => self.requeued += 1,
            ReplayResult::Dropped => self.dropped += 1,
            ReplayResult::Superseded => self.superseded += 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ReplayResult {
    Delivered,
    Requeued,
    Dropped,
    Superseded,
}

/// Resets the draining flag when a pass ends, including on panic
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Deduplicated queue of undelivered requests
pub struct PendingQueue {
    entries: DedupQueue<QueuedRequest>,
    tracker: Arc<ConnectionTracker>,
    dispatcher: Arc<dyn Dispatch>,
    config: DrainConfig,
    draining: AtomicBool,
}

impl PendingQueue {
    pub fn new(
        tracker: Arc<ConnectionTracker>,
        dispatcher: Arc<dyn Dispatch>,
        config: DrainConfig,
    ) -> Self {
        Self {
            entries: DedupQueue::new(),
            tracker,
            dispatcher,
            config,
            draining: AtomicBool::new(false),
        }
    }

    /// Queue a request, replacing any entry with the same dedup key
    ///
    /// A replacement keeps the older entry's position but discards its
    /// callbacks.
    pub fn enqueue(
        &self,
        request: RequestDescriptor,
        callbacks: ReplayCallbacks,
    ) -> QueuedAcknowledgement {
        let pending = PendingRequest::new(request);
        let id = pending.id;
        let key = pending.dedup_key.clone();
        let method = pending.request.method;
        let path = pending.request.endpoint.clone();

        let outcome = self.entries.push(QueuedRequest { pending, callbacks });
        if outcome.is_replaced() {
            debug!(%id, key = %key, "Replaced queued request; previous callbacks discarded");
        }

        let size = self.entries.len();
        info!(%id, %method, path = %path, queue_size = size, "Request queued for later delivery");
        self.emit_size(size);
        QueuedAcknowledgement::new(key, size)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dedup keys in replay order
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys()
    }

    /// Queued descriptors in replay order
    pub fn pending(&self) -> Vec<PendingRequest> {
        self.entries.snapshot().into_iter().map(|entry| entry.item.pending).collect()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Discard every queued request without invoking callbacks
    pub fn clear(&self) -> usize {
        let removed = self.entries.clear();
        if removed > 0 {
            self.emit_size(0);
        }
        removed
    }

    pub fn metrics(&self) -> QueueMetricsSnapshot {
        self.entries.metrics()
    }

    /// Replay queued requests against the active endpoint
    ///
    /// No-op when a drain is already running, the queue is empty or the
    /// device is offline.
    #[instrument(skip(self))]
    pub async fn drain(&self) -> DrainSummary {
        if !self.tracker.is_online() {
            debug!("Device offline; skipping drain");
            return DrainSummary::skipped();
        }
        if self.entries.is_empty() {
            return DrainSummary::skipped();
        }
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Drain already in progress");
            return DrainSummary::skipped();
        }
        let _guard = DrainGuard(&self.draining);

        let snapshot = self.entries.snapshot();
        let batch_size = self.config.batch_size.max(1);
        let mut summary = DrainSummary::default();
        info!(count = snapshot.len(), batch_size, "Draining pending requests");

        for (index, batch) in snapshot.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_pause).await;
            }
            if !self.tracker.is_online() {
                warn!(remaining = snapshot.len() - index * batch_size, "Went offline mid-drain");
                break;
            }

            let endpoint = self.tracker.active_endpoint();
            let results = join_all(batch.iter().map(|entry| self.replay(&endpoint, entry))).await;
            results.into_iter().for_each(|result| summary.record(result));
        }

        info!(
            delivered = summary.delivered,
            requeued = summary.requeued,
            dropped = summary.dropped,
            superseded = summary.superseded,
            remaining = self.entries.len(),
            "Drain finished"
        );
        if summary.settled() > 0 {
            self.emit_size(self.entries.len());
        }
        summary
    }

    async fn replay(&self, endpoint: &Endpoint, entry: &QueuedEntry<QueuedRequest>) -> ReplayResult {
        let id = entry.item.pending.id;
        let request = &entry.item.pending.request;
        let callbacks = &entry.item.callbacks;

        match self.dispatcher.dispatch(endpoint, request).await {
            Ok(body) => {
                if !self.entries.mark_completed(&entry.key, entry.generation) {
                    return ReplayResult::Superseded;
                }
                debug!(%id, method = %request.method, path = %request.endpoint, "Replayed queued request");
                if let Some(on_success) = &callbacks.on_success {
                    on_success(&body);
                }
                ReplayResult::Delivered
            }
            Err(err) if err.is_client_error() => {
                if !self.entries.mark_dropped(&entry.key, entry.generation) {
                    return ReplayResult::Superseded;
                }
                warn!(
                    %id,
                    method = %request.method,
                    path = %request.endpoint,
                    error = %err,
                    severity = %err.severity(),
                    "Backend rejected queued request; dropping"
                );
                if let Some(on_error) = &callbacks.on_error {
                    on_error(&err);
                }
                ReplayResult::Dropped
            }
            Err(err) => {
                debug!(%id, path = %request.endpoint, error = %err, "Replay failed; keeping request queued");
                if self.entries.requeue(&entry.key, entry.generation) {
                    ReplayResult::Requeued
                } else {
                    ReplayResult::Superseded
                }
            }
        }
    }

    fn emit_size(&self, count: usize) {
        self.tracker.emit(ClientEvent::PendingRequestsChange { count });
    }
}
