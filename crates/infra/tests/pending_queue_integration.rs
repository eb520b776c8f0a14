//! Integration tests for offline queueing and replay
//!
//! **Coverage:**
//! - Offline POST with queueing: acknowledgement, queue size 1
//! - Back online: the background monitor drains and replays exactly once
//! - Duplicate submissions collapse to the latest caller's callbacks
//! - Concurrent drains never replay an entry twice
//! - 4xx on replay drops the entry and reports through `on_error`
//!
//! **Infrastructure:**
//! - WireMock server as the only backend
//! - `ManualNetworkObserver` driving reachability
//! - `ResilientClient` with its `HealthMonitor` running

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use support::{fast_config, healthy_server};
use tether_common::testing::poll_until;
use tether_domain::{ClientEvent, RequestDescriptor};
use tether_infra::{ExecuteOptions, ManualNetworkObserver, ReplayCallbacks, ResilientClient};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn counting_callbacks(successes: &Arc<AtomicUsize>, errors: &Arc<AtomicUsize>) -> ReplayCallbacks {
    let successes = Arc::clone(successes);
    let errors = Arc::clone(errors);
    ReplayCallbacks::default()
        .on_success(move |_| {
            successes.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |_| {
            errors.fetch_add(1, Ordering::SeqCst);
        })
}

// ============================================================================
// Offline queueing and recovery
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn offline_post_is_queued_then_replayed_once_on_reconnect() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({"title": "x"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let observer = Arc::new(ManualNetworkObserver::new(false));
    let mut client = ResilientClient::builder()
        .config(fast_config(&server.uri(), &[]))
        .network_observer(observer.clone())
        .build()
        .unwrap();
    client.start().await.unwrap();
    assert!(!client.state().is_online);

    let mut events = client.subscribe();
    let outcome = client.post::<Value>("/tasks", json!({"title": "x"})).await.unwrap();
    let ack = outcome.queued().expect("queued acknowledgement");
    assert_eq!(ack.queue_size, 1);
    assert_eq!(client.pending_count(), 1);
    assert_eq!(events.recv().await.unwrap(), ClientEvent::PendingRequestsChange { count: 1 });

    observer.set_online(true);

    let queue = Arc::clone(client.queue());
    let drained = poll_until(Duration::from_secs(5), Duration::from_millis(20), || {
        let queue = Arc::clone(&queue);
        async move { queue.is_empty() }
    })
    .await;
    assert!(drained, "queue should drain after reconnect");
    assert!(client.state().is_online);

    // Give a stray second drain the chance to misbehave before verifying.
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.stop().await.unwrap();
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_submissions_keep_only_the_latest_callbacks() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = ResilientClient::from_config(fast_config(&server.uri(), &[])).unwrap();
    client.set_online(false);

    let request = RequestDescriptor::post("/tasks", json!({"title": "x"}));
    let first = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
    let second = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

    for (successes, errors) in [&first, &second] {
        let options =
            ExecuteOptions::new().queue(request.clone()).callbacks(counting_callbacks(successes, errors));
        let outcome = client.request::<Value>(request.clone(), options).await.unwrap();
        assert_eq!(outcome.queued().unwrap().queue_size, 1);
    }
    assert_eq!(client.pending_count(), 1);

    // No monitor is running, so drain by hand.
    client.set_online(true);
    let summary = client.drain().await;
    assert_eq!(summary.delivered, 1);
    assert_eq!(client.pending_count(), 0);

    assert_eq!(first.0.load(Ordering::SeqCst), 0);
    assert_eq!(second.0.load(Ordering::SeqCst), 1);
    assert_eq!(second.1.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Drain semantics
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_drains_replay_each_request_once() {
    let server = healthy_server().await;
    for task in ["/tasks/a", "/tasks/b", "/tasks/c"] {
        Mock::given(method("POST"))
            .and(path(task))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = ResilientClient::from_config(fast_config(&server.uri(), &[])).unwrap();
    for task in ["/tasks/a", "/tasks/b", "/tasks/c"] {
        client.queue().enqueue(RequestDescriptor::post(task, json!({})), ReplayCallbacks::default());
    }

    let (left, right) = tokio::join!(client.drain(), client.drain());
    assert_eq!(left.delivered + right.delivered, 3);
    assert!(left.skipped || right.skipped, "one drain should have been skipped");
    assert_eq!(client.pending_count(), 0);

    // A further drain has nothing left to send.
    assert!(client.drain().await.skipped);
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_replay_is_dropped_and_reported() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad task"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = ResilientClient::from_config(fast_config(&server.uri(), &[])).unwrap();
    let successes = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    client.queue().enqueue(
        RequestDescriptor::post("/tasks", json!({"title": ""})),
        counting_callbacks(&successes, &errors),
    );
    client.queue().enqueue(RequestDescriptor::post("/notes", json!({"body": "n"})), ReplayCallbacks::default());

    let summary = client.drain().await;
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.requeued, 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(successes.load(Ordering::SeqCst), 0);

    let remaining = client.queue().pending();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].request.endpoint, "/notes");
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_online_request_is_queued() {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = ResilientClient::from_config(fast_config(&server.uri(), &[])).unwrap();
    let request = RequestDescriptor::post("/tasks", json!({"title": "later"}));
    let outcome = client
        .request::<Value>(request.clone(), ExecuteOptions::new().queue(request).max_retries(1))
        .await
        .unwrap();

    assert!(outcome.queued().is_some());
    assert_eq!(client.pending_count(), 1);
    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/tasks")
        .count();
    assert_eq!(posts, 2);
}
