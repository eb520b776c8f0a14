//! Non-error results of a resilient call that did not reach the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locally synthesized data returned in place of a backend response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackResponse {
    pub data: Value,
    pub offline: bool,
}

impl FallbackResponse {
    /// Wrap fallback data, tagging both the envelope and (for objects) the
    /// payload itself as offline.
    pub fn new(mut data: Value) -> Self {
        if let Value::Object(map) = &mut data {
            map.insert("offline".to_string(), Value::Bool(true));
        }
        Self { data, offline: true }
    }
}

/// Acknowledgement that a request was parked for later replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedAcknowledgement {
    pub dedup_key: String,
    pub queue_size: usize,
    pub message: String,
}

impl QueuedAcknowledgement {
    pub fn new(dedup_key: impl Into<String>, queue_size: usize) -> Self {
        Self {
            dedup_key: dedup_key.into(),
            queue_size,
            message: "Request queued and will be sent when the connection is restored"
                .to_string(),
        }
    }
}
