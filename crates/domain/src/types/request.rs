//! Serializable request descriptors and queued work

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::impl_wire_name_conversions;

/// HTTP verbs the client can replay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl_wire_name_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

impl HttpMethod {
    /// Whether requests with this verb carry a JSON body
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

/// Everything needed to replay a request later
///
/// `endpoint` is a path relative to whichever backend is active at replay
/// time, never an absolute URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, endpoint: impl Into<String>, payload: Option<Value>) -> Self {
        Self { endpoint: endpoint.into(), method, payload }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, endpoint, None)
    }

    pub fn post(endpoint: impl Into<String>, payload: Value) -> Self {
        Self::new(HttpMethod::Post, endpoint, Some(payload))
    }

    /// Deterministic fingerprint of `(endpoint, method, payload)`
    ///
    /// The payload is rendered through `serde_json`, whose default map keeps
    /// object keys sorted, so logically equal payloads hash identically.
    pub fn dedup_key(&self) -> String {
        let payload = self.payload.as_ref().map(Value::to_string).unwrap_or_default();

        let mut hasher = blake3::Hasher::new();
        hasher.update(self.method.to_string().as_bytes());
        hasher.update(b" ");
        hasher.update(self.endpoint.as_bytes());
        hasher.update(b"\n");
        hasher.update(payload.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// A request waiting for the backend to become reachable
///
/// Only the serializable part lives here; replay callbacks are attached by
/// the queue that owns the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: Uuid,
    pub dedup_key: String,
    pub request: RequestDescriptor,
    pub enqueued_at: DateTime<Utc>,
}

impl PendingRequest {
    pub fn new(request: RequestDescriptor) -> Self {
        Self {
            id: Uuid::now_v7(),
            dedup_key: request.dedup_key(),
            request,
            enqueued_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn dedup_key_is_deterministic() {
        let a = RequestDescriptor::post("/tasks", json!({"title": "x", "done": false}));
        let b = RequestDescriptor::post("/tasks", json!({"done": false, "title": "x"}));
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key().len(), 64);
    }

    #[test]
    fn dedup_key_distinguishes_method_path_and_payload() {
        let base = RequestDescriptor::post("/tasks", json!({"title": "x"}));
        let other_payload = RequestDescriptor::post("/tasks", json!({"title": "y"}));
        let other_path = RequestDescriptor::post("/notes", json!({"title": "x"}));
        let other_method =
            RequestDescriptor::new(HttpMethod::Put, "/tasks", Some(json!({"title": "x"})));

        assert_ne!(base.dedup_key(), other_payload.dedup_key());
        assert_ne!(base.dedup_key(), other_path.dedup_key());
        assert_ne!(base.dedup_key(), other_method.dedup_key());
    }

    #[test]
    fn pending_request_carries_descriptor_key() {
        let descriptor = RequestDescriptor::get("/profile");
        let pending = PendingRequest::new(descriptor.clone());
        assert_eq!(pending.dedup_key, descriptor.dedup_key());
        assert_eq!(pending.request, descriptor);
    }

    #[test]
    fn method_body_rules() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Patch.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    }

    #[test]
    fn descriptor_serializes_method_uppercase() {
        let descriptor = RequestDescriptor::get("/profile");
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["method"], "GET");
        assert!(json.get("payload").is_none());
    }
}
