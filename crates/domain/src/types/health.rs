//! Health probe results

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;

/// Outcome of a single health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub endpoint: Endpoint,
    pub reachable: bool,
    pub observed_at: DateTime<Utc>,
    /// HTTP status when a response arrived at all
    pub status: Option<u16>,
    pub latency: Duration,
}

impl HealthCheckResult {
    pub fn reachable(endpoint: Endpoint, status: u16, latency: Duration) -> Self {
        Self { endpoint, reachable: true, observed_at: Utc::now(), status: Some(status), latency }
    }

    pub fn unreachable(endpoint: Endpoint, status: Option<u16>, latency: Duration) -> Self {
        Self { endpoint, reachable: false, observed_at: Utc::now(), status, latency }
    }
}
