//! Status notifications consumed by UI collaborators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::connection::ConnectionState;
use crate::constants::{EVENT_BACKEND_STATUS_CHANGE, EVENT_PENDING_REQUESTS_CHANGE};

/// Events emitted by the client
///
/// Serialized with the wire names `backend-status-change` and
/// `pending-requests-change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename = "backend-status-change")]
    BackendStatusChange {
        available: bool,
        using_backup: bool,
        current_url: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "pending-requests-change")]
    PendingRequestsChange { count: usize },
}

impl ClientEvent {
    /// Build a status event from a tracker snapshot
    pub fn status_from(state: &ConnectionState) -> Self {
        Self::BackendStatusChange {
            available: state.backend_available.is_available(),
            using_backup: state.using_backup,
            current_url: state.active_endpoint.url.clone(),
            timestamp: state.last_checked_at.unwrap_or_else(Utc::now),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BackendStatusChange { .. } => EVENT_BACKEND_STATUS_CHANGE,
            Self::PendingRequestsChange { .. } => EVENT_PENDING_REQUESTS_CHANGE,
        }
    }
}
