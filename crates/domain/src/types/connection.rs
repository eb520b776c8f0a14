//! Connection state snapshot shared with observers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::endpoint::Endpoint;
use crate::impl_wire_name_conversions;

/// Tri-state backend availability
///
/// `Unknown` holds from construction until the first health verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendAvailability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl_wire_name_conversions!(BackendAvailability {
    Unknown => "unknown",
    Available => "available",
    Unavailable => "unavailable",
});

impl BackendAvailability {
    pub fn from_verdict(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }

    pub fn is_available(self) -> bool {
        self == Self::Available
    }

    pub fn is_unavailable(self) -> bool {
        self == Self::Unavailable
    }
}

/// Current verdict about connectivity
///
/// Invariant: `using_backup` implies `active_endpoint.role == Backup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    /// Mirrors the host's network-reachability signal
    pub is_online: bool,
    pub backend_available: BackendAvailability,
    pub using_backup: bool,
    pub active_endpoint: Endpoint,
    pub consecutive_failures: u32,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    /// Initial state: online, availability unknown, primary active
    pub fn initial(primary: Endpoint) -> Self {
        Self {
            is_online: true,
            backend_available: BackendAvailability::Unknown,
            using_backup: false,
            active_endpoint: primary,
            consecutive_failures: 0,
            last_checked_at: None,
        }
    }

    /// Device online but no endpoint responded at the last check
    pub fn is_degraded(&self) -> bool {
        self.is_online && self.backend_available.is_unavailable()
    }

    /// Whether the healthy polling cadence applies
    ///
    /// The short interval is used while on the primary and not known to be
    /// down; backups and outages use the long interval.
    pub fn on_healthy_primary(&self) -> bool {
        !self.using_backup && !self.backend_available.is_unavailable()
    }
}
