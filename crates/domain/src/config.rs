//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DRAIN_BATCH_PAUSE_MS, DEFAULT_DRAIN_BATCH_SIZE, DEFAULT_HEALTH_PATH,
    DEFAULT_MAX_RETRIES, DEFAULT_PROBE_FAILURE_THRESHOLD, DEFAULT_PROBE_TIMEOUT_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS, DEGRADED_POLL_INTERVAL_SECS,
    HEALTHY_POLL_INTERVAL_SECS, ONLINE_SETTLE_DELAY_MS,
};
use crate::errors::{Result, TetherError};
use crate::types::EndpointRegistry;

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: EndpointsConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub polling: PollingConfig,
    pub queue: QueueConfig,
    pub logging: LoggingConfig,
}

/// Backend fleet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub primary_url: String,
    pub backup_urls: Vec<String>,
    pub health_path: String,
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub user_agent: String,
}

/// Retry and failover configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Consecutive failures after which calls stop triggering a health check
    pub probe_failure_threshold: u32,
}

/// Background health polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub healthy_interval_secs: u64,
    pub degraded_interval_secs: u64,
    pub online_settle_ms: u64,
}

/// Pending queue drain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub batch_size: usize,
    pub batch_pause_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            primary_url: String::new(),
            backup_urls: Vec::new(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            user_agent: format!("tether/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            probe_failure_threshold: DEFAULT_PROBE_FAILURE_THRESHOLD,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            healthy_interval_secs: HEALTHY_POLL_INTERVAL_SECS,
            degraded_interval_secs: DEGRADED_POLL_INTERVAL_SECS,
            online_settle_ms: ONLINE_SETTLE_DELAY_MS,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { batch_size: DEFAULT_DRAIN_BATCH_SIZE, batch_pause_ms: DEFAULT_DRAIN_BATCH_PAUSE_MS }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl ClientConfig {
    /// Configuration with only the primary URL set
    pub fn with_primary(primary_url: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.endpoints.primary_url = primary_url.into();
        config
    }

    /// Check that the configuration can drive a client
    ///
    /// # Errors
    ///
    /// Returns `TetherError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.primary_url.trim().is_empty() {
            return Err(TetherError::Config("endpoints.primary_url is required".to_string()));
        }
        self.registry()?;

        if self.http.request_timeout_secs == 0 {
            return Err(TetherError::Config("http.request_timeout_secs must be > 0".to_string()));
        }
        if self.http.probe_timeout_secs == 0 {
            return Err(TetherError::Config("http.probe_timeout_secs must be > 0".to_string()));
        }
        if self.polling.healthy_interval_secs == 0 || self.polling.degraded_interval_secs == 0 {
            return Err(TetherError::Config("polling intervals must be > 0".to_string()));
        }
        if self.queue.batch_size == 0 {
            return Err(TetherError::Config("queue.batch_size must be > 0".to_string()));
        }

        Ok(())
    }

    /// Build the endpoint registry described by this configuration
    ///
    /// # Errors
    ///
    /// Returns `TetherError::Config` if any URL is invalid or duplicated.
    pub fn registry(&self) -> Result<EndpointRegistry> {
        EndpointRegistry::new(
            &self.endpoints.primary_url,
            self.endpoints.backup_urls.as_slice(),
            &self.endpoints.health_path,
        )
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl PollingConfig {
    pub fn healthy_interval(&self) -> Duration {
        Duration::from_secs(self.healthy_interval_secs)
    }

    pub fn degraded_interval(&self) -> Duration {
        Duration::from_secs(self.degraded_interval_secs)
    }

    pub fn online_settle(&self) -> Duration {
        Duration::from_millis(self.online_settle_ms)
    }
}

impl QueueConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}
