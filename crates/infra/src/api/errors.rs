//! API-specific error types
//!
//! Provides error classification for resilient request execution. The
//! executor branches on [`ApiError::category`]: client errors stop
//! immediately, connectivity and server errors trigger probing and retry.

use std::time::Duration;

use tether_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use tether_domain::TetherError;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Device offline, connection refused, timeouts, dead fleet - failover
    Connectivity,
    /// 5xx responses - retryable after probing
    Server,
    /// 4xx responses - never retried, never queued
    Client,
    /// Configuration, serialization and internal errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Device is offline")]
    Offline,

    #[error("No backend endpoint is reachable")]
    BackendUnreachable,

    #[error("Client error {status}: {message}")]
    ClientRequest { status: u16, message: String },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400..=499 => Self::ClientRequest { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Internal(format!("unexpected HTTP status {status}: {message}")),
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Offline | Self::BackendUnreachable | Self::Network(_) | Self::Timeout(_) => {
                ApiErrorCategory::Connectivity
            }
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::ClientRequest { .. } => ApiErrorCategory::Client,
            Self::Config(_) | Self::Serialization(_) | Self::Internal(_) => {
                ApiErrorCategory::Config
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.category() == ApiErrorCategory::Client
    }

    pub fn is_server_error(&self) -> bool {
        self.category() == ApiErrorCategory::Server
    }

    pub fn is_connectivity(&self) -> bool {
        self.category() == ApiErrorCategory::Connectivity
    }

    /// HTTP status carried by the error, if the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ClientRequest { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Connectivity | ApiErrorCategory::Server)
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::Connectivity => ErrorSeverity::Warning,
            ApiErrorCategory::Server | ApiErrorCategory::Client => ErrorSeverity::Error,
            ApiErrorCategory::Config => {
                if matches!(self, Self::Internal(_)) {
                    ErrorSeverity::Critical
                } else {
                    ErrorSeverity::Error
                }
            }
        }
    }
}

impl From<TetherError> for ApiError {
    fn from(err: TetherError) -> Self {
        match err {
            TetherError::Config(msg) | TetherError::InvalidInput(msg) => Self::Config(msg),
            TetherError::Serialization(msg) => Self::Serialization(msg),
            TetherError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convert into the cross-crate error for callers that aggregate failures
impl From<ApiError> for CommonError {
    fn from(err: ApiError) -> Self {
        let retryable = err.should_retry();
        match err {
            ApiError::Timeout(duration) => CommonError::timeout("api request", duration),
            ApiError::Config(msg) => CommonError::config(msg),
            ApiError::Serialization(msg) => CommonError::serialization_format("JSON", msg),
            ApiError::Internal(msg) => CommonError::internal(msg),
            other => CommonError::backend("api", other.to_string(), retryable),
        }
    }
}
