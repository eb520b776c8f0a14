//! Resilient API client
//!
//! Request execution with failover across an ordered endpoint fleet,
//! offline fallbacks and queued replay.
//!
//! # Architecture
//!
//! - [`ResilientClient`] is the facade applications hold
//! - [`ResilientExecutor`] owns the retry, failover and exhaustion policy
//! - [`Dispatch`] turns a [`tether_domain::RequestDescriptor`] into an HTTP
//!   call, for both live requests and queue replay
//! - Credentials come from a [`tether_core::CredentialStore`]

pub mod auth;
pub mod client;
pub mod dispatch;
pub mod errors;
pub mod executor;

pub use auth::{NoCredentials, StaticCredentials};
pub use client::{ResilientClient, ResilientClientBuilder};
pub use dispatch::{Dispatch, HttpDispatcher};
pub use errors::{ApiError, ApiErrorCategory, ApiResult};
pub use executor::{ExecuteOptions, ExecuteOutcome, ExecutorConfig, ResilientExecutor};
