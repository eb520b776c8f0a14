//! Resilience patterns for transient failures
//!
//! - **Backoff**: delay schedules between retry attempts

pub mod backoff;

pub use backoff::LinearBackoff;
