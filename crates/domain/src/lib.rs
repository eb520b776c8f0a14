//! # Tether Domain
//!
//! Domain types and models for the Tether resilient API client.
//!
//! This crate contains:
//! - Endpoints, the endpoint registry and connection state
//! - Serializable request descriptors and pending work
//! - Client events and non-error outcomes
//! - Configuration structures
//! - Domain error types and constants
//!
//! ## Architecture
//! - No dependencies on other Tether crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
