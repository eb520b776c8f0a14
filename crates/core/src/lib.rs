//! # Tether Core
//!
//! Pure client logic layer - no HTTP or platform code.
//!
//! This crate contains:
//! - Port interfaces (traits) for health probing, network reachability and
//!   credentials
//! - Deterministic fallback content generators
//!
//! ## Architecture Principles
//! - Only depends on `tether-domain`
//! - All external effects via traits
//! - Pure, testable logic

pub mod connectivity;
pub mod fallback;

pub use connectivity::ports::{CredentialStore, HealthProbe, NetworkObserver};
pub use fallback::{generate, generate_from_text, FallbackCategory};
