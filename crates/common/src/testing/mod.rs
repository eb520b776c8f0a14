//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: async polling helpers and assertions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tether_common::testing::poll_until;
//!
//! let drained = poll_until(Duration::from_secs(2), Duration::from_millis(10), || async {
//!     client.pending_count() == 0
//! })
//! .await;
//! assert!(drained);
//! ```

pub mod async_utils;

// Note: assert_eventually_async! is exported at the crate root
pub use async_utils::poll_until;
