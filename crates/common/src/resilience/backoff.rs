//! Retry delay schedules

use std::time::Duration;

/// Linear backoff: `base * attempt`
///
/// Attempt numbers are 1-based, so the first retry waits one `base`, the
/// second waits two, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearBackoff {
    base: Duration,
}

impl LinearBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    /// Calculate the delay before retry number `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt)
    }

    /// Sleep for the delay before retry number `attempt`
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
