//! Fixed-delay pacing for repair reads.
//!
//! Every `ALL` read makes the coordinator compare and rewrite replicas, which
//! costs the cluster far more than a normal read. [`Throttle`] bounds the
//! repair rate to at most one partition per configured delay. It waits on the
//! tokio clock, so tests can run it under a paused clock without sleeping.

use tokio::time::Duration;
use tracing::trace;

/// Pauses the repair loop for a fixed delay after each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    /// Create a throttle that waits `delay` after each repair.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Create a throttle from a delay in milliseconds.
    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait exactly the configured delay. A zero delay returns immediately
    /// without yielding.
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }

        trace!(delay_ms = self.delay.as_millis() as u64, "throttle: pausing");
        tokio::time::sleep(self.delay).await;
    }
}
