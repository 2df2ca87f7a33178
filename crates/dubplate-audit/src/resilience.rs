//! Rate pacing for external services.

use tokio::time::{sleep, Duration};

/// Flat per-request pacer.
///
/// The catalog imposes a hard rate limit, and the whole engine is a
/// sequential batch, so instead of a token bucket this simply sleeps a
/// fixed interval before every request. Total scan time stays
/// predictable: roughly `N x interval` for N eligible entries.
#[derive(Debug, Clone, Copy)]
pub struct RatePacer {
    interval: Duration,
}

impl RatePacer {
    /// Pacer that waits `interval` before each request.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Pacer expressed in milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Wait out the configured interval.
    pub async fn pause(&self) {
        sleep(self.interval).await;
    }
}
