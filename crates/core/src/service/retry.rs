//! Retry policy for rate-limited Finnhub calls.
//!
//! Finnhub signals an exhausted budget with HTTP 429. Calls routed
//! through the service absorb up to [`MAX_RETRIES`] rejections with a
//! linearly growing wait before giving up; every other failure is
//! surfaced immediately.

use std::time::Duration;

use async_trait::async_trait;

/// Maximum retries after the initial attempt (4 attempts total).
pub const MAX_RETRIES: u32 = 3;

/// Wait before the first retry; grows linearly per attempt.
pub const BASE_WAIT: Duration = Duration::from_secs(5);

/// Receives human-readable updates while a call waits out rate limits.
///
/// Delivery is best-effort: implementations absorb their own transport
/// failures, and the call proceeds identically whether or not a sink is
/// attached.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Report one retry wait. `progress` is the zero-based index of the
    /// attempt that was just rejected, `total` the retry budget.
    async fn report_progress(&self, progress: u32, total: u32, message: &str);
}

/// Retry schedule for rate-limited calls.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Wait before retry `n` (zero-based) is `base_wait * (n + 1)`.
    pub base_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_wait: BASE_WAIT,
        }
    }
}

impl RetryPolicy {
    /// Wait to apply after the zero-based `attempt` was rate limited.
    pub fn wait_for_attempt(&self, attempt: u32) -> Duration {
        self.base_wait * (attempt + 1)
    }
}
