//! Minimum-interval rate limiter for Finnhub calls.
//!
//! Finnhub enforces one per-credential budget (60 calls per minute on
//! the free tier), so a single shared limiter spaces out call starts
//! across all concurrent callers. Spacing them 1.1 seconds apart keeps
//! a safety margin under that ceiling.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Minimum spacing between outbound call starts.
pub const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1100);

/// Spaces call starts at least a fixed interval apart.
///
/// The mutex guards only the last-permit timestamp; waiting happens
/// with the lock released, so a caller sleeping out its turn never
/// blocks another caller's bookkeeping.
pub struct RateLimiter {
    /// When the most recent permit was granted; `None` until first use.
    last_permit: Mutex<Option<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with the standard Finnhub spacing.
    pub fn new() -> Self {
        Self::with_interval(RATE_LIMIT_INTERVAL)
    }

    /// Create a limiter with custom spacing.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            last_permit: Mutex::new(None),
            interval,
        }
    }

    /// The configured minimum spacing.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Lock the timestamp mutex, recovering from poison if necessary.
    ///
    /// For rate limiting it's safe to recover from a poisoned mutex:
    /// the worst case is one slightly early permit, which is better
    /// than panicking.
    fn lock_last_permit(&self) -> MutexGuard<'_, Option<Instant>> {
        self.last_permit.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait until at least the configured interval has passed since the
    /// previous permit, then record this call start and return.
    ///
    /// Concurrent callers serialize on the timestamp: whoever observes
    /// a free slot claims it, everyone else re-checks after sleeping.
    /// No fairness between contending callers is guaranteed.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut last_permit = self.lock_last_permit();
                let now = Instant::now();

                match *last_permit {
                    None => {
                        *last_permit = Some(now);
                        return;
                    }
                    Some(previous) => {
                        let elapsed = now.duration_since(previous);
                        if elapsed >= self.interval {
                            *last_permit = Some(now);
                            return;
                        }
                        self.interval - elapsed
                    }
                }
            };

            debug!("Rate limiting: sleeping for {:.2}s", wait_time.as_secs_f64());
            tokio::time::sleep(wait_time).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_default_interval_matches_finnhub_budget() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.interval(), Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::with_interval(Duration::from_secs(1));

        let start = Instant::now();
        limiter.acquire().await;

        // No previous permit, so nothing to wait out.
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_back_to_back_acquires_are_spaced() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(150));

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(150),
            "second permit granted after {elapsed:?}, expected at least 150ms"
        );
    }

    #[tokio::test]
    async fn test_concurrent_acquires_are_spaced() {
        let limiter = Arc::new(RateLimiter::with_interval(Duration::from_millis(100)));
        let permits = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let limiter = Arc::clone(&limiter);
            let permits = Arc::clone(&permits);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                permits.lock().unwrap().push(Instant::now());
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let mut times = permits.lock().unwrap().clone();
        times.sort();
        assert_eq!(times.len(), 4);
        for pair in times.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            // Small tolerance for the delay between permit grant and
            // the recording of the timestamp.
            assert!(
                gap >= Duration::from_millis(90),
                "permits only {gap:?} apart"
            );
        }
    }

    #[tokio::test]
    async fn test_acquire_after_interval_elapsed_is_immediate() {
        let limiter = RateLimiter::with_interval(Duration::from_millis(50));

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(40));
    }
}
