//! Client-side request pacing and 429 backoff.
//!
//! The limiter is owned by the client that created it, so independent
//! client instances (e.g. several importers under test) each pace their
//! own requests instead of sharing process-wide state.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

/// Enforces a minimum delay between consecutive requests, and provides
/// the mandatory wait after a 429 response.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_delay: Duration,
    backoff: Duration,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum inter-request delay and
    /// default 429 backoff (used when the server doesn't send `Retry-After`).
    pub fn new(min_delay: Duration, backoff: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_delay,
            backoff,
        }
    }

    /// Waits until the minimum inter-request delay has elapsed since the
    /// previous call, then stamps the clock. Requests are sequential per
    /// client, so the stamp taken here covers the request that follows.
    pub async fn acquire(&self) {
        let wait = {
            let last = self.last_request.lock();
            last.map(|t| self.min_delay.saturating_sub(t.elapsed()))
                .filter(|d| !d.is_zero())
        };
        if let Some(wait) = wait {
            debug!("pacing request: waiting {}ms", wait.as_millis());
            tokio::time::sleep(wait).await;
        }
        *self.last_request.lock() = Some(Instant::now());
    }

    /// Waits out a 429 response: the server-provided `Retry-After` duration
    /// if present, otherwise the configured default penalty window.
    pub async fn backoff(&self, retry_after: Option<Duration>) {
        let wait = retry_after.unwrap_or(self.backoff);
        info!("rate limited: pausing for {} sec", wait.as_secs());
        tokio::time::sleep(wait).await;
        *self.last_request.lock() = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_spaces_out_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(30), Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        // two enforced gaps of >= 30ms each
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5), Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn backoff_prefers_server_duration() {
        let limiter = RateLimiter::new(Duration::from_millis(1), Duration::from_secs(60));
        let start = Instant::now();
        limiter.backoff(Some(Duration::from_millis(20))).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_secs(1));
    }
}
