//! Sliding-window rate limiting per webhook destination.
//!
//! Each webhook with a [`RateLimitConfig`] gets its own [`SlidingWindow`].
//! Admission is checked once per delivery attempt; a rejection ends that
//! attempt without consuming it.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::WebhookError;

/// Maximum number of requests admitted within a trailing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Creates a rate limit of `max_requests` per `window`.
    #[must_use]
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), WebhookError> {
        if self.max_requests == 0 {
            return Err(WebhookError::invalid(
                "rate limit max_requests must be greater than zero",
            ));
        }
        if self.window.is_zero() {
            return Err(WebhookError::invalid(
                "rate limit window must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Sliding window rate limiter.
///
/// Tracks the timestamp of every admitted request within the trailing window.
#[derive(Debug)]
pub struct SlidingWindow {
    /// Maximum requests per window.
    limit: u32,

    /// Window duration.
    window: Duration,

    /// Admitted timestamps within the current window, oldest first.
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    /// Create a new sliding window rate limiter.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            limit: config.max_requests,
            window: config.window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Returns the configuration this limiter enforces.
    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.limit, self.window)
    }

    /// Admits a request now if capacity remains.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Admits a request at `now` if capacity remains.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut timestamps = self.timestamps.lock();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.limit as usize {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Returns how many more requests would be admitted right now.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        let mut timestamps = self.timestamps.lock();
        self.prune(&mut timestamps, Instant::now());
        let used = u32::try_from(timestamps.len()).unwrap_or(u32::MAX);
        self.limit.saturating_sub(used)
    }

    /// Returns how long until the next request would be admitted.
    #[must_use]
    pub fn wait_time(&self) -> Duration {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock();
        self.prune(&mut timestamps, now);

        if timestamps.len() < self.limit as usize {
            return Duration::ZERO;
        }

        // Wait until the oldest request expires
        timestamps.front().map_or(Duration::ZERO, |oldest| {
            self.window.saturating_sub(now.saturating_duration_since(*oldest))
        })
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(front) = timestamps.front() {
            if now.saturating_duration_since(*front) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32, window_ms: u64) -> SlidingWindow {
        SlidingWindow::new(RateLimitConfig::new(max, Duration::from_millis(window_ms)))
    }

    #[test]
    fn test_admits_exactly_limit_within_window() {
        let limiter = limiter(3, 1000);
        let start = Instant::now();

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(10)));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(20)));
        assert!(!limiter.try_acquire_at(start + Duration::from_millis(30)));
    }

    #[test]
    fn test_huge_limit_does_not_preallocate() {
        let limiter = SlidingWindow::new(RateLimitConfig::new(u32::MAX, Duration::from_secs(1)));

        assert!(limiter.try_acquire());
        assert_eq!(limiter.remaining(), u32::MAX - 1);
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 1000);
        let start = Instant::now();

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(500)));
        assert!(!limiter.try_acquire_at(start + Duration::from_millis(999)));

        // First request has left the window, second has not.
        assert!(limiter.try_acquire_at(start + Duration::from_millis(1000)));
        assert!(!limiter.try_acquire_at(start + Duration::from_millis(1200)));
        assert!(limiter.try_acquire_at(start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_rejection_does_not_consume_capacity() {
        let limiter = limiter(1, 1000);
        let start = Instant::now();

        assert!(limiter.try_acquire_at(start));
        for offset in [1, 2, 3] {
            assert!(!limiter.try_acquire_at(start + Duration::from_millis(offset)));
        }
        assert!(limiter.try_acquire_at(start + Duration::from_millis(1000)));
    }

    #[test]
    fn test_remaining_and_wait_time() {
        let limiter = limiter(2, 60_000);
        assert_eq!(limiter.remaining(), 2);
        assert_eq!(limiter.wait_time(), Duration::ZERO);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        assert_eq!(limiter.remaining(), 0);
        let wait = limiter.wait_time();
        assert!(wait > Duration::from_secs(59));
        assert!(wait <= Duration::from_secs(60));
    }

    #[test]
    fn test_config_validation() {
        assert!(RateLimitConfig::new(1, Duration::from_secs(1)).validate().is_ok());
        assert!(RateLimitConfig::new(0, Duration::from_secs(1)).validate().is_err());
        assert!(RateLimitConfig::new(1, Duration::ZERO).validate().is_err());
    }
}
