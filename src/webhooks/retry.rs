//! Retry policy and backoff calculation.
//!
//! The delay waited before attempt `n + 1` is [`RetryConfig::delay`]`(n)`:
//!
//! | Strategy      | Delay for attempt `n`        |
//! |---------------|------------------------------|
//! | `Fixed`       | `initial`                    |
//! | `Linear`      | `initial * n`                |
//! | `Exponential` | `initial * 2^(n - 1)`        |
//!
//! The result is capped by `max_delay`. With `jitter` enabled a random
//! 0-10% of the capped delay is added on top.
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::webhooks::RetryConfig;
//!
//! let retry = RetryConfig::default();
//! assert_eq!(retry.delay(1), Duration::from_secs(1));
//! assert_eq!(retry.delay(6), Duration::from_secs(32));
//! assert_eq!(retry.delay(20), Duration::from_secs(60));
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound on any retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// How the delay grows between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Same delay every time.
    Fixed,
    /// Delay grows by `initial_delay` each attempt.
    Linear,
    /// Delay doubles each attempt.
    #[default]
    Exponential,
}

/// Per-webhook retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first. At least 1.
    pub max_attempts: u32,
    /// Growth strategy.
    pub backoff: BackoffStrategy,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on any single delay. `None` means uncapped.
    pub max_delay: Option<Duration>,
    /// Add 0-10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffStrategy::default(),
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: Some(DEFAULT_MAX_DELAY),
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Sets the total number of attempts.
    #[must_use]
    pub const fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub const fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Sets or removes the delay cap.
    #[must_use]
    pub const fn max_delay(mut self, max_delay: Option<Duration>) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enables or disables jitter.
    #[must_use]
    pub const fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns `true` if another attempt is allowed after `attempt`.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Returns the capped delay after `attempt`, without jitter.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            BackoffStrategy::Fixed => self.initial_delay,
            BackoffStrategy::Linear => self
                .initial_delay
                .checked_mul(attempt)
                .unwrap_or(Duration::MAX),
            BackoffStrategy::Exponential => 2u32
                .checked_pow(attempt - 1)
                .and_then(|factor| self.initial_delay.checked_mul(factor))
                .unwrap_or(Duration::MAX),
        };
        self.max_delay.map_or(delay, |cap| delay.min(cap))
    }

    /// Returns the delay to wait after `attempt` before the next one.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let factor = rand::thread_rng().gen_range(0.0..=0.1);
        delay.saturating_add(delay.mul_f64(factor))
    }

    pub(crate) fn validate(&self) -> Result<(), WebhookError> {
        if self.max_attempts == 0 {
            return Err(WebhookError::invalid("max_attempts must be at least 1"));
        }
        Ok(())
    }
}
