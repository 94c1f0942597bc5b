//! Configuration types for the webhook delivery library.
//!
//! This module provides the process-wide configuration used to construct a
//! [`WebhookAdapter`](crate::webhooks::WebhookAdapter), plus the validated
//! newtypes shared by the rest of the crate.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`AdapterConfig`]: The adapter-wide settings
//! - [`AdapterConfigBuilder`]: A builder for constructing [`AdapterConfig`] instances
//! - [`BatchDeliveryOptions`]: Optional batching of events per webhook
//! - [`WebhookId`], [`DeliveryId`], [`EventId`]: UUID-backed identifiers
//! - [`WebhookUrl`]: A validated http(s) destination
//! - [`WebhookSecret`]: A signing secret with masked debug output
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::{AdapterConfig, BatchDeliveryOptions};
//!
//! let config = AdapterConfig::builder()
//!     .batch(BatchDeliveryOptions::new(25, Duration::from_secs(2)))
//!     .dead_letter_capacity(500)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.dead_letter_capacity(), 500);
//! ```

mod newtypes;

pub use newtypes::{DeliveryId, EventId, WebhookId, WebhookSecret, WebhookUrl};

use std::time::Duration;

use crate::error::ConfigError;

/// Default capacity of the dead letter queue.
pub const DEFAULT_DEAD_LETTER_CAPACITY: usize = 10_000;

/// Default per-request delivery timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Consecutive failures after which a webhook is reported unhealthy.
pub const DEFAULT_UNHEALTHY_THRESHOLD: u32 = 5;

/// A webhook with no delivery for this long is reported inactive.
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(60 * 60);

/// Maximum number of response body characters kept on a delivery.
pub const DEFAULT_MAX_RESPONSE_SNIPPET: usize = 1_000;

/// Maximum number of deliveries kept in the active delivery log.
pub const DEFAULT_DELIVERY_HISTORY_LIMIT: usize = 10_000;

/// Capacity of the adapter event broadcast channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Process-wide options for batched delivery.
///
/// Batching only applies to webhooks registered with `batch(true)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchDeliveryOptions {
    /// Maximum number of events per batch. Reaching it flushes immediately.
    pub max_batch_size: usize,
    /// Maximum time the first queued event waits before a forced flush.
    pub max_wait_time: Duration,
    /// Whether pending batches are delivered on unregistration and shutdown.
    pub flush_on_shutdown: bool,
}

impl BatchDeliveryOptions {
    /// Creates batch options that flush pending batches on shutdown.
    #[must_use]
    pub const fn new(max_batch_size: usize, max_wait_time: Duration) -> Self {
        Self {
            max_batch_size,
            max_wait_time,
            flush_on_shutdown: true,
        }
    }

    /// Sets whether pending batches are flushed on shutdown.
    #[must_use]
    pub const fn flush_on_shutdown(mut self, flush: bool) -> Self {
        self.flush_on_shutdown = flush;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_batch_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_wait_time.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "max_wait_time",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for BatchDeliveryOptions {
    fn default() -> Self {
        Self::new(10, Duration::from_secs(5))
    }
}

/// Configuration for a [`WebhookAdapter`](crate::webhooks::WebhookAdapter).
///
/// # Thread Safety
///
/// `AdapterConfig` is `Clone`, `Send`, and `Sync`.
///
/// # Example
///
/// ```rust
/// use webhook_delivery::AdapterConfig;
///
/// let config = AdapterConfig::default();
/// assert!(config.batch().is_none());
/// assert_eq!(config.unhealthy_threshold(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    batch: Option<BatchDeliveryOptions>,
    dead_letter_capacity: usize,
    default_timeout: Duration,
    unhealthy_threshold: u32,
    health_check_interval: Option<Duration>,
    inactivity_threshold: Duration,
    max_response_snippet: usize,
    delivery_history_limit: usize,
    event_channel_capacity: usize,
    user_agent_prefix: Option<String>,
}

impl AdapterConfig {
    /// Creates a new builder for constructing an `AdapterConfig`.
    #[must_use]
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::new()
    }

    /// Returns the batch options, if batching is enabled.
    #[must_use]
    pub const fn batch(&self) -> Option<&BatchDeliveryOptions> {
        self.batch.as_ref()
    }

    /// Returns the dead letter queue capacity.
    #[must_use]
    pub const fn dead_letter_capacity(&self) -> usize {
        self.dead_letter_capacity
    }

    /// Returns the timeout used by webhooks that do not set their own.
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Returns the consecutive-failure threshold for unhealthy status.
    #[must_use]
    pub const fn unhealthy_threshold(&self) -> u32 {
        self.unhealthy_threshold
    }

    /// Returns the periodic health sweep interval, if enabled.
    #[must_use]
    pub const fn health_check_interval(&self) -> Option<Duration> {
        self.health_check_interval
    }

    /// Returns the inactivity threshold used by the health sweep.
    #[must_use]
    pub const fn inactivity_threshold(&self) -> Duration {
        self.inactivity_threshold
    }

    /// Returns the maximum number of response body characters kept.
    #[must_use]
    pub const fn max_response_snippet(&self) -> usize {
        self.max_response_snippet
    }

    /// Returns the maximum number of deliveries kept in the delivery log.
    #[must_use]
    pub const fn delivery_history_limit(&self) -> usize {
        self.delivery_history_limit
    }

    /// Returns the capacity of the event broadcast channel.
    #[must_use]
    pub const fn event_channel_capacity(&self) -> usize {
        self.event_channel_capacity
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            batch: None,
            dead_letter_capacity: DEFAULT_DEAD_LETTER_CAPACITY,
            default_timeout: DEFAULT_TIMEOUT,
            unhealthy_threshold: DEFAULT_UNHEALTHY_THRESHOLD,
            health_check_interval: None,
            inactivity_threshold: DEFAULT_INACTIVITY_THRESHOLD,
            max_response_snippet: DEFAULT_MAX_RESPONSE_SNIPPET,
            delivery_history_limit: DEFAULT_DELIVERY_HISTORY_LIMIT,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            user_agent_prefix: None,
        }
    }
}

// Verify AdapterConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AdapterConfig>();
};

/// Builder for constructing [`AdapterConfig`] instances.
///
/// Every field is optional; unset fields take the defaults documented on the
/// `DEFAULT_*` constants of this module.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use webhook_delivery::AdapterConfig;
///
/// let config = AdapterConfig::builder()
///     .default_timeout(Duration::from_secs(5))
///     .health_check_interval(Duration::from_secs(60))
///     .user_agent_prefix("Billing/2.1")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.health_check_interval(), Some(Duration::from_secs(60)));
/// ```
#[derive(Debug, Default)]
pub struct AdapterConfigBuilder {
    batch: Option<BatchDeliveryOptions>,
    dead_letter_capacity: Option<usize>,
    default_timeout: Option<Duration>,
    unhealthy_threshold: Option<u32>,
    health_check_interval: Option<Duration>,
    inactivity_threshold: Option<Duration>,
    max_response_snippet: Option<usize>,
    delivery_history_limit: Option<usize>,
    event_channel_capacity: Option<usize>,
    user_agent_prefix: Option<String>,
}

impl AdapterConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables batched delivery with the given options.
    #[must_use]
    pub const fn batch(mut self, options: BatchDeliveryOptions) -> Self {
        self.batch = Some(options);
        self
    }

    /// Sets the dead letter queue capacity.
    #[must_use]
    pub const fn dead_letter_capacity(mut self, capacity: usize) -> Self {
        self.dead_letter_capacity = Some(capacity);
        self
    }

    /// Sets the timeout used by webhooks without their own timeout.
    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the consecutive-failure threshold for unhealthy status.
    #[must_use]
    pub const fn unhealthy_threshold(mut self, threshold: u32) -> Self {
        self.unhealthy_threshold = Some(threshold);
        self
    }

    /// Enables the periodic health sweep.
    #[must_use]
    pub const fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = Some(interval);
        self
    }

    /// Sets how long a webhook may go without deliveries before it is inactive.
    #[must_use]
    pub const fn inactivity_threshold(mut self, threshold: Duration) -> Self {
        self.inactivity_threshold = Some(threshold);
        self
    }

    /// Sets the maximum number of response body characters kept per delivery.
    #[must_use]
    pub const fn max_response_snippet(mut self, chars: usize) -> Self {
        self.max_response_snippet = Some(chars);
        self
    }

    /// Sets the maximum number of deliveries kept in the delivery log.
    #[must_use]
    pub const fn delivery_history_limit(mut self, limit: usize) -> Self {
        self.delivery_history_limit = Some(limit);
        self
    }

    /// Sets the capacity of the event broadcast channel.
    #[must_use]
    pub const fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = Some(capacity);
        self
    }

    /// Sets the user agent prefix for outbound requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`AdapterConfig`], validating every setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a capacity, threshold or
    /// duration is zero, or if the batch options are invalid.
    pub fn build(self) -> Result<AdapterConfig, ConfigError> {
        let defaults = AdapterConfig::default();

        if let Some(batch) = &self.batch {
            batch.validate()?;
        }

        let config = AdapterConfig {
            batch: self.batch,
            dead_letter_capacity: self
                .dead_letter_capacity
                .unwrap_or(defaults.dead_letter_capacity),
            default_timeout: self.default_timeout.unwrap_or(defaults.default_timeout),
            unhealthy_threshold: self
                .unhealthy_threshold
                .unwrap_or(defaults.unhealthy_threshold),
            health_check_interval: self.health_check_interval,
            inactivity_threshold: self
                .inactivity_threshold
                .unwrap_or(defaults.inactivity_threshold),
            max_response_snippet: self
                .max_response_snippet
                .unwrap_or(defaults.max_response_snippet),
            delivery_history_limit: self
                .delivery_history_limit
                .unwrap_or(defaults.delivery_history_limit),
            event_channel_capacity: self
                .event_channel_capacity
                .unwrap_or(defaults.event_channel_capacity),
            user_agent_prefix: self.user_agent_prefix,
        };

        non_zero("dead_letter_capacity", config.dead_letter_capacity)?;
        non_zero("unhealthy_threshold", config.unhealthy_threshold as usize)?;
        non_zero("delivery_history_limit", config.delivery_history_limit)?;
        non_zero("event_channel_capacity", config.event_channel_capacity)?;
        if config.default_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "default_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        if config.health_check_interval.is_some_and(|i| i.is_zero()) {
            return Err(ConfigError::InvalidValue {
                field: "health_check_interval",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
