//! Per-webhook delivery statistics and health tracking.
//!
//! [`StatsTracker`] and [`HealthMonitor`] are updated once per terminal
//! delivery outcome: success or exhausted retries. Rate-limited attempts and
//! intermediate retries do not count.
//!
//! A webhook becomes unhealthy after `threshold` consecutive failures and is
//! healthy again after its next success. Health is informational only; an
//! unhealthy webhook still receives deliveries.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::WebhookId;

// ============================================================================
// Stats
// ============================================================================

/// Running delivery statistics for one webhook.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WebhookStats {
    /// Deliveries that reached a terminal outcome.
    pub total_deliveries: u64,
    /// Deliveries that succeeded.
    pub successful_deliveries: u64,
    /// Deliveries that exhausted their retries.
    pub failed_deliveries: u64,
    /// Mean duration of the final attempt, in milliseconds.
    pub average_response_time_ms: f64,
    /// Last terminal outcome of any kind.
    pub last_delivery_at: Option<DateTime<Utc>>,
    /// Last success.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Last exhausted delivery.
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl WebhookStats {
    /// Fraction of deliveries that succeeded, `0.0` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_deliveries == 0 {
            return 0.0;
        }
        self.successful_deliveries as f64 / self.total_deliveries as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn record(&mut self, success: bool, duration: Duration, at: DateTime<Utc>) {
        self.total_deliveries += 1;
        if success {
            self.successful_deliveries += 1;
            self.last_success_at = Some(at);
        } else {
            self.failed_deliveries += 1;
            self.last_failure_at = Some(at);
        }
        self.last_delivery_at = Some(at);

        // Incremental mean
        let sample = duration.as_secs_f64() * 1000.0;
        self.average_response_time_ms +=
            (sample - self.average_response_time_ms) / self.total_deliveries as f64;
    }
}

/// Stats for every registered webhook.
#[derive(Debug, Default)]
pub struct StatsTracker {
    stats: Mutex<HashMap<WebhookId, WebhookStats>>,
}

impl StatsTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a webhook with zeroed stats.
    pub fn insert(&self, id: WebhookId) {
        self.stats.lock().entry(id).or_default();
    }

    /// Stops tracking a webhook.
    pub fn remove(&self, id: WebhookId) {
        self.stats.lock().remove(&id);
    }

    /// Records a terminal outcome, returning the updated stats.
    pub fn record(&self, id: WebhookId, success: bool, duration: Duration) -> Option<WebhookStats> {
        let mut stats = self.stats.lock();
        let entry = stats.get_mut(&id)?;
        entry.record(success, duration, Utc::now());
        Some(entry.clone())
    }

    /// Returns a copy of a webhook's stats.
    #[must_use]
    pub fn get(&self, id: WebhookId) -> Option<WebhookStats> {
        self.stats.lock().get(&id).cloned()
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health of one webhook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WebhookHealth {
    /// `false` once the consecutive-failure threshold is reached.
    pub healthy: bool,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Last time health was updated or swept.
    pub last_check: DateTime<Utc>,
    /// Success rate as a percentage, `100.0` when there are no deliveries.
    pub uptime_percentage: f64,
    /// Open issues. Cleared on the next success.
    pub issues: Vec<String>,
}

impl Default for WebhookHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            consecutive_failures: 0,
            last_check: Utc::now(),
            uptime_percentage: 100.0,
            issues: Vec::new(),
        }
    }
}

/// Result of recording an outcome in the [`HealthMonitor`].
#[derive(Clone, Debug, PartialEq)]
pub struct HealthChange {
    /// Health after the update.
    pub health: WebhookHealth,
    /// The update crossed the failure threshold.
    pub became_unhealthy: bool,
}

/// Finding raised by a [`HealthMonitor::sweep`].
#[derive(Clone, Debug, PartialEq)]
pub enum HealthAlert {
    /// No delivery for longer than the inactivity threshold.
    Inactive {
        /// The idle webhook.
        webhook_id: WebhookId,
        /// Time since the last delivery, or since registration.
        idle_for: Duration,
    },
    /// The webhook is still unhealthy.
    Unhealthy {
        /// The unhealthy webhook.
        webhook_id: WebhookId,
        /// Current consecutive failures.
        consecutive_failures: u32,
    },
}

/// Health for every registered webhook.
#[derive(Debug)]
pub struct HealthMonitor {
    threshold: u32,
    health: Mutex<HashMap<WebhookId, WebhookHealth>>,
}

impl HealthMonitor {
    /// Creates a monitor that flags webhooks after `threshold` consecutive failures.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            health: Mutex::new(HashMap::new()),
        }
    }

    /// Starts tracking a webhook as healthy.
    pub fn insert(&self, id: WebhookId) {
        self.health.lock().entry(id).or_default();
    }

    /// Stops tracking a webhook.
    pub fn remove(&self, id: WebhookId) {
        self.health.lock().remove(&id);
    }

    /// Returns a copy of a webhook's health.
    #[must_use]
    pub fn get(&self, id: WebhookId) -> Option<WebhookHealth> {
        self.health.lock().get(&id).cloned()
    }

    /// Records a terminal outcome.
    ///
    /// `stats` must already include the outcome.
    pub fn record(
        &self,
        id: WebhookId,
        success: bool,
        error: Option<&str>,
        stats: &WebhookStats,
    ) -> Option<HealthChange> {
        let mut health = self.health.lock();
        let entry = health.get_mut(&id)?;

        let mut became_unhealthy = false;
        if success {
            entry.healthy = true;
            entry.consecutive_failures = 0;
            entry.issues.clear();
        } else {
            entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
            if entry.healthy && entry.consecutive_failures >= self.threshold {
                entry.healthy = false;
                became_unhealthy = true;
                let issue = error.map_or_else(
                    || format!("{} consecutive delivery failures", entry.consecutive_failures),
                    |error| {
                        format!(
                            "{} consecutive delivery failures (last error: {error})",
                            entry.consecutive_failures
                        )
                    },
                );
                entry.issues.push(issue);
            }
        }

        entry.last_check = Utc::now();
        entry.uptime_percentage = if stats.total_deliveries == 0 {
            100.0
        } else {
            stats.success_rate() * 100.0
        };

        Some(HealthChange {
            health: entry.clone(),
            became_unhealthy,
        })
    }

    /// Checks every webhook in `last_activity` for inactivity and lingering
    /// unhealthiness.
    ///
    /// `last_activity` maps each webhook to its last delivery time, or its
    /// registration time if it has never delivered.
    pub fn sweep(
        &self,
        last_activity: &[(WebhookId, DateTime<Utc>)],
        inactivity_threshold: Duration,
        now: DateTime<Utc>,
    ) -> Vec<HealthAlert> {
        let mut health = self.health.lock();
        let mut alerts = Vec::new();

        for (webhook_id, last) in last_activity {
            let Some(entry) = health.get_mut(webhook_id) else {
                continue;
            };
            entry.last_check = now;

            let idle_for = (now - *last).to_std().unwrap_or_default();
            if idle_for > inactivity_threshold {
                alerts.push(HealthAlert::Inactive {
                    webhook_id: *webhook_id,
                    idle_for,
                });
            }
            if !entry.healthy {
                alerts.push(HealthAlert::Unhealthy {
                    webhook_id: *webhook_id,
                    consecutive_failures: entry.consecutive_failures,
                });
            }
        }

        alerts
    }
}
