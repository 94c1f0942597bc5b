//! Lifecycle notifications emitted by the adapter.
//!
//! Subscribe with [`WebhookAdapter::subscribe`](crate::webhooks::WebhookAdapter::subscribe).
//! Events are best effort: with no subscribers they are dropped, and a slow
//! subscriber sees [`tokio::sync::broadcast::error::RecvError::Lagged`]
//! instead of blocking delivery.

use std::time::Duration;

use tokio::sync::broadcast;

use super::monitor::WebhookHealth;
use super::types::WebhookDelivery;
use crate::config::{DeliveryId, WebhookId};

/// A notification about webhooks, deliveries or health.
#[derive(Clone, Debug)]
pub enum AdapterEvent {
    /// A webhook was registered.
    WebhookRegistered {
        /// The new webhook.
        webhook_id: WebhookId,
    },
    /// A webhook was removed.
    WebhookUnregistered {
        /// The removed webhook.
        webhook_id: WebhookId,
    },
    /// A webhook's configuration changed.
    WebhookUpdated {
        /// The updated webhook.
        webhook_id: WebhookId,
    },
    /// A delivery succeeded.
    DeliveryCompleted {
        /// The delivery, in its final state.
        delivery: WebhookDelivery,
    },
    /// An attempt failed and another is scheduled.
    DeliveryRetrying {
        /// The delivery after the failed attempt.
        delivery: WebhookDelivery,
        /// Wait before the next attempt.
        delay: Duration,
    },
    /// A delivery exhausted its retries.
    DeliveryFailed {
        /// The delivery, in its final state.
        delivery: WebhookDelivery,
    },
    /// An attempt was rejected by the webhook's rate limit.
    DeliveryRateLimited {
        /// The rejected delivery.
        delivery: WebhookDelivery,
    },
    /// A delivery was moved to the dead letter queue.
    DeadLetterAdded {
        /// The dead-lettered delivery.
        delivery: WebhookDelivery,
    },
    /// A dead-lettered delivery was retried.
    DeadLetterRetried {
        /// The retried delivery.
        delivery_id: DeliveryId,
        /// Whether the retry succeeded.
        success: bool,
    },
    /// A webhook's health changed after a delivery outcome.
    HealthUpdated {
        /// The webhook.
        webhook_id: WebhookId,
        /// Health after the change.
        health: WebhookHealth,
    },
    /// A webhook is unhealthy.
    HealthUnhealthy {
        /// The webhook.
        webhook_id: WebhookId,
        /// Consecutive failures so far.
        consecutive_failures: u32,
    },
    /// A webhook has been idle longer than the inactivity threshold.
    HealthInactive {
        /// The webhook.
        webhook_id: WebhookId,
        /// How long it has been idle.
        idle_for: Duration,
    },
}

/// Broadcast sender that ignores the absence of receivers.
#[derive(Debug, Clone)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<AdapterEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub(crate) fn emit(&self, event: AdapterEvent) {
        // No receivers is not an error
        let _ = self.sender.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.sender.subscribe()
    }
}
