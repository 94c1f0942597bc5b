//! The webhook adapter: registration, delivery, retries and monitoring in
//! one handle.
//!
//! [`WebhookAdapter`] owns every piece of state: the registry, rate
//! limiters, batch queues, delivery history, dead letter queue, stats and
//! health. It is cheap to clone; clones share the same state.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use webhook_delivery::webhooks::{WebhookAdapter, WebhookEvent, WebhookRegistrationBuilder};
//! use webhook_delivery::AdapterConfig;
//!
//! let adapter = WebhookAdapter::new(AdapterConfig::default())?;
//!
//! let webhook_id = adapter.register_webhook(
//!     WebhookRegistrationBuilder::new("https://hooks.example.com/orders", ["order.*"])
//!         .secret("whsec_123")
//!         .build(),
//! )?;
//!
//! let results = adapter
//!     .deliver_event(WebhookEvent::new("order.created", json!({"id": 42})))
//!     .await;
//!
//! let delivery = &results[&webhook_id];
//! println!("{} after {} attempt(s)", delivery.status, delivery.attempt);
//! ```
//!
//! # Delivery Outcomes
//!
//! `deliver_event` never fails. Each matched webhook gets a
//! [`WebhookDelivery`] whose status is one of:
//!
//! - `Success`: a 2xx response was received
//! - `Failed` with a rate-limit error: the attempt was not sent and can be
//!   re-run with [`WebhookAdapter::retry_delivery`]
//! - `Failed` otherwise: retries were exhausted and the delivery is in the
//!   dead letter queue
//!
//! Webhooks that batch only appear in the result when the event completes a
//! batch.
//!
//! # Thread Safety
//!
//! `WebhookAdapter` is `Send + Sync`. Internal locks are never held across
//! an `.await`, so deliveries to different webhooks proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::batch::{batch_event, BatchAccumulator};
use super::dead_letter::DeadLetterQueue;
use super::delivery::{is_exhausted, DeliveryEngine, DeliverySink};
use super::errors::WebhookError;
use super::events::{AdapterEvent, EventBus};
use super::history::DeliveryLog;
use super::monitor::{HealthAlert, HealthMonitor, StatsTracker, WebhookHealth, WebhookStats};
use super::rate_limit::SlidingWindow;
use super::registry::WebhookRegistry;
use super::types::{
    DeliveryStatus, WebhookConfig, WebhookDelivery, WebhookEvent, WebhookPatch,
    WebhookRegistration,
};
use crate::clients::{user_agent, HttpTransport, ReqwestTransport};
use crate::config::{AdapterConfig, DeliveryId, WebhookId};

/// Webhook delivery facade.
///
/// See the [module documentation](self) for an overview.
#[derive(Clone)]
pub struct WebhookAdapter {
    inner: Arc<Inner>,
}

// Verify WebhookAdapter is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookAdapter>();
};

impl std::fmt::Debug for WebhookAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAdapter")
            .field("config", &self.inner.config)
            .field("webhooks", &self.inner.registry.read().len())
            .field("dead_letters", &self.inner.dead_letters.len())
            .finish_non_exhaustive()
    }
}

struct Inner {
    config: AdapterConfig,
    registry: RwLock<WebhookRegistry>,
    limiters: Mutex<HashMap<WebhookId, Arc<SlidingWindow>>>,
    batches: Option<BatchAccumulator>,
    dead_letters: DeadLetterQueue,
    stats: StatsTracker,
    health: HealthMonitor,
    deliveries: Mutex<DeliveryLog>,
    events: EventBus,
    engine: DeliveryEngine,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl WebhookAdapter {
    /// Creates an adapter that delivers over HTTPS with `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Http`] if the HTTP client cannot be built.
    pub fn new(config: AdapterConfig) -> Result<Self, WebhookError> {
        let transport = ReqwestTransport::try_new(config.user_agent_prefix())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates an adapter that delivers through a custom transport.
    #[must_use]
    pub fn with_transport(config: AdapterConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let engine = DeliveryEngine::new(
            transport,
            user_agent(config.user_agent_prefix()),
            config.max_response_snippet(),
        );

        let inner = Inner {
            registry: RwLock::new(WebhookRegistry::new(config.default_timeout())),
            limiters: Mutex::new(HashMap::new()),
            batches: config.batch().copied().map(BatchAccumulator::new),
            dead_letters: DeadLetterQueue::new(config.dead_letter_capacity()),
            stats: StatsTracker::new(),
            health: HealthMonitor::new(config.unhealthy_threshold()),
            deliveries: Mutex::new(DeliveryLog::new(config.delivery_history_limit())),
            events: EventBus::new(config.event_channel_capacity()),
            engine,
            health_task: Mutex::new(None),
            config,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the adapter configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// Subscribes to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.inner.events.subscribe()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Validates and registers a webhook.
    ///
    /// # Errors
    ///
    /// Returns a [`WebhookError`] if the registration is invalid. Nothing is
    /// registered in that case.
    pub fn register_webhook(&self, registration: WebhookRegistration) -> Result<WebhookId, WebhookError> {
        let inner = &self.inner;
        let (id, url) = {
            let mut registry = inner.registry.write();
            let id = registry.register(registration)?;
            let config = registry.get(id).ok_or(WebhookError::WebhookNotFound { id })?;

            if let Some(rate_limit) = config.rate_limit {
                inner
                    .limiters
                    .lock()
                    .insert(id, Arc::new(SlidingWindow::new(rate_limit)));
            }
            inner.stats.insert(id);
            inner.health.insert(id);
            inner.deliveries.lock().insert_webhook(id);
            (id, config.url.to_string())
        };

        tracing::info!(webhook_id = %id, url = %url, "Webhook registered");
        inner.events.emit(AdapterEvent::WebhookRegistered { webhook_id: id });
        Ok(id)
    }

    /// Removes a webhook and all of its state. Returns `false` for an unknown id.
    ///
    /// Queued batch events are delivered first when the batch options have
    /// `flush_on_shutdown` set, and dropped otherwise. Dead-lettered
    /// deliveries for the webhook are kept.
    pub async fn unregister_webhook(&self, id: WebhookId) -> bool {
        let inner = &self.inner;
        let (removed, pending) = {
            let mut registry = inner.registry.write();
            let Some(removed) = registry.unregister(id) else {
                return false;
            };
            // Taken under the registry lock so no event can be queued after it
            let pending = inner
                .batches
                .as_ref()
                .map(|batches| batches.remove(id))
                .unwrap_or_default();
            (removed, pending)
        };

        if !pending.is_empty() {
            let flush = inner
                .batches
                .as_ref()
                .is_some_and(|batches| batches.options().flush_on_shutdown);
            if flush {
                let delivery = WebhookDelivery::new(id, batch_event(&pending));
                inner.deliveries.lock().upsert(&delivery);
                let sink = ClosingSink {
                    inner,
                    config: removed,
                };
                inner.engine.run(&sink, delivery).await;
            } else {
                tracing::debug!(webhook_id = %id, dropped = pending.len(), "Dropping queued batch events");
            }
        }

        inner.limiters.lock().remove(&id);
        inner.stats.remove(id);
        inner.health.remove(id);
        inner.deliveries.lock().remove_webhook(id);

        tracing::info!(webhook_id = %id, "Webhook unregistered");
        inner.events.emit(AdapterEvent::WebhookUnregistered { webhook_id: id });
        true
    }

    /// Applies a partial update. Returns `Ok(false)` for an unknown id.
    ///
    /// Stats, health and delivery history are kept. Changing the rate limit
    /// starts a fresh window.
    ///
    /// # Errors
    ///
    /// Returns a [`WebhookError`] if the patched configuration is invalid.
    /// The webhook is left unchanged in that case.
    pub fn update_webhook(&self, id: WebhookId, patch: WebhookPatch) -> Result<bool, WebhookError> {
        let inner = &self.inner;
        let Some((previous, updated)) = inner.registry.write().update(id, patch)? else {
            return Ok(false);
        };

        if previous.rate_limit != updated.rate_limit {
            let mut limiters = inner.limiters.lock();
            limiters.remove(&id);
            if let Some(rate_limit) = updated.rate_limit {
                limiters.insert(id, Arc::new(SlidingWindow::new(rate_limit)));
            }
        }

        tracing::debug!(webhook_id = %id, "Webhook updated");
        inner.events.emit(AdapterEvent::WebhookUpdated { webhook_id: id });
        Ok(true)
    }

    /// Enables or disables a webhook. Returns `false` for an unknown id.
    pub fn set_webhook_enabled(&self, id: WebhookId, enabled: bool) -> bool {
        let found = self.inner.registry.write().set_enabled(id, enabled);
        if found {
            tracing::debug!(webhook_id = %id, enabled, "Webhook enabled flag changed");
            self.inner.events.emit(AdapterEvent::WebhookUpdated { webhook_id: id });
        }
        found
    }

    /// Gets a webhook by id.
    #[must_use]
    pub fn get_webhook(&self, id: WebhookId) -> Option<WebhookConfig> {
        self.inner.registry.read().get(id).cloned()
    }

    /// Lists all webhooks in registration order.
    #[must_use]
    pub fn list_webhooks(&self) -> Vec<WebhookConfig> {
        self.inner
            .registry
            .read()
            .list()
            .into_iter()
            .cloned()
            .collect()
    }

    // ========================================================================
    // Delivery
    // ========================================================================

    /// Delivers an event to every enabled webhook subscribed to its type.
    ///
    /// Deliveries to different webhooks run concurrently; each one retries
    /// on its own schedule. The returned map holds the final state of every
    /// delivery made, keyed by webhook.
    pub async fn deliver_event(&self, event: WebhookEvent) -> HashMap<WebhookId, WebhookDelivery> {
        let inner = &self.inner;
        let targets: Vec<(WebhookId, bool)> = inner
            .registry
            .read()
            .matching(event.event_type())
            .iter()
            .map(|config| (config.id, config.batch))
            .collect();

        tracing::debug!(
            event_id = %event.id(),
            event_type = event.event_type(),
            webhooks = targets.len(),
            "Delivering event"
        );

        let mut pending = Vec::with_capacity(targets.len());
        for (webhook_id, batch) in targets {
            let event = match (&inner.batches, batch) {
                (Some(batches), true) => {
                    let flushed = batches.accept(webhook_id, event.clone(), |generation| {
                        inner.spawn_batch_timer(webhook_id, generation)
                    });
                    match flushed {
                        Some(events) => batch_event(&events),
                        None => continue,
                    }
                }
                _ => event.clone(),
            };
            pending.push(inner.deliver_new(webhook_id, event));
        }

        join_all(pending)
            .await
            .into_iter()
            .map(|delivery| (delivery.webhook_id, delivery))
            .collect()
    }

    /// Re-runs a delivery.
    ///
    /// Looks in the active history first, then in the dead letter queue:
    ///
    /// - a rate-limited delivery is re-run at the same attempt number
    /// - a dead-lettered or succeeded delivery is re-run at the next attempt
    /// - a delivery still in flight is returned as it is
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::DeliveryNotFound`] for an unknown id and
    /// [`WebhookError::WebhookNotFound`] if a dead-lettered delivery's
    /// webhook no longer exists.
    pub async fn retry_delivery(&self, delivery_id: DeliveryId) -> Result<WebhookDelivery, WebhookError> {
        let inner = &self.inner;
        let active = inner.deliveries.lock().get(delivery_id);

        let (mut delivery, from_dead_letter) = match active {
            Some(delivery) => match delivery.status {
                DeliveryStatus::Pending | DeliveryStatus::Retrying => return Ok(delivery),
                DeliveryStatus::Failed => (delivery, false),
                DeliveryStatus::Success => {
                    let mut delivery = delivery;
                    delivery.attempt += 1;
                    (delivery, false)
                }
            },
            None => {
                let entry = inner
                    .dead_letters
                    .get(delivery_id)
                    .ok_or(WebhookError::DeliveryNotFound { id: delivery_id })?;
                let registered = inner.registry.read().contains(entry.webhook_id);
                if !registered {
                    return Err(WebhookError::WebhookNotFound {
                        id: entry.webhook_id,
                    });
                }
                let mut delivery = inner
                    .dead_letters
                    .take(delivery_id)
                    .ok_or(WebhookError::DeliveryNotFound { id: delivery_id })?;
                delivery.attempt += 1;
                (delivery, true)
            }
        };

        reset_for_retry(&mut delivery);
        inner.deliveries.lock().upsert(&delivery);

        tracing::info!(
            delivery_id = %delivery_id,
            webhook_id = %delivery.webhook_id,
            attempt = delivery.attempt,
            "Retrying delivery"
        );
        let delivery = inner.engine.run(&**inner, delivery).await;

        if from_dead_letter {
            inner.events.emit(AdapterEvent::DeadLetterRetried {
                delivery_id,
                success: delivery.is_success(),
            });
        }
        Ok(delivery)
    }

    /// Retries every dead-lettered delivery once, returning how many succeeded.
    ///
    /// Deliveries that fail again go back into the queue, as do entries whose
    /// webhook no longer exists.
    pub async fn retry_dead_letter_queue(&self) -> usize {
        let inner = &self.inner;
        let entries = inner.dead_letters.drain();
        if entries.is_empty() {
            return 0;
        }

        let (retryable, orphaned): (Vec<_>, Vec<_>) = {
            let registry = inner.registry.read();
            entries
                .into_iter()
                .partition(|delivery| registry.contains(delivery.webhook_id))
        };
        for delivery in orphaned {
            inner.dead_letters.push(delivery);
        }

        let runs = retryable.into_iter().map(|mut delivery| {
            delivery.attempt += 1;
            reset_for_retry(&mut delivery);
            inner.deliveries.lock().upsert(&delivery);
            inner.engine.run(&**inner, delivery)
        });
        let results = join_all(runs).await;
        let retried = results.len();

        let mut succeeded = 0;
        for delivery in results {
            let success = delivery.is_success();
            if success {
                succeeded += 1;
            } else if !is_exhausted(&delivery) {
                // Rate limited or abandoned, so it is not back in the queue yet
                inner.deliveries.lock().remove(delivery.id);
                inner.dead_letters.push(delivery.clone());
            }
            inner.events.emit(AdapterEvent::DeadLetterRetried {
                delivery_id: delivery.id,
                success,
            });
        }

        tracing::info!(retried, succeeded, "Dead letter queue retried");
        succeeded
    }

    // ========================================================================
    // Batching
    // ========================================================================

    /// Delivers a webhook's queued batch now. Returns `None` if nothing was queued.
    pub async fn flush_batch(&self, id: WebhookId) -> Option<WebhookDelivery> {
        let events = self.inner.batches.as_ref()?.take(id);
        if events.is_empty() {
            return None;
        }
        Some(self.inner.deliver_new(id, batch_event(&events)).await)
    }

    /// Returns the number of events queued for a webhook's next batch.
    #[must_use]
    pub fn pending_batch(&self, id: WebhookId) -> usize {
        self.inner
            .batches
            .as_ref()
            .map_or(0, |batches| batches.pending(id))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns a webhook's delivery stats.
    #[must_use]
    pub fn get_webhook_stats(&self, id: WebhookId) -> Option<WebhookStats> {
        self.inner.stats.get(id)
    }

    /// Returns a webhook's health.
    #[must_use]
    pub fn get_webhook_health(&self, id: WebhookId) -> Option<WebhookHealth> {
        self.inner.health.get(id)
    }

    /// Returns up to `limit` of a webhook's tracked deliveries, newest first.
    ///
    /// Exhausted deliveries are in the dead letter queue instead.
    #[must_use]
    pub fn get_webhook_deliveries(&self, id: WebhookId, limit: usize) -> Vec<WebhookDelivery> {
        self.inner.deliveries.lock().recent(id, limit)
    }

    /// Finds a delivery in the active history or the dead letter queue.
    #[must_use]
    pub fn get_delivery(&self, id: DeliveryId) -> Option<WebhookDelivery> {
        let active = self.inner.deliveries.lock().get(id);
        active.or_else(|| self.inner.dead_letters.get(id))
    }

    /// Lists dead-lettered deliveries, oldest first, optionally for one webhook.
    #[must_use]
    pub fn get_dead_letter_queue(&self, webhook_id: Option<WebhookId>) -> Vec<WebhookDelivery> {
        self.inner.dead_letters.list(webhook_id)
    }

    // ========================================================================
    // Health checks and shutdown
    // ========================================================================

    /// Checks every webhook for inactivity and lingering unhealthiness.
    ///
    /// Emits [`AdapterEvent::HealthInactive`] and
    /// [`AdapterEvent::HealthUnhealthy`] for what it finds.
    pub fn run_health_check(&self) -> Vec<HealthAlert> {
        self.inner.run_health_check()
    }

    /// Starts the periodic health check if `health_check_interval` is
    /// configured. Returns `false` if it is not.
    ///
    /// The task stops when the adapter is dropped or shut down.
    pub fn spawn_health_monitor(&self) -> bool {
        let Some(interval) = self.inner.config.health_check_interval() else {
            return false;
        };

        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.run_health_check();
            }
        });

        if let Some(previous) = self.inner.health_task.lock().replace(handle) {
            previous.abort();
        }
        true
    }

    /// Stops background tasks and flushes queued batches.
    ///
    /// Batches are delivered only when `flush_on_shutdown` is set; otherwise
    /// they are dropped. Returns the batch deliveries made.
    pub async fn shutdown(&self) -> Vec<WebhookDelivery> {
        let inner = &self.inner;
        let task = inner.health_task.lock().take();
        if let Some(task) = task {
            task.abort();
        }

        let Some(batches) = &inner.batches else {
            return Vec::new();
        };
        let drained = batches.drain_all();
        if !batches.options().flush_on_shutdown {
            let dropped: usize = drained.iter().map(|(_, events)| events.len()).sum();
            if dropped > 0 {
                tracing::warn!(dropped, "Dropping queued batch events on shutdown");
            }
            return Vec::new();
        }

        let flushes = drained
            .into_iter()
            .map(|(id, events)| inner.deliver_new(id, batch_event(&events)));
        join_all(flushes).await
    }
}

fn reset_for_retry(delivery: &mut WebhookDelivery) {
    delivery.status = DeliveryStatus::Pending;
    delivery.status_code = None;
    delivery.response_body = None;
    delivery.error = None;
    delivery.completed_at = None;
    delivery.duration = None;
}

// ============================================================================
// Inner
// ============================================================================

impl Inner {
    async fn deliver_new(&self, webhook_id: WebhookId, event: WebhookEvent) -> WebhookDelivery {
        let delivery = WebhookDelivery::new(webhook_id, event);
        self.deliveries.lock().upsert(&delivery);
        self.engine.run(self, delivery).await
    }

    fn spawn_batch_timer(self: &Arc<Self>, webhook_id: WebhookId, generation: u64) -> JoinHandle<()> {
        let wait = self
            .batches
            .as_ref()
            .map_or(Duration::ZERO, |batches| batches.options().max_wait_time);
        let weak = Arc::downgrade(self);

        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let expired = inner
                .batches
                .as_ref()
                .and_then(|batches| batches.take_expired(webhook_id, generation));
            if let Some(events) = expired {
                tracing::debug!(webhook_id = %webhook_id, batch_size = events.len(), "Batch wait time elapsed");
                inner.deliver_new(webhook_id, batch_event(&events)).await;
            }
        })
    }

    fn run_health_check(&self) -> Vec<HealthAlert> {
        let activity: Vec<(WebhookId, DateTime<Utc>)> = {
            let registry = self.registry.read();
            registry
                .list()
                .into_iter()
                .map(|config| {
                    let last = self
                        .stats
                        .get(config.id)
                        .and_then(|stats| stats.last_delivery_at)
                        .unwrap_or(config.created_at);
                    (config.id, last)
                })
                .collect()
        };

        let alerts = self
            .health
            .sweep(&activity, self.config.inactivity_threshold(), Utc::now());

        for alert in &alerts {
            match alert {
                HealthAlert::Inactive {
                    webhook_id,
                    idle_for,
                } => {
                    tracing::warn!(webhook_id = %webhook_id, idle_secs = idle_for.as_secs(), "Webhook inactive");
                    self.events.emit(AdapterEvent::HealthInactive {
                        webhook_id: *webhook_id,
                        idle_for: *idle_for,
                    });
                }
                HealthAlert::Unhealthy {
                    webhook_id,
                    consecutive_failures,
                } => {
                    tracing::warn!(
                        webhook_id = %webhook_id,
                        consecutive_failures,
                        "Webhook still unhealthy"
                    );
                    self.events.emit(AdapterEvent::HealthUnhealthy {
                        webhook_id: *webhook_id,
                        consecutive_failures: *consecutive_failures,
                    });
                }
            }
        }
        alerts
    }

    fn record_outcome(&self, delivery: &WebhookDelivery, success: bool) {
        let webhook_id = delivery.webhook_id;
        let duration = delivery.duration.unwrap_or_default();
        let Some(stats) = self.stats.record(webhook_id, success, duration) else {
            return;
        };
        let Some(change) = self
            .health
            .record(webhook_id, success, delivery.error.as_deref(), &stats)
        else {
            return;
        };

        if change.became_unhealthy {
            tracing::warn!(
                webhook_id = %webhook_id,
                consecutive_failures = change.health.consecutive_failures,
                "Webhook marked unhealthy"
            );
            self.events.emit(AdapterEvent::HealthUnhealthy {
                webhook_id,
                consecutive_failures: change.health.consecutive_failures,
            });
        }
        self.events.emit(AdapterEvent::HealthUpdated {
            webhook_id,
            health: change.health,
        });
    }
}

impl DeliverySink for Inner {
    fn config(&self, webhook_id: WebhookId) -> Option<WebhookConfig> {
        self.registry.read().get(webhook_id).cloned()
    }

    fn limiter(&self, webhook_id: WebhookId) -> Option<Arc<SlidingWindow>> {
        self.limiters.lock().get(&webhook_id).cloned()
    }

    fn on_attempt(&self, delivery: &WebhookDelivery) {
        self.deliveries.lock().upsert(delivery);
    }

    fn on_retrying(&self, delivery: &WebhookDelivery, delay: Duration) {
        self.deliveries.lock().upsert(delivery);
        self.events.emit(AdapterEvent::DeliveryRetrying {
            delivery: delivery.clone(),
            delay,
        });
    }

    fn on_success(&self, delivery: &WebhookDelivery) {
        self.deliveries.lock().upsert(delivery);
        self.events.emit(AdapterEvent::DeliveryCompleted {
            delivery: delivery.clone(),
        });
        self.record_outcome(delivery, true);
    }

    fn on_exhausted(&self, delivery: &WebhookDelivery) {
        self.deliveries.lock().remove(delivery.id);
        if let Some(evicted) = self.dead_letters.push(delivery.clone()) {
            tracing::warn!(
                delivery_id = %evicted.id,
                webhook_id = %evicted.webhook_id,
                "Dead letter queue full, evicted oldest delivery"
            );
        }
        tracing::warn!(
            delivery_id = %delivery.id,
            webhook_id = %delivery.webhook_id,
            "Delivery moved to dead letter queue"
        );

        self.events.emit(AdapterEvent::DeliveryFailed {
            delivery: delivery.clone(),
        });
        self.events.emit(AdapterEvent::DeadLetterAdded {
            delivery: delivery.clone(),
        });
        self.record_outcome(delivery, false);
    }

    fn on_rate_limited(&self, delivery: &WebhookDelivery) {
        self.deliveries.lock().upsert(delivery);
        self.events.emit(AdapterEvent::DeliveryRateLimited {
            delivery: delivery.clone(),
        });
    }

    fn on_abandoned(&self, delivery: &WebhookDelivery) {
        self.deliveries.lock().remove(delivery.id);
    }
}

/// Sink for the final batch of a webhook that is being unregistered.
///
/// The webhook is already gone from the registry, so its configuration is
/// carried here instead.
struct ClosingSink<'a> {
    inner: &'a Inner,
    config: WebhookConfig,
}

impl DeliverySink for ClosingSink<'_> {
    fn config(&self, webhook_id: WebhookId) -> Option<WebhookConfig> {
        (webhook_id == self.config.id).then(|| self.config.clone())
    }

    fn limiter(&self, webhook_id: WebhookId) -> Option<Arc<SlidingWindow>> {
        self.inner.limiter(webhook_id)
    }

    fn on_attempt(&self, delivery: &WebhookDelivery) {
        self.inner.on_attempt(delivery);
    }

    fn on_retrying(&self, delivery: &WebhookDelivery, delay: Duration) {
        self.inner.on_retrying(delivery, delay);
    }

    fn on_success(&self, delivery: &WebhookDelivery) {
        self.inner.on_success(delivery);
    }

    fn on_exhausted(&self, delivery: &WebhookDelivery) {
        self.inner.on_exhausted(delivery);
    }

    fn on_rate_limited(&self, delivery: &WebhookDelivery) {
        self.inner.on_rate_limited(delivery);
    }

    fn on_abandoned(&self, delivery: &WebhookDelivery) {
        self.inner.on_abandoned(delivery);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.health_task.get_mut().take() {
            task.abort();
        }
    }
}
