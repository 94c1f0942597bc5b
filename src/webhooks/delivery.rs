//! Delivery engine: one delivery, attempt by attempt.
//!
//! [`DeliveryEngine::run`] drives a delivery to a final state:
//!
//! 1. The webhook must still be registered, otherwise the delivery fails
//!    with [`UNREGISTERED_ERROR`].
//! 2. The webhook's rate limiter must admit the attempt, otherwise the
//!    delivery fails with [`RATE_LIMITED_ERROR`] without using up the attempt.
//! 3. The event is encoded, signed and POSTed with a deadline.
//! 4. A 2xx response is a success. Anything else is retried after the
//!    policy's delay until `max_attempts` is reached, then the delivery is
//!    exhausted.
//!
//! The engine owns no state. Everything it reads or records goes through a
//! [`DeliverySink`], implemented by the adapter.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use super::rate_limit::SlidingWindow;
use super::signature::{
    canonical_json, sign_bytes, HEADER_DELIVERY_ATTEMPT, HEADER_DELIVERY_ID, HEADER_EVENT_ID,
    HEADER_EVENT_TYPE, HEADER_SIGNATURE, HEADER_WEBHOOK_ID,
};
use super::types::{DeliveryStatus, WebhookConfig, WebhookDelivery};
use crate::clients::{HttpError, HttpRequest, HttpTransport};
use crate::config::WebhookId;

/// Error recorded when the rate limiter rejects an attempt.
pub const RATE_LIMITED_ERROR: &str = "Rate limit exceeded";

/// Error recorded when the webhook is removed while a delivery is pending.
pub const UNREGISTERED_ERROR: &str = "Webhook unregistered";

/// State and notifications the engine needs from its owner.
pub(crate) trait DeliverySink: Send + Sync {
    /// Current configuration, or `None` once unregistered.
    fn config(&self, webhook_id: WebhookId) -> Option<WebhookConfig>;

    /// Rate limiter for the webhook, if it has one.
    fn limiter(&self, webhook_id: WebhookId) -> Option<Arc<SlidingWindow>>;

    /// An attempt is about to be sent.
    fn on_attempt(&self, delivery: &WebhookDelivery);

    /// An attempt failed and the next one starts after `delay`.
    fn on_retrying(&self, delivery: &WebhookDelivery, delay: Duration);

    /// The delivery succeeded.
    fn on_success(&self, delivery: &WebhookDelivery);

    /// The delivery failed its last allowed attempt.
    fn on_exhausted(&self, delivery: &WebhookDelivery);

    /// The rate limiter rejected the attempt.
    fn on_rate_limited(&self, delivery: &WebhookDelivery);

    /// The webhook is gone; the delivery was abandoned.
    fn on_abandoned(&self, delivery: &WebhookDelivery);
}

/// Sends deliveries through an [`HttpTransport`].
pub(crate) struct DeliveryEngine {
    transport: Arc<dyn HttpTransport>,
    user_agent: String,
    max_response_snippet: usize,
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("user_agent", &self.user_agent)
            .field("max_response_snippet", &self.max_response_snippet)
            .finish_non_exhaustive()
    }
}

impl DeliveryEngine {
    pub(crate) fn new(
        transport: Arc<dyn HttpTransport>,
        user_agent: String,
        max_response_snippet: usize,
    ) -> Self {
        Self {
            transport,
            user_agent,
            max_response_snippet,
        }
    }

    /// Runs the delivery until it succeeds, is exhausted, is rate limited or
    /// its webhook disappears.
    pub(crate) async fn run<S>(&self, sink: &S, mut delivery: WebhookDelivery) -> WebhookDelivery
    where
        S: DeliverySink + ?Sized,
    {
        loop {
            let Some(config) = sink.config(delivery.webhook_id) else {
                delivery.status = DeliveryStatus::Failed;
                delivery.error = Some(UNREGISTERED_ERROR.to_string());
                delivery.completed_at = Some(Utc::now());
                tracing::debug!(
                    webhook_id = %delivery.webhook_id,
                    delivery_id = %delivery.id,
                    "Webhook unregistered, abandoning delivery"
                );
                sink.on_abandoned(&delivery);
                return delivery;
            };

            if let Some(limiter) = sink.limiter(delivery.webhook_id) {
                if !limiter.try_acquire() {
                    delivery.status = DeliveryStatus::Failed;
                    delivery.error = Some(RATE_LIMITED_ERROR.to_string());
                    delivery.status_code = None;
                    delivery.response_body = None;
                    delivery.duration = None;
                    tracing::warn!(
                        webhook_id = %delivery.webhook_id,
                        delivery_id = %delivery.id,
                        attempt = delivery.attempt,
                        "Webhook delivery rejected by rate limit"
                    );
                    sink.on_rate_limited(&delivery);
                    return delivery;
                }
            }

            delivery.status = DeliveryStatus::Pending;
            sink.on_attempt(&delivery);

            if self.attempt(&config, &mut delivery).await {
                delivery.status = DeliveryStatus::Success;
                delivery.error = None;
                delivery.completed_at = Some(Utc::now());
                tracing::debug!(
                    webhook_id = %delivery.webhook_id,
                    delivery_id = %delivery.id,
                    attempt = delivery.attempt,
                    status = ?delivery.status_code,
                    "Webhook delivered"
                );
                sink.on_success(&delivery);
                return delivery;
            }

            if !config.retry.should_retry(delivery.attempt) {
                delivery.status = DeliveryStatus::Failed;
                delivery.completed_at = Some(Utc::now());
                tracing::warn!(
                    webhook_id = %delivery.webhook_id,
                    delivery_id = %delivery.id,
                    attempts = delivery.attempt,
                    error = delivery.error.as_deref().unwrap_or_default(),
                    "Webhook delivery exhausted retries"
                );
                sink.on_exhausted(&delivery);
                return delivery;
            }

            let delay = config.retry.delay(delivery.attempt);
            delivery.status = DeliveryStatus::Retrying;
            tracing::debug!(
                webhook_id = %delivery.webhook_id,
                delivery_id = %delivery.id,
                attempt = delivery.attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = delivery.error.as_deref().unwrap_or_default(),
                "Webhook delivery failed, retrying"
            );
            sink.on_retrying(&delivery, delay);

            tokio::time::sleep(delay).await;
            delivery.attempt += 1;
        }
    }

    /// Sends one attempt, recording its outcome on `delivery`. Returns `true`
    /// on a 2xx response.
    async fn attempt(&self, config: &WebhookConfig, delivery: &mut WebhookDelivery) -> bool {
        delivery.status_code = None;
        delivery.response_body = None;
        delivery.error = None;

        let request = match self.build_request(config, delivery) {
            Ok(request) => request,
            Err(error) => {
                delivery.duration = Some(Duration::ZERO);
                delivery.error = Some(error);
                return false;
            }
        };

        let started = Instant::now();
        let result = self.transport.send(request).await;
        delivery.duration = Some(started.elapsed());

        match result {
            Ok(response) => {
                delivery.status_code = Some(response.code);
                delivery.response_body = Some(truncate_chars(&response.body, self.max_response_snippet));
                if response.is_ok() {
                    true
                } else {
                    tracing::debug!(
                        webhook_id = %delivery.webhook_id,
                        delivery_id = %delivery.id,
                        status = response.code,
                        request_id = response.request_id().unwrap_or_default(),
                        "Webhook endpoint returned an error status"
                    );
                    delivery.error = Some(format!("HTTP {}", response.code));
                    false
                }
            }
            Err(HttpError::Timeout) => {
                delivery.error = Some(format!(
                    "Request timed out after {}ms",
                    config.timeout.as_millis()
                ));
                false
            }
            Err(error) => {
                delivery.error = Some(error.to_string());
                false
            }
        }
    }

    fn build_request(
        &self,
        config: &WebhookConfig,
        delivery: &WebhookDelivery,
    ) -> Result<HttpRequest, String> {
        let body = canonical_json(&delivery.event.to_wire());

        // Custom headers first so the standard ones cannot be overridden
        let mut builder = HttpRequest::builder(config.url.as_ref(), Instant::now() + config.timeout)
            .headers(&config.headers)
            .header("Content-Type", "application/json")
            .header("User-Agent", self.user_agent.as_str())
            .header(HEADER_WEBHOOK_ID, config.id.to_string())
            .header(HEADER_EVENT_TYPE, delivery.event.event_type())
            .header(HEADER_EVENT_ID, delivery.event.id().to_string())
            .header(HEADER_DELIVERY_ID, delivery.id.to_string())
            .header(HEADER_DELIVERY_ATTEMPT, delivery.attempt.to_string());

        if let Some(secret) = &config.secret {
            let signature = sign_bytes(&body, secret.as_ref(), config.signature_method)
                .map_err(|e| e.to_string())?;
            builder = builder.header(HEADER_SIGNATURE, signature);
        }

        Ok(builder.body(body).build())
    }
}

/// Returns `true` if [`DeliveryEngine::run`] ended the delivery by exhausting
/// its attempts, as opposed to succeeding, being rate limited or being
/// abandoned.
pub(crate) fn is_exhausted(delivery: &WebhookDelivery) -> bool {
    delivery.status == DeliveryStatus::Failed
        && delivery.completed_at.is_some()
        && delivery.error.as_deref() != Some(UNREGISTERED_ERROR)
}

/// Truncates to at most `max` characters, never splitting a character.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
