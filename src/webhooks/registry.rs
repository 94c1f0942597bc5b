//! Webhook registry for managing registered destinations.
//!
//! This module provides the [`WebhookRegistry`] struct, which validates
//! registrations and stores the resulting [`WebhookConfig`]s in memory.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::webhooks::{WebhookPatch, WebhookRegistry, WebhookRegistrationBuilder};
//!
//! let mut registry = WebhookRegistry::new(Duration::from_secs(30));
//!
//! let id = registry
//!     .register(WebhookRegistrationBuilder::new("https://example.com/hooks", ["order.*"]).build())
//!     .unwrap();
//!
//! assert_eq!(registry.matching("order.created").len(), 1);
//!
//! registry.set_enabled(id, false);
//! assert!(registry.matching("order.created").is_empty());
//!
//! registry.update(id, WebhookPatch::new().url("https://example.com/v2")).unwrap();
//! assert_eq!(registry.get(id).unwrap().url.as_ref(), "https://example.com/v2");
//! ```

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderName, HeaderValue};

use super::errors::WebhookError;
use super::matcher::matches;
use super::signature::{
    HEADER_DELIVERY_ATTEMPT, HEADER_DELIVERY_ID, HEADER_EVENT_ID, HEADER_EVENT_TYPE,
    HEADER_SIGNATURE, HEADER_WEBHOOK_ID,
};
use super::types::{SignatureMethod, WebhookConfig, WebhookPatch, WebhookRegistration};
use crate::config::{WebhookId, WebhookSecret, WebhookUrl};

/// Headers the delivery engine sets on every request.
const RESERVED_HEADERS: [&str; 8] = [
    "Content-Type",
    "User-Agent",
    HEADER_WEBHOOK_ID,
    HEADER_EVENT_TYPE,
    HEADER_EVENT_ID,
    HEADER_DELIVERY_ID,
    HEADER_DELIVERY_ATTEMPT,
    HEADER_SIGNATURE,
];

/// Registry of webhook configurations.
///
/// Every mutation is validated as a whole before anything is stored, so a
/// rejected registration or patch leaves the registry unchanged.
///
/// # Thread Safety
///
/// `WebhookRegistry` is `Send + Sync`. It has no interior locking; the
/// adapter wraps it in a lock.
#[derive(Debug, Clone)]
pub struct WebhookRegistry {
    webhooks: HashMap<WebhookId, WebhookConfig>,
    /// Registration order.
    order: Vec<WebhookId>,
    default_timeout: Duration,
}

// Verify WebhookRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookRegistry>();
};

impl WebhookRegistry {
    /// Creates an empty registry. `default_timeout` applies to registrations
    /// that do not set their own.
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            webhooks: HashMap::new(),
            order: Vec::new(),
            default_timeout,
        }
    }

    /// Validates and stores a registration, returning its new id.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Config`] for a bad URL or empty secret,
    /// [`WebhookError::UnsupportedSignatureMethod`] for JWT, and
    /// [`WebhookError::InvalidConfiguration`] for empty patterns, zero
    /// attempts, zero timeout or a zero rate limit.
    pub fn register(&mut self, registration: WebhookRegistration) -> Result<WebhookId, WebhookError> {
        let config = self.validate(WebhookId::generate(), registration)?;
        let id = config.id;
        self.webhooks.insert(id, config);
        self.order.push(id);
        Ok(id)
    }

    /// Removes a webhook, returning its configuration if it existed.
    pub fn unregister(&mut self, id: WebhookId) -> Option<WebhookConfig> {
        let removed = self.webhooks.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed)
    }

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` if the id is unknown, otherwise the previous and
    /// updated configurations.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`register`](Self::register) if the patched
    /// configuration is invalid. The stored configuration is left unchanged.
    pub fn update(
        &mut self,
        id: WebhookId,
        patch: WebhookPatch,
    ) -> Result<Option<(WebhookConfig, WebhookConfig)>, WebhookError> {
        let Some(current) = self.webhooks.get(&id) else {
            return Ok(None);
        };

        let mut registration = to_registration(current);
        apply_patch(&mut registration, patch);
        let timeout_overridden = registration.timeout.is_some();

        let mut updated = self.validate(id, registration)?;
        if !timeout_overridden {
            updated.timeout = current.timeout;
        }
        updated.created_at = current.created_at;

        let previous = current.clone();
        self.webhooks.insert(id, updated.clone());
        Ok(Some((previous, updated)))
    }

    /// Enables or disables a webhook. Returns `false` for an unknown id.
    pub fn set_enabled(&mut self, id: WebhookId, enabled: bool) -> bool {
        match self.webhooks.get_mut(&id) {
            Some(config) => {
                config.enabled = enabled;
                config.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Gets a webhook by id.
    #[must_use]
    pub fn get(&self, id: WebhookId) -> Option<&WebhookConfig> {
        self.webhooks.get(&id)
    }

    /// Returns `true` if a webhook with this id is registered.
    #[must_use]
    pub fn contains(&self, id: WebhookId) -> bool {
        self.webhooks.contains_key(&id)
    }

    /// Lists all webhooks in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<&WebhookConfig> {
        self.order
            .iter()
            .filter_map(|id| self.webhooks.get(id))
            .collect()
    }

    /// Returns enabled webhooks subscribed to `event_type`, in registration order.
    #[must_use]
    pub fn matching(&self, event_type: &str) -> Vec<&WebhookConfig> {
        self.list()
            .into_iter()
            .filter(|config| config.enabled && matches(event_type, &config.events))
            .collect()
    }

    /// Returns the number of registered webhooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.webhooks.len()
    }

    /// Returns `true` if no webhooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.webhooks.is_empty()
    }

    fn validate(
        &self,
        id: WebhookId,
        registration: WebhookRegistration,
    ) -> Result<WebhookConfig, WebhookError> {
        let url = WebhookUrl::new(&registration.url)?;

        if registration.events.is_empty() {
            return Err(WebhookError::invalid(
                "at least one event pattern is required",
            ));
        }
        if registration.events.iter().any(|pattern| pattern.trim().is_empty()) {
            return Err(WebhookError::invalid("event patterns cannot be empty"));
        }
        validate_headers(&registration.headers)?;

        if registration.signature_method == SignatureMethod::Jwt {
            return Err(WebhookError::UnsupportedSignatureMethod {
                method: registration.signature_method.to_string(),
            });
        }
        let secret = registration.secret.map(WebhookSecret::new).transpose()?;

        registration.retry.validate()?;
        if let Some(rate_limit) = &registration.rate_limit {
            rate_limit.validate()?;
        }

        let timeout = registration.timeout.unwrap_or(self.default_timeout);
        if timeout.is_zero() {
            return Err(WebhookError::invalid("timeout must be greater than zero"));
        }

        let now = Utc::now();
        Ok(WebhookConfig {
            id,
            url,
            events: registration.events,
            secret,
            signature_method: registration.signature_method,
            headers: registration.headers,
            enabled: registration.enabled,
            retry: registration.retry,
            rate_limit: registration.rate_limit,
            timeout,
            batch: registration.batch,
            metadata: registration.metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

fn validate_headers(headers: &HashMap<String, String>) -> Result<(), WebhookError> {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(WebhookError::invalid(format!("invalid header name '{name}'")));
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(WebhookError::invalid(format!(
                "invalid value for header '{name}'"
            )));
        }
        if RESERVED_HEADERS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
        {
            return Err(WebhookError::invalid(format!(
                "header '{name}' is set on every delivery and cannot be customized"
            )));
        }
    }
    Ok(())
}

fn to_registration(config: &WebhookConfig) -> WebhookRegistration {
    WebhookRegistration {
        url: config.url.to_string(),
        events: config.events.clone(),
        secret: config.secret.as_ref().map(|s| s.as_ref().to_string()),
        signature_method: config.signature_method,
        headers: config.headers.clone(),
        enabled: config.enabled,
        retry: config.retry,
        rate_limit: config.rate_limit,
        timeout: None,
        batch: config.batch,
        metadata: config.metadata.clone(),
    }
}

fn apply_patch(registration: &mut WebhookRegistration, patch: WebhookPatch) {
    if let Some(url) = patch.url {
        registration.url = url;
    }
    if let Some(events) = patch.events {
        registration.events = events;
    }
    if let Some(secret) = patch.secret {
        registration.secret = secret;
    }
    if let Some(method) = patch.signature_method {
        registration.signature_method = method;
    }
    if let Some(headers) = patch.headers {
        registration.headers = headers;
    }
    if let Some(enabled) = patch.enabled {
        registration.enabled = enabled;
    }
    if let Some(retry) = patch.retry {
        registration.retry = retry;
    }
    if let Some(rate_limit) = patch.rate_limit {
        registration.rate_limit = rate_limit;
    }
    if let Some(timeout) = patch.timeout {
        registration.timeout = Some(timeout);
    }
    if let Some(batch) = patch.batch {
        registration.batch = batch;
    }
    if let Some(metadata) = patch.metadata {
        registration.metadata = metadata;
    }
}
