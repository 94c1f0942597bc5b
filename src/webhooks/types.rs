//! Webhook configuration, event and delivery types.
//!
//! This module contains the data model shared by the registry, the delivery
//! engine and the adapter facade:
//!
//! - [`WebhookRegistration`] / [`WebhookRegistrationBuilder`]: input to registration
//! - [`WebhookConfig`]: a validated, registered webhook
//! - [`WebhookPatch`]: a partial update
//! - [`WebhookEvent`]: an immutable event to deliver
//! - [`WebhookDelivery`] / [`DeliveryStatus`]: one delivery and its outcome
//! - [`SignatureMethod`]: how payloads are signed
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::webhooks::{RetryConfig, WebhookRegistrationBuilder};
//!
//! let registration = WebhookRegistrationBuilder::new(
//!     "https://hooks.example.com/orders",
//!     ["order.*"],
//! )
//! .secret("whsec_123")
//! .header("X-Tenant", "acme")
//! .retry(RetryConfig::default().max_attempts(5))
//! .timeout(Duration::from_secs(10))
//! .build();
//!
//! assert_eq!(registration.events, vec!["order.*".to_string()]);
//! assert_eq!(registration.retry.max_attempts, 5);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::rate_limit::RateLimitConfig;
use super::retry::RetryConfig;
use super::WebhookError;
use crate::config::{DeliveryId, EventId, WebhookId, WebhookSecret, WebhookUrl};

// ============================================================================
// SignatureMethod
// ============================================================================

/// Algorithm used to sign webhook payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureMethod {
    /// HMAC with SHA-256, hex encoded.
    #[default]
    HmacSha256,
    /// HMAC with SHA-512, hex encoded.
    HmacSha512,
    /// JSON Web Token. Recognized but not supported; rejected at registration.
    Jwt,
}

impl SignatureMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HmacSha256 => "hmac-sha256",
            Self::HmacSha512 => "hmac-sha512",
            Self::Jwt => "jwt",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Unvalidated input to webhook registration.
///
/// Validation happens when the registration is handed to
/// [`WebhookAdapter::register_webhook`](crate::webhooks::WebhookAdapter::register_webhook).
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookRegistration {
    /// Destination URL. Must be absolute `http` or `https`.
    pub url: String,

    /// Event-type patterns: exact names, `prefix.*`, or `*`.
    pub events: Vec<String>,

    /// Shared secret. When set, every delivery is signed.
    pub secret: Option<String>,

    /// Algorithm used with `secret`.
    pub signature_method: SignatureMethod,

    /// Extra headers sent with every delivery.
    pub headers: HashMap<String, String>,

    /// Disabled webhooks keep their state but receive no events.
    pub enabled: bool,

    /// Retry policy for failed attempts.
    pub retry: RetryConfig,

    /// Optional per-destination rate limit.
    pub rate_limit: Option<RateLimitConfig>,

    /// Per-attempt timeout. `None` uses the adapter default.
    pub timeout: Option<Duration>,

    /// Opt into batched delivery when the adapter has batching configured.
    pub batch: bool,

    /// Arbitrary caller metadata, stored but never sent.
    pub metadata: Map<String, Value>,
}

/// Builder for constructing [`WebhookRegistration`] instances.
///
/// Required fields (`url` and `events`) are set via the constructor.
#[derive(Debug)]
pub struct WebhookRegistrationBuilder {
    registration: WebhookRegistration,
}

impl WebhookRegistrationBuilder {
    /// Creates a new builder with the required fields.
    #[must_use]
    pub fn new<I, S>(url: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registration: WebhookRegistration {
                url: url.into(),
                events: events.into_iter().map(Into::into).collect(),
                secret: None,
                signature_method: SignatureMethod::default(),
                headers: HashMap::new(),
                enabled: true,
                retry: RetryConfig::default(),
                rate_limit: None,
                timeout: None,
                batch: false,
                metadata: Map::new(),
            },
        }
    }

    /// Sets the shared signing secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.registration.secret = Some(secret.into());
        self
    }

    /// Sets the signature algorithm.
    #[must_use]
    pub const fn signature_method(mut self, method: SignatureMethod) -> Self {
        self.registration.signature_method = method;
        self
    }

    /// Adds an extra header sent with every delivery.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.registration.headers.insert(key.into(), value.into());
        self
    }

    /// Sets whether the webhook starts enabled.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.registration.enabled = enabled;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.registration.retry = retry;
        self
    }

    /// Sets a per-destination rate limit.
    #[must_use]
    pub const fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.registration.rate_limit = Some(rate_limit);
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.registration.timeout = Some(timeout);
        self
    }

    /// Opts the webhook into batched delivery.
    #[must_use]
    pub const fn batch(mut self, batch: bool) -> Self {
        self.registration.batch = batch;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.registration.metadata.insert(key.into(), value.into());
        self
    }

    /// Builds the [`WebhookRegistration`].
    #[must_use]
    pub fn build(self) -> WebhookRegistration {
        self.registration
    }
}

// ============================================================================
// WebhookConfig
// ============================================================================

/// A registered, validated webhook.
///
/// `id` never changes. Every other field may be replaced through
/// [`WebhookPatch`] without losing stats, health or delivery history.
#[derive(Clone, Debug)]
pub struct WebhookConfig {
    /// Identifier assigned at registration.
    pub id: WebhookId,
    /// Destination URL.
    pub url: WebhookUrl,
    /// Subscribed event-type patterns, in registration order.
    pub events: Vec<String>,
    /// Signing secret, if deliveries are signed.
    pub secret: Option<WebhookSecret>,
    /// Signature algorithm.
    pub signature_method: SignatureMethod,
    /// Extra headers sent with every delivery.
    pub headers: HashMap<String, String>,
    /// Whether the webhook receives events.
    pub enabled: bool,
    /// Retry policy.
    pub retry: RetryConfig,
    /// Optional rate limit.
    pub rate_limit: Option<RateLimitConfig>,
    /// Resolved per-attempt timeout.
    pub timeout: Duration,
    /// Whether events are batched.
    pub batch: bool,
    /// Caller metadata.
    pub metadata: Map<String, Value>,
    /// When the webhook was registered.
    pub created_at: DateTime<Utc>,
    /// When the webhook was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A partial update to a registered webhook.
///
/// Fields left as `None` are unchanged. For `secret` and `rate_limit`,
/// `Some(None)` removes the current value.
///
/// # Example
///
/// ```rust
/// use webhook_delivery::webhooks::WebhookPatch;
///
/// let patch = WebhookPatch::new()
///     .url("https://hooks.example.com/v2")
///     .events(["order.*", "refund.created"])
///     .clear_secret();
///
/// assert_eq!(patch.secret, Some(None));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WebhookPatch {
    /// New destination URL.
    pub url: Option<String>,
    /// New event patterns.
    pub events: Option<Vec<String>>,
    /// New secret, or `Some(None)` to stop signing.
    pub secret: Option<Option<String>>,
    /// New signature algorithm.
    pub signature_method: Option<SignatureMethod>,
    /// Replacement header set.
    pub headers: Option<HashMap<String, String>>,
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New retry policy.
    pub retry: Option<RetryConfig>,
    /// New rate limit, or `Some(None)` to remove it.
    pub rate_limit: Option<Option<RateLimitConfig>>,
    /// New per-attempt timeout.
    pub timeout: Option<Duration>,
    /// New batch flag.
    pub batch: Option<bool>,
    /// Replacement metadata.
    pub metadata: Option<Map<String, Value>>,
}

impl WebhookPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the destination URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replaces the event patterns.
    #[must_use]
    pub fn events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the signing secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(Some(secret.into()));
        self
    }

    /// Removes the signing secret.
    #[must_use]
    pub fn clear_secret(mut self) -> Self {
        self.secret = Some(None);
        self
    }

    /// Replaces the signature algorithm.
    #[must_use]
    pub const fn signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = Some(method);
        self
    }

    /// Replaces the extra headers.
    #[must_use]
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Replaces the rate limit.
    #[must_use]
    pub const fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = Some(Some(rate_limit));
        self
    }

    /// Removes the rate limit.
    #[must_use]
    pub const fn clear_rate_limit(mut self) -> Self {
        self.rate_limit = Some(None);
        self
    }

    /// Replaces the per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the batch flag.
    #[must_use]
    pub const fn batch(mut self, batch: bool) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Replaces the metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

// ============================================================================
// WebhookEvent
// ============================================================================

/// An event to be delivered to subscribed webhooks.
///
/// Events are immutable once created. The payload is any JSON value; use
/// [`WebhookEvent::from_serializable`] to build one from a typed struct.
///
/// # Example
///
/// ```rust
/// use serde::Serialize;
/// use webhook_delivery::webhooks::WebhookEvent;
///
/// #[derive(Serialize)]
/// struct OrderCreated { id: u64, total: f64 }
///
/// let event = WebhookEvent::from_serializable("order.created", &OrderCreated { id: 7, total: 9.5 }).unwrap();
/// assert_eq!(event.event_type(), "order.created");
/// assert_eq!(event.payload()["id"], 7);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookEvent {
    id: EventId,
    event_type: String,
    timestamp: DateTime<Utc>,
    payload: Value,
    metadata: Option<Map<String, Value>>,
}

impl WebhookEvent {
    /// Creates an event with a fresh id and the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: EventId::generate(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            payload,
            metadata: None,
        }
    }

    /// Creates an event from any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Serialization`] if the payload cannot be
    /// represented as JSON.
    pub fn from_serializable<T: Serialize + ?Sized>(
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, WebhookError> {
        Ok(Self::new(event_type, serde_json::to_value(payload)?))
    }

    /// Attaches metadata to the event.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns the event id.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Returns the event type.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns when the event was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the metadata, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Map<String, Value>> {
        self.metadata.as_ref()
    }

    /// Returns the JSON object sent as the request body.
    ///
    /// Keys are `data`, `id`, `metadata` (only when present), `timestamp`
    /// (RFC 3339, millisecond precision, UTC) and `type`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut body = Map::new();
        body.insert("data".to_string(), self.payload.clone());
        body.insert("id".to_string(), Value::String(self.id.to_string()));
        if let Some(metadata) = &self.metadata {
            body.insert("metadata".to_string(), Value::Object(metadata.clone()));
        }
        body.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        body.insert("type".to_string(), Value::String(self.event_type.clone()));
        Value::Object(body)
    }
}

impl Serialize for WebhookEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire().serialize(serializer)
    }
}

// ============================================================================
// WebhookDelivery
// ============================================================================

/// Lifecycle state of a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Created, not yet attempted.
    Pending,
    /// A 2xx response was received.
    Success,
    /// The delivery gave up, was rate limited, or its webhook was removed.
    Failed,
    /// An attempt failed and another is scheduled.
    Retrying,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        };
        f.write_str(s)
    }
}

/// One delivery of one event to one webhook.
///
/// The same `id` is kept across retry attempts; `attempt` starts at 1.
#[derive(Clone, Debug, Serialize)]
pub struct WebhookDelivery {
    /// Delivery identifier.
    pub id: DeliveryId,
    /// Target webhook.
    pub webhook_id: WebhookId,
    /// The event being delivered.
    pub event: WebhookEvent,
    /// Current attempt number.
    pub attempt: u32,
    /// Current status.
    pub status: DeliveryStatus,
    /// HTTP status code of the last attempt, if a response arrived.
    pub status_code: Option<u16>,
    /// Truncated response body of the last attempt.
    pub response_body: Option<String>,
    /// Error of the last failed attempt.
    pub error: Option<String>,
    /// When the delivery was created.
    pub created_at: DateTime<Utc>,
    /// When the delivery reached a final status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Duration of the last attempt.
    pub duration: Option<Duration>,
}

impl WebhookDelivery {
    /// Creates a pending delivery at attempt 1.
    #[must_use]
    pub fn new(webhook_id: WebhookId, event: WebhookEvent) -> Self {
        Self {
            id: DeliveryId::generate(),
            webhook_id,
            event,
            attempt: 1,
            status: DeliveryStatus::Pending,
            status_code: None,
            response_body: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
            duration: None,
        }
    }

    /// Returns `true` if the delivery succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}
