//! Outbound webhook delivery.
//!
//! This module provides everything needed to push events to HTTP endpoints
//! reliably: registration, event matching, payload signing, retries with
//! backoff, per-webhook rate limiting, batching, a dead letter queue and
//! health monitoring.
//!
//! # Overview
//!
//! - [`WebhookAdapter`]: The facade that ties everything together
//! - [`WebhookRegistrationBuilder`]: Builder for webhook registrations
//! - [`WebhookRegistry`]: Validated storage of webhook configurations
//! - [`WebhookEvent`]: An event to deliver
//! - [`WebhookDelivery`]: The record of one delivery and its attempts
//! - [`RetryConfig`]: Retry policy with fixed, linear or exponential backoff
//! - [`RateLimitConfig`] / [`SlidingWindow`]: Per-webhook sliding window limits
//! - [`AdapterEvent`]: Lifecycle notifications
//! - [`WebhookError`]: Error types for webhook operations
//!
//! # Event Matching
//!
//! A webhook subscribes to event types with patterns. `*` matches every
//! event, `order.*` matches every type starting with `order.`, and anything
//! else must match exactly.
//!
//! ```rust
//! use webhook_delivery::webhooks::matches;
//!
//! assert!(matches("order.created", &["order.*"]));
//! assert!(matches("user.deleted", &["*"]));
//! assert!(!matches("orders.created", &["order.*"]));
//! assert!(!matches("order.created", &["order.updated"]));
//! ```
//!
//! # Payload Signing
//!
//! Webhooks with a secret receive an `X-Webhook-Signature` header holding
//! the hex HMAC of the request body. The body is the event's JSON with keys
//! sorted, so receivers can verify against the exact bytes they received
//! or against the parsed payload.
//!
//! ```rust
//! use serde_json::json;
//! use webhook_delivery::webhooks::{sign, verify, SignatureMethod};
//!
//! let payload = json!({"b": 2, "a": 1});
//! let signature = sign(&payload, "whsec_123", SignatureMethod::HmacSha256).unwrap();
//!
//! let reordered = json!({"a": 1, "b": 2});
//! assert!(verify(&reordered, &signature, "whsec_123", SignatureMethod::HmacSha256).unwrap());
//! assert!(!verify(&reordered, &signature, "wrong", SignatureMethod::HmacSha256).unwrap());
//! ```
//!
//! # Retries
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::webhooks::{BackoffStrategy, RetryConfig};
//!
//! let retry = RetryConfig::default()
//!     .max_attempts(5)
//!     .backoff(BackoffStrategy::Exponential)
//!     .initial_delay(Duration::from_millis(100))
//!     .jitter(false);
//!
//! assert_eq!(retry.delay(1), Duration::from_millis(100));
//! assert_eq!(retry.delay(3), Duration::from_millis(400));
//! assert!(retry.should_retry(4));
//! assert!(!retry.should_retry(5));
//! ```
//!
//! # Error Handling
//!
//! ```rust
//! use webhook_delivery::webhooks::{WebhookError, WebhookRegistrationBuilder, WebhookRegistry};
//! use std::time::Duration;
//!
//! let mut registry = WebhookRegistry::new(Duration::from_secs(30));
//! let result = registry.register(
//!     WebhookRegistrationBuilder::new("https://hooks.example.com", Vec::<String>::new()).build(),
//! );
//!
//! match result {
//!     Err(WebhookError::InvalidConfiguration { reason }) => println!("rejected: {reason}"),
//!     Err(other) => println!("error: {other}"),
//!     Ok(id) => println!("registered {id}"),
//! }
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are `Send + Sync`, making them safe to share
//! across async tasks.

mod adapter;
mod batch;
mod dead_letter;
mod delivery;
mod errors;
mod events;
mod history;
mod matcher;
mod monitor;
mod rate_limit;
mod registry;
mod retry;
mod signature;
mod types;

pub use adapter::WebhookAdapter;
pub use batch::{batch_event, BATCH_EVENT_TYPE};
pub use dead_letter::DeadLetterQueue;
pub use delivery::{RATE_LIMITED_ERROR, UNREGISTERED_ERROR};
pub use errors::WebhookError;
pub use events::AdapterEvent;
pub use matcher::matches;
pub use monitor::{HealthAlert, WebhookHealth, WebhookStats};
pub use rate_limit::{RateLimitConfig, SlidingWindow};
pub use registry::WebhookRegistry;
pub use retry::{
    BackoffStrategy, RetryConfig, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
pub use signature::{
    canonical_json, constant_time_compare, sign, sign_bytes, verify, verify_bytes,
    HEADER_DELIVERY_ATTEMPT, HEADER_DELIVERY_ID, HEADER_EVENT_ID, HEADER_EVENT_TYPE,
    HEADER_SIGNATURE, HEADER_WEBHOOK_ID,
};
pub use types::{
    DeliveryStatus, SignatureMethod, WebhookConfig, WebhookDelivery, WebhookEvent, WebhookPatch,
    WebhookRegistration, WebhookRegistrationBuilder,
};
