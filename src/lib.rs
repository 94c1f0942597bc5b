//! # Webhook Delivery
//!
//! Reliable outbound webhook delivery for Rust services: register HTTP
//! endpoints, publish events, and let the library handle signing, retries,
//! rate limiting, batching and dead-lettering.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AdapterConfig`] and [`AdapterConfigBuilder`]
//! - Validated newtypes for identifiers, URLs and secrets
//! - Event type matching with exact, prefix (`order.*`) and catch-all patterns
//! - HMAC-SHA256 / HMAC-SHA512 payload signatures over canonical JSON
//! - Fixed, linear and exponential retry backoff with optional jitter
//! - Per-webhook sliding window rate limiting
//! - Optional event batching by size or wait time
//! - A bounded dead letter queue with manual and bulk retry
//! - Delivery stats, health tracking and lifecycle events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serde_json::json;
//! use webhook_delivery::webhooks::{RetryConfig, WebhookAdapter, WebhookEvent, WebhookRegistrationBuilder};
//! use webhook_delivery::AdapterConfig;
//!
//! let adapter = WebhookAdapter::new(AdapterConfig::default())?;
//!
//! let id = adapter.register_webhook(
//!     WebhookRegistrationBuilder::new("https://hooks.example.com/orders", ["order.*"])
//!         .secret("whsec_123")
//!         .retry(RetryConfig::default().max_attempts(5))
//!         .build(),
//! )?;
//!
//! let results = adapter
//!     .deliver_event(WebhookEvent::new("order.created", json!({"order_id": 42})))
//!     .await;
//! assert!(results[&id].is_success());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use std::time::Duration;
//! use webhook_delivery::{AdapterConfig, BatchDeliveryOptions};
//!
//! let config = AdapterConfig::builder()
//!     .batch(BatchDeliveryOptions::new(50, Duration::from_secs(1)).flush_on_shutdown(true))
//!     .default_timeout(Duration::from_secs(10))
//!     .unhealthy_threshold(3)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.unhealthy_threshold(), 3);
//! ```
//!
//! ## Verifying Deliveries
//!
//! Receivers check the `X-Webhook-Signature` header against the raw body:
//!
//! ```rust
//! use webhook_delivery::webhooks::{sign_bytes, verify_bytes, SignatureMethod};
//!
//! let body = br#"{"data":{"order_id":42},"type":"order.created"}"#;
//! let header = sign_bytes(body, "whsec_123", SignatureMethod::HmacSha256).unwrap();
//!
//! assert!(verify_bytes(body, &header, "whsec_123", SignatureMethod::HmacSha256).unwrap());
//! ```
//!
//! ## Observing the Adapter
//!
//! ```rust,ignore
//! use webhook_delivery::webhooks::AdapterEvent;
//!
//! let mut events = adapter.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if let AdapterEvent::DeadLetterAdded { delivery } = event {
//!         eprintln!("delivery {} dead-lettered: {:?}", delivery.id, delivery.error);
//!     }
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Every adapter owns its state and is passed explicitly
//! - **Fail-fast validation**: Registrations and newtypes validate on construction
//! - **Thread-safe**: All public types are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio runtime
//! - **Pluggable transport**: Delivery goes through [`clients::HttpTransport`]

pub mod clients;
pub mod config;
pub mod error;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use config::{
    AdapterConfig, AdapterConfigBuilder, BatchDeliveryOptions, DeliveryId, EventId, WebhookId,
    WebhookSecret, WebhookUrl,
};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{HttpError, HttpRequest, HttpRequestBuilder, HttpResponse, HttpTransport};

// Re-export the delivery facade
pub use webhooks::{WebhookAdapter, WebhookError, WebhookEvent};
