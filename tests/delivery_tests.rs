//! Integration tests for end-to-end webhook delivery.
//!
//! These tests run a real [`WebhookAdapter`] against a local mock server and
//! verify what arrives on the wire: bodies, headers, signatures, retries,
//! rate limiting, batching and dead-lettering.

use serde_json::{json, Value};
use std::time::Duration;
use webhook_delivery::webhooks::{
    verify_bytes, BackoffStrategy, DeliveryStatus, RateLimitConfig, RetryConfig, SignatureMethod,
    WebhookAdapter, WebhookEvent, WebhookRegistrationBuilder, HEADER_DELIVERY_ATTEMPT,
    HEADER_EVENT_TYPE, HEADER_SIGNATURE, HEADER_WEBHOOK_ID,
};
use webhook_delivery::{AdapterConfig, BatchDeliveryOptions};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Creates an adapter with the default configuration.
fn create_adapter() -> WebhookAdapter {
    WebhookAdapter::new(AdapterConfig::default()).unwrap()
}

/// Returns the hook URL on the mock server.
fn hook_url(server: &MockServer) -> String {
    format!("{}/hook", server.uri())
}

fn header_value(request: &Request, name: &str) -> String {
    request
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Basic Delivery
// ============================================================================

#[tokio::test]
async fn test_matching_event_is_delivered_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["order.*"])
                .retry(RetryConfig::default().max_attempts(1))
                .build(),
        )
        .unwrap();

    let results = adapter
        .deliver_event(WebhookEvent::new("order.created", json!({"order_id": 42})))
        .await;

    assert_eq!(results.len(), 1);
    let delivery = &results[&id];
    assert_eq!(delivery.status, DeliveryStatus::Success);
    assert_eq!(delivery.attempt, 1);
    assert_eq!(delivery.status_code, Some(200));
    assert!(delivery.completed_at.is_some());

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["type"], "order.created");
    assert_eq!(body["data"]["order_id"], 42);
    assert!(body["id"].is_string());
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body.get("metadata").is_none());
}

#[tokio::test]
async fn test_non_matching_event_is_not_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    adapter
        .register_webhook(WebhookRegistrationBuilder::new(hook_url(&server), ["order.*"]).build())
        .unwrap();

    let results = adapter
        .deliver_event(WebhookEvent::new("user.created", json!({})))
        .await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_standard_and_custom_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Content-Type", "application/json"))
        .and(header("X-Tenant", "acme"))
        .and(header(HEADER_EVENT_TYPE, "order.created"))
        .and(header(HEADER_DELIVERY_ATTEMPT, "1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["order.created"])
                .header("X-Tenant", "acme")
                .build(),
        )
        .unwrap();

    let results = adapter
        .deliver_event(WebhookEvent::new("order.created", json!({})))
        .await;
    assert!(results[&id].is_success());

    let received = server.received_requests().await.unwrap();
    assert_eq!(header_value(&received[0], HEADER_WEBHOOK_ID), id.to_string());
    assert!(header_value(&received[0], "User-Agent").contains("Webhook Delivery v"));
    assert!(received[0].headers.get(HEADER_SIGNATURE).is_none());
}

// ============================================================================
// Signatures
// ============================================================================

#[tokio::test]
async fn test_signature_verifies_against_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header_exists(HEADER_SIGNATURE))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .secret("whsec_sha256")
                .build(),
        )
        .unwrap();
    adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .secret("whsec_sha512")
                .signature_method(SignatureMethod::HmacSha512)
                .build(),
        )
        .unwrap();

    adapter
        .deliver_event(WebhookEvent::new("order.created", json!({"z": 1, "a": [3, 2]})))
        .await;

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    for request in &received {
        let signature = header_value(request, HEADER_SIGNATURE);
        let (secret, method) = if signature.len() == 64 {
            ("whsec_sha256", SignatureMethod::HmacSha256)
        } else {
            ("whsec_sha512", SignatureMethod::HmacSha512)
        };
        assert!(verify_bytes(&request.body, &signature, secret, method).unwrap());
        assert!(!verify_bytes(&request.body, &signature, "wrong", method).unwrap());
    }
}

// ============================================================================
// Retries and Dead Letters
// ============================================================================

#[tokio::test]
async fn test_server_errors_are_retried_then_dead_lettered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .retry(
                    RetryConfig::default()
                        .max_attempts(3)
                        .backoff(BackoffStrategy::Exponential)
                        .initial_delay(Duration::from_millis(100)),
                )
                .build(),
        )
        .unwrap();

    let results = adapter
        .deliver_event(WebhookEvent::new("order.created", json!({})))
        .await;

    let delivery = &results[&id];
    assert_eq!(delivery.status, DeliveryStatus::Failed);
    assert_eq!(delivery.attempt, 3);
    assert_eq!(delivery.status_code, Some(500));
    assert_eq!(delivery.response_body.as_deref(), Some("boom"));

    let dead = adapter.get_dead_letter_queue(None);
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].id, delivery.id);

    let received = server.received_requests().await.unwrap();
    let attempts: Vec<String> = received
        .iter()
        .map(|r| header_value(r, HEADER_DELIVERY_ATTEMPT))
        .collect();
    assert_eq!(attempts, ["1", "2", "3"]);
}

#[tokio::test]
async fn test_dead_letter_retry_succeeds_once_endpoint_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .retry(RetryConfig::default().max_attempts(1))
                .build(),
        )
        .unwrap();

    let failed = adapter
        .deliver_event(WebhookEvent::new("order.created", json!({})))
        .await[&id]
        .clone();
    assert_eq!(failed.status, DeliveryStatus::Failed);

    let retried = adapter.retry_delivery(failed.id).await.unwrap();

    assert!(retried.is_success());
    assert_eq!(retried.attempt, 2);
    assert!(adapter.get_dead_letter_queue(None).is_empty());

    let received = server.received_requests().await.unwrap();
    assert_eq!(header_value(&received[1], HEADER_DELIVERY_ATTEMPT), "2");
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .timeout(Duration::from_millis(100))
                .retry(RetryConfig::default().max_attempts(1))
                .build(),
        )
        .unwrap();

    let results = adapter
        .deliver_event(WebhookEvent::new("order.created", json!({})))
        .await;

    let delivery = &results[&id];
    assert_eq!(delivery.status, DeliveryStatus::Failed);
    assert_eq!(delivery.error.as_deref(), Some("Request timed out after 100ms"));
    assert_eq!(delivery.status_code, None);
}

// ============================================================================
// Rate Limiting and Batching
// ============================================================================

#[tokio::test]
async fn test_second_event_within_window_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = create_adapter();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["*"])
                .rate_limit(RateLimitConfig::new(1, Duration::from_millis(1000)))
                .build(),
        )
        .unwrap();

    let first = adapter
        .deliver_event(WebhookEvent::new("a", json!({})))
        .await;
    let second = adapter
        .deliver_event(WebhookEvent::new("b", json!({})))
        .await;

    assert!(first[&id].is_success());
    assert_eq!(second[&id].status, DeliveryStatus::Failed);
    assert_eq!(second[&id].error.as_deref(), Some("Rate limit exceeded"));
    assert!(adapter.get_dead_letter_queue(None).is_empty());
}

#[tokio::test]
async fn test_batch_is_sent_as_single_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(HEADER_EVENT_TYPE, "batch"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = AdapterConfig::builder()
        .batch(BatchDeliveryOptions::new(3, Duration::from_secs(30)))
        .build()
        .unwrap();
    let adapter = WebhookAdapter::new(config).unwrap();
    let id = adapter
        .register_webhook(
            WebhookRegistrationBuilder::new(hook_url(&server), ["order.*"])
                .batch(true)
                .build(),
        )
        .unwrap();

    for n in 0..2 {
        let results = adapter
            .deliver_event(WebhookEvent::new("order.created", json!({"n": n})))
            .await;
        assert!(results.is_empty());
    }
    let results = adapter
        .deliver_event(WebhookEvent::new("order.updated", json!({"n": 2})))
        .await;
    assert!(results[&id].is_success());

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let events = body["data"]["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2]["type"], "order.updated");
    assert_eq!(body["metadata"]["batch_size"], 3);
}
