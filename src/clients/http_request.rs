//! HTTP request types for outbound webhook calls.
//!
//! This module provides the [`HttpRequest`] type and its builder. Every
//! request is a `POST` carrying a pre-serialized body and an absolute
//! deadline after which the transport must give up.

use std::collections::HashMap;

use tokio::time::Instant;

/// An HTTP `POST` request to a webhook destination.
///
/// Use [`HttpRequest::builder`] to construct requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use webhook_delivery::clients::HttpRequest;
///
/// let request = HttpRequest::builder("https://hooks.example.com/orders", Instant::now() + Duration::from_secs(10))
///     .header("X-Event-Type", "order.created")
///     .body(br#"{"id":1}"#.to_vec())
///     .build();
///
/// assert_eq!(request.headers.get("X-Event-Type").map(String::as_str), Some("order.created"));
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// Absolute destination URL.
    pub url: String,
    /// Headers to send with the request.
    pub headers: HashMap<String, String>,
    /// Serialized request body.
    pub body: Vec<u8>,
    /// Instant after which the request is abandoned.
    pub deadline: Instant,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(url: impl Into<String>, deadline: Instant) -> HttpRequestBuilder {
        HttpRequestBuilder::new(url, deadline)
    }

    /// Returns the value of a header, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    url: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    deadline: Instant,
}

impl HttpRequestBuilder {
    fn new(url: impl Into<String>, deadline: Instant) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            deadline,
        }
    }

    /// Adds a single header, replacing any previous value for the same name.
    ///
    /// Names compare case-insensitively, so `content-type` replaces
    /// `Content-Type`.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Adds several headers at once.
    #[must_use]
    pub fn headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (key, value) in headers {
            self.insert(key.clone(), value.clone());
        }
        self
    }

    fn insert(&mut self, key: String, value: String) {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value);
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the [`HttpRequest`].
    #[must_use]
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            url: self.url,
            headers: self.headers,
            body: self.body,
            deadline: self.deadline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_builder_collects_headers_and_body() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let request = HttpRequest::builder("https://example.com/hook", deadline)
            .header("X-Webhook-Id", "abc")
            .body(b"{}".to_vec())
            .build();

        assert_eq!(request.url, "https://example.com/hook");
        assert_eq!(request.body, b"{}");
        assert_eq!(request.deadline, deadline);
        assert_eq!(request.header("x-webhook-id"), Some("abc"));
    }

    #[test]
    fn test_later_header_replaces_earlier_one() {
        let mut custom = HashMap::new();
        custom.insert("X-Tenant".to_string(), "beta".to_string());

        let request = HttpRequest::builder("https://example.com", Instant::now())
            .header("X-Tenant", "alpha")
            .headers(&custom)
            .build();

        assert_eq!(request.header("X-Tenant"), Some("beta"));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_header_replacement_ignores_case() {
        let mut custom = HashMap::new();
        custom.insert("content-type".to_string(), "text/plain".to_string());

        let request = HttpRequest::builder("https://example.com", Instant::now())
            .headers(&custom)
            .header("Content-Type", "application/json")
            .build();

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_header_lookup_returns_none_for_missing() {
        let request = HttpRequest::builder("https://example.com", Instant::now()).build();
        assert!(request.header("X-Missing").is_none());
        assert!(request.body.is_empty());
    }
}
