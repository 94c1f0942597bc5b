//! HTTP response types for outbound webhook calls.
//!
//! This module provides the [`HttpResponse`] type returned by transports.

use std::collections::HashMap;

/// A response received from a webhook destination.
///
/// Header names are stored lowercase. The body is kept as text; the delivery
/// engine truncates it before storing it on a delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lowercase name.
    pub headers: HashMap<String, Vec<String>>,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub fn new(code: u16, headers: HashMap<String, Vec<String>>, body: impl Into<String>) -> Self {
        Self {
            code,
            headers,
            body: body.into(),
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get("x-request-id")
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        assert!(HttpResponse::new(200, HashMap::new(), "").is_ok());
        assert!(HttpResponse::new(201, HashMap::new(), "").is_ok());
        assert!(HttpResponse::new(299, HashMap::new(), "").is_ok());
    }

    #[test]
    fn test_is_ok_returns_false_for_other_codes() {
        for code in [199, 301, 400, 404, 429, 500, 503] {
            assert!(!HttpResponse::new(code, HashMap::new(), "").is_ok(), "{code}");
        }
    }

    #[test]
    fn test_request_id_extraction() {
        let mut headers = HashMap::new();
        headers.insert("x-request-id".to_string(), vec!["req-42".to_string()]);
        let response = HttpResponse::new(500, headers, "boom");

        assert_eq!(response.request_id(), Some("req-42"));
        assert_eq!(response.body, "boom");
    }
}
