//! HTTP transport for webhook delivery.
//!
//! This module provides the [`HttpTransport`] seam used by the delivery
//! engine, and [`ReqwestTransport`], the default implementation backed by
//! `reqwest`.

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::clients::errors::HttpError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sends a single webhook request and reports the response or the failure.
///
/// Implementations must honor [`HttpRequest::deadline`] and return
/// [`HttpError::Timeout`] once it passes. Non-2xx responses are returned as
/// `Ok`; classification is the caller's job.
///
/// # Implementing
///
/// The trait is object-safe so that the adapter can hold an
/// `Arc<dyn HttpTransport>`. Return a boxed future:
///
/// ```rust
/// use futures::future::BoxFuture;
/// use std::collections::HashMap;
/// use webhook_delivery::clients::{HttpError, HttpRequest, HttpResponse, HttpTransport};
///
/// struct AlwaysOk;
///
/// impl HttpTransport for AlwaysOk {
///     fn send<'a>(&'a self, _request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
///         Box::pin(async move { Ok(HttpResponse::new(204, HashMap::new(), "")) })
///     }
/// }
/// ```
pub trait HttpTransport: Send + Sync {
    /// Sends the request, resolving when a response arrives or the deadline passes.
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>>;
}

/// Default [`HttpTransport`] built on `reqwest`.
///
/// Adds a `User-Agent` header to every request unless the request sets its
/// own.
///
/// # Thread Safety
///
/// `ReqwestTransport` is `Send + Sync`; the inner client pools connections and
/// is shared by all deliveries.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport with a fresh `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if the TLS backend cannot be initialized.
    pub fn try_new(user_agent_prefix: Option<&str>) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;
        Ok(Self::with_client(client, user_agent_prefix))
    }

    /// Creates a transport around an existing `reqwest` client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, user_agent_prefix: Option<&str>) -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent(user_agent_prefix));
        Self {
            client,
            default_headers,
        }
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut req_builder = self.client.post(&request.url);

        for (key, value) in &self.default_headers {
            if request.header(key).is_none() {
                req_builder = req_builder.header(key, value);
            }
        }
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        let res = req_builder.body(request.body).send().await?;

        let code = res.status().as_u16();
        let headers = parse_response_headers(res.headers());
        let body = res.text().await.unwrap_or_default();

        Ok(HttpResponse::new(code, headers, body))
    }
}

impl HttpTransport for ReqwestTransport {
    fn send<'a>(&'a self, request: HttpRequest) -> BoxFuture<'a, Result<HttpResponse, HttpError>> {
        Box::pin(async move {
            let deadline = request.deadline;
            match tokio::time::timeout_at(deadline, self.execute(request)).await {
                Ok(Err(HttpError::Network(e))) if e.is_timeout() => Err(HttpError::Timeout),
                Ok(result) => result,
                Err(_) => Err(HttpError::Timeout),
            }
        })
    }
}

/// Builds the `User-Agent` value sent with every delivery.
#[must_use]
pub fn user_agent(prefix: Option<&str>) -> String {
    let prefix = prefix.map_or(String::new(), |p| format!("{p} | "));
    let rust_version = env!("CARGO_PKG_RUST_VERSION");
    format!("{prefix}Webhook Delivery v{SDK_VERSION} | Rust {rust_version}")
}

/// Parses response headers into a `HashMap`.
fn parse_response_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        let value = value.to_str().unwrap_or_default().to_string();
        result.entry(key).or_default().push(value);
    }
    result
}
