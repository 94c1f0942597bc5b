//! Outbound HTTP layer for webhook delivery.
//!
//! This module isolates the network from the delivery engine. The engine only
//! talks to the [`HttpTransport`] trait, so tests and embedders can swap in
//! their own transport.
//!
//! # Overview
//!
//! - [`HttpTransport`]: The seam the delivery engine sends through
//! - [`ReqwestTransport`]: Default `reqwest`-backed transport
//! - [`HttpRequest`]: A `POST` with headers, body and deadline
//! - [`HttpResponse`]: Status, headers and body text
//! - [`HttpError`]: Transport failures (timeout, network, custom)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use webhook_delivery::clients::{HttpRequest, HttpTransport, ReqwestTransport};
//!
//! let transport = ReqwestTransport::try_new(Some("MyApp/1.0"))?;
//! let request = HttpRequest::builder("https://hooks.example.com", Instant::now() + Duration::from_secs(30))
//!     .body(b"{}".to_vec())
//!     .build();
//!
//! let response = transport.send(request).await?;
//! ```

mod errors;
mod http_client;
mod http_request;
mod http_response;

pub use errors::HttpError;
pub use http_client::{user_agent, HttpTransport, ReqwestTransport, SDK_VERSION};
pub use http_request::{HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;
