//! HTTP-specific error types for outbound webhook calls.
//!
//! This module contains the unified [`HttpError`] returned by every
//! [`HttpTransport`](crate::clients::HttpTransport) implementation.
//!
//! # Error Handling
//!
//! Every variant is a transport-level failure and is treated as retryable by
//! the delivery engine. Non-2xx responses are *not* errors at this layer; they
//! are returned as an [`HttpResponse`](crate::clients::HttpResponse) and
//! classified by the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use webhook_delivery::clients::{HttpError, HttpTransport};
//!
//! match transport.send(request).await {
//!     Ok(response) => println!("HTTP {}", response.code),
//!     Err(HttpError::Timeout) => println!("deadline exceeded"),
//!     Err(HttpError::Network(e)) => println!("network error: {}", e),
//!     Err(HttpError::Transport { message }) => println!("transport error: {}", message),
//! }
//! ```

use thiserror::Error;

/// Unified error type for all HTTP transport failures.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request deadline passed before a response was received.
    #[error("Request timed out")]
    Timeout,

    /// Network or connection error (DNS failure, connection refused, TLS).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Any other failure reported by a custom transport.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}
