//! Webhook-specific error types.
//!
//! This module contains the error type returned by registration, signing and
//! retry operations.
//!
//! # Error Handling
//!
//! - [`WebhookError::InvalidConfiguration`]: A registration or patch was rejected
//! - [`WebhookError::UnsupportedSignatureMethod`]: JWT signing was requested
//! - [`WebhookError::WebhookNotFound`]: An operation referenced an unknown webhook
//! - [`WebhookError::DeliveryNotFound`]: A retry referenced an unknown delivery
//! - [`WebhookError::Config`]: Wrapped [`ConfigError`] from a newtype constructor
//! - [`WebhookError::Serialization`]: An event payload could not be serialized
//! - [`WebhookError::Http`]: The default HTTP transport could not be built
//!
//! Delivery failures are *not* errors. `deliver_event` reports them as
//! statuses on the returned deliveries.
//!
//! # Example
//!
//! ```rust
//! use webhook_delivery::webhooks::WebhookError;
//!
//! let error = WebhookError::InvalidConfiguration {
//!     reason: "at least one event pattern is required".to_string(),
//! };
//! assert!(error.to_string().contains("event pattern"));
//! ```

use crate::clients::HttpError;
use crate::config::{DeliveryId, WebhookId};
use crate::error::ConfigError;
use thiserror::Error;

/// Error type for webhook registration, signing and retry operations.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// A registration or patch failed validation.
    ///
    /// No state is changed when this error is returned.
    #[error("Invalid webhook configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The requested signature method is recognized but not implemented.
    #[error("Unsupported signature method: {method}")]
    UnsupportedSignatureMethod {
        /// Name of the method.
        method: String,
    },

    /// No webhook is registered under the given id.
    #[error("Webhook not found: {id}")]
    WebhookNotFound {
        /// The id that was looked up.
        id: WebhookId,
    },

    /// No active or dead-lettered delivery has the given id.
    #[error("Delivery not found: {id}")]
    DeliveryNotFound {
        /// The id that was looked up.
        id: DeliveryId,
    },

    /// A configuration value failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An event payload could not be converted to JSON.
    #[error("Failed to serialize event payload: {message}")]
    Serialization {
        /// The serializer's error message.
        message: String,
    },

    /// The HTTP transport could not be created.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl From<serde_json::Error> for WebhookError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl WebhookError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_configuration_error_message() {
        let error = WebhookError::invalid("max_attempts must be at least 1");
        let message = error.to_string();
        assert!(message.contains("Invalid webhook configuration"));
        assert!(message.contains("max_attempts"));
    }

    #[test]
    fn test_unsupported_signature_method_message() {
        let error = WebhookError::UnsupportedSignatureMethod {
            method: "jwt".to_string(),
        };
        assert!(error.to_string().contains("jwt"));
    }

    #[test]
    fn test_not_found_messages_include_id() {
        let id = WebhookId::generate();
        let error = WebhookError::WebhookNotFound { id };
        assert!(error.to_string().contains(&id.to_string()));

        let id = DeliveryId::generate();
        let error = WebhookError::DeliveryNotFound { id };
        assert!(error.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_config_error_converts_transparently() {
        let error: WebhookError = ConfigError::EmptySecret.into();
        assert!(matches!(error, WebhookError::Config(ConfigError::EmptySecret)));
        assert_eq!(error.to_string(), ConfigError::EmptySecret.to_string());
    }

    #[test]
    fn test_serde_json_error_converts_to_serialization() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: WebhookError = json_error.into();
        assert!(matches!(error, WebhookError::Serialization { .. }));
    }

    #[test]
    fn test_http_error_converts_transparently() {
        let error: WebhookError = HttpError::Timeout.into();
        assert!(matches!(error, WebhookError::Http(HttpError::Timeout)));
    }

    #[test]
    fn test_webhook_error_implements_std_error() {
        let error: &dyn std::error::Error = &WebhookError::invalid("x");
        let _ = error;
    }
}
