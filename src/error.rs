//! Error types for the webhook delivery library.
//!
//! This module contains error types used throughout the crate for configuration
//! and validation errors.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use webhook_delivery::{ConfigError, WebhookUrl};
//!
//! let result = WebhookUrl::new("");
//! assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during configuration.
///
/// This enum represents all possible errors that can occur when creating
/// or validating configuration types. Each variant provides a clear,
/// actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Webhook secret cannot be empty.
    #[error("Webhook secret cannot be empty. Omit the secret to send unsigned deliveries.")]
    EmptySecret,

    /// Destination URL is invalid.
    #[error("Invalid destination URL '{url}': {reason}")]
    InvalidUrl {
        /// The invalid URL that was provided.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// An identifier could not be parsed.
    #[error("Invalid {kind} id '{value}'. Expected a UUID.")]
    InvalidId {
        /// The kind of identifier (webhook, delivery, event).
        kind: &'static str,
        /// The value that failed to parse.
        value: String,
    },

    /// A numeric or duration setting is out of range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the offending field.
        field: &'static str,
        /// The reason the value is invalid.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_secret_error_message() {
        let message = ConfigError::EmptySecret.to_string();
        assert!(message.contains("secret cannot be empty"));
    }

    #[test]
    fn test_invalid_url_error_message() {
        let error = ConfigError::InvalidUrl {
            url: "ftp://example.com".to_string(),
            reason: "scheme must be http or https".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ftp://example.com"));
        assert!(message.contains("http or https"));
    }

    #[test]
    fn test_invalid_id_error_message() {
        let error = ConfigError::InvalidId {
            kind: "webhook",
            value: "not-a-uuid".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("webhook"));
        assert!(message.contains("not-a-uuid"));
    }

    #[test]
    fn test_invalid_value_error_message() {
        let error = ConfigError::InvalidValue {
            field: "dead_letter_capacity",
            reason: "must be greater than zero".to_string(),
        };
        assert!(error.to_string().contains("dead_letter_capacity"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::EmptySecret;
        let _: &dyn std::error::Error = &error;
    }
}
