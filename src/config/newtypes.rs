//! Validated newtype wrappers for identifiers and configuration values.
//!
//! This module provides type-safe wrappers that validate their contents on
//! construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ConfigError::InvalidId {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier of a registered webhook.
    ///
    /// Generated once at registration and never changed afterwards.
    ///
    /// # Example
    ///
    /// ```rust
    /// use webhook_delivery::WebhookId;
    ///
    /// let id = WebhookId::generate();
    /// let parsed: WebhookId = id.to_string().parse().unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    WebhookId,
    "webhook"
);

uuid_id!(
    /// Unique identifier of a delivery. Reused across retry attempts.
    DeliveryId,
    "delivery"
);

uuid_id!(
    /// Unique identifier of an event.
    EventId,
    "event"
);

/// A validated webhook destination URL.
///
/// Only absolute `http` and `https` URLs with a host are accepted.
///
/// # Example
///
/// ```rust
/// use webhook_delivery::WebhookUrl;
///
/// let url = WebhookUrl::new("https://hooks.example.com/orders").unwrap();
/// assert_eq!(url.scheme(), "https");
/// assert_eq!(url.host_name(), Some("hooks.example.com"));
///
/// assert!(WebhookUrl::new("ftp://example.com").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookUrl(reqwest::Url);

impl WebhookUrl {
    /// Creates a new validated destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the URL cannot be parsed, has a
    /// scheme other than `http`/`https`, or has no host.
    pub fn new(url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = url.as_ref().trim();
        let invalid = |reason: &str| ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("destination URL is required"));
        }

        let parsed = reqwest::Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(invalid("URL has no host"));
        }

        Ok(Self(parsed))
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Returns the parsed URL.
    #[must_use]
    pub const fn as_url(&self) -> &reqwest::Url {
        &self.0
    }
}

impl AsRef<str> for WebhookUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for WebhookUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for WebhookUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A shared secret used to sign webhook payloads.
///
/// # Security
///
/// The `Debug` implementation masks the secret value, displaying only
/// `WebhookSecret(*****)` instead of the actual key.
///
/// # Example
///
/// ```rust
/// use webhook_delivery::WebhookSecret;
///
/// let secret = WebhookSecret::new("whsec_123").unwrap();
/// assert_eq!(format!("{:?}", secret), "WebhookSecret(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(String);

impl WebhookSecret {
    /// Creates a new validated secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySecret`] if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(secret))
    }
}

impl AsRef<str> for WebhookSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(*****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_id_round_trips_through_display() {
        let id = WebhookId::generate();
        let parsed: WebhookId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| DeliveryId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_malformed_id_is_rejected() {
        let result: Result<WebhookId, _> = "wh_123".parse();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidId { kind: "webhook", .. })
        ));

        let result: Result<DeliveryId, _> = "".parse();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidId { kind: "delivery", .. })
        ));
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = EventId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_url_accepts_http_and_https() {
        assert!(WebhookUrl::new("http://localhost:8080/hook").is_ok());
        assert!(WebhookUrl::new("https://example.com").is_ok());
    }

    #[test]
    fn test_url_rejects_invalid_values() {
        assert!(matches!(
            WebhookUrl::new(""),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            WebhookUrl::new("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            WebhookUrl::new("mailto:someone@example.com"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_url_trims_whitespace() {
        let url = WebhookUrl::new("  https://example.com/hook  ").unwrap();
        assert_eq!(url.as_ref(), "https://example.com/hook");
    }

    #[test]
    fn test_url_deserialize_validates() {
        let ok: Result<WebhookUrl, _> = serde_json::from_str(r#""https://example.com/a""#);
        assert!(ok.is_ok());

        let bad: Result<WebhookUrl, _> = serde_json::from_str(r#""ftp://example.com""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_secret_rejects_empty() {
        assert!(matches!(WebhookSecret::new(""), Err(ConfigError::EmptySecret)));
    }

    #[test]
    fn test_secret_debug_is_masked() {
        let secret = WebhookSecret::new("super-secret").unwrap();
        let debug = format!("{secret:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(secret.as_ref(), "super-secret");
    }
}
