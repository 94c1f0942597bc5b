//! Event-type pattern matching.
//!
//! A pattern is one of:
//!
//! - `*`: matches every event type
//! - `prefix.*`: matches any type starting with `prefix.`
//! - anything else: matches that exact type
//!
//! ```rust
//! use webhook_delivery::webhooks::matches;
//!
//! assert!(matches("order.created", &["order.*"]));
//! assert!(!matches("orders.created", &["order.*"]));
//! assert!(matches("anything", &["*"]));
//! ```

/// Returns `true` if `event_type` matches any of `patterns`.
#[must_use]
pub fn matches<S: AsRef<str>>(event_type: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern_matches(event_type, pattern.as_ref()))
}

fn pattern_matches(event_type: &str, pattern: &str) -> bool {
    if pattern == "*" || pattern == event_type {
        return true;
    }
    // Keep the trailing dot so `order.*` does not match `orders.x`.
    pattern
        .strip_suffix('*')
        .filter(|prefix| prefix.ends_with('.'))
        .is_some_and(|prefix| event_type.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_matches_everything() {
        assert!(matches("order.created", &["*"]));
        assert!(matches("", &["*"]));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(matches("foo.bar", &["foo.*"]));
        assert!(matches("foo.bar.baz", &["foo.*"]));
        assert!(!matches("fooz.bar", &["foo.*"]));
        assert!(!matches("foo", &["foo.*"]));
    }

    #[test]
    fn test_exact_match_only_identical() {
        assert!(matches("user.created", &["user.created"]));
        assert!(!matches("user.created.v2", &["user.created"]));
        assert!(!matches("User.created", &["user.created"]));
    }

    #[test]
    fn test_any_of_several_patterns() {
        let patterns = vec!["user.created".to_string(), "order.*".to_string()];
        assert!(matches("order.paid", &patterns));
        assert!(matches("user.created", &patterns));
        assert!(!matches("user.deleted", &patterns));
    }

    #[test]
    fn test_empty_pattern_list_matches_nothing() {
        let patterns: [&str; 0] = [];
        assert!(!matches("order.created", &patterns));
    }

    #[test]
    fn test_star_inside_pattern_is_literal() {
        assert!(!matches("order.created", &["order*"]));
        assert!(matches("order*", &["order*"]));
    }
}
