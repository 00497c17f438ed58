//! Event message type.
//!
//! Events are notifications the remote end pushes without a request, such as
//! `Page.loadEventFired` or `Runtime.consoleAPICalled`.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data (empty object when absent).
    pub params: Value,
}

impl Event {
    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event { method: "Page.loadEventFired".into(), .. };
    /// assert_eq!(event.domain(), "Page");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event { method: "Page.loadEventFired".into(), .. };
    /// assert_eq!(event.event_name(), "loadEventFired");
    /// ```
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Gets a parameter by key.
    #[inline]
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_method_parts() {
        let event = Event {
            method: "Page.frameNavigated".to_string(),
            params: json!({"frame": {"id": "F1"}}),
        };
        assert_eq!(event.domain(), "Page");
        assert_eq!(event.event_name(), "frameNavigated");
        assert_eq!(event.param("frame").and_then(|f| f.get("id")), Some(&json!("F1")));
    }

    #[test]
    fn test_event_without_domain() {
        let event = Event {
            method: "ready".to_string(),
            params: json!({}),
        };
        assert_eq!(event.domain(), "ready");
        assert_eq!(event.event_name(), "");
        assert!(event.param("anything").is_none());
    }
}
