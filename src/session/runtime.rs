//! Page runtime helpers built on [`Session::call`].

use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::wait::Waiter;

use super::Session;

// ============================================================================
// Constants
// ============================================================================

/// Ready states at which the DOM can be scripted.
const READY_STATES: [&str; 2] = ["interactive", "complete"];

// ============================================================================
// Session - Runtime
// ============================================================================

impl Session {
    /// Evaluates a JavaScript expression and returns its value.
    ///
    /// The value is returned by value; when the remote cannot serialize it,
    /// its description string is returned instead.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let path = session.evaluate("location.pathname")?;
    /// assert_eq!(path, "/dashboard");
    /// ```
    ///
    /// # Errors
    ///
    /// - [`Error::Evaluation`] if the expression threw
    /// - any error from [`Session::call`]
    pub fn evaluate(&mut self, expression: &str) -> Result<Value> {
        debug!(expression_len = expression.len(), "Evaluating expression");

        let result = self.call(
            "Runtime.evaluate",
            Some(json!({
                "expression": expression,
                "returnByValue": true,
                "awaitPromise": false,
                "userGesture": true,
            })),
        )?;

        if let Some(details) = result.get("exceptionDetails") {
            let message = exception_text(details);
            debug!(%message, "Expression threw");
            return Err(Error::evaluation(message));
        }

        Ok(remote_object_value(result.get("result")))
    }

    /// Enables event reporting for a domain, e.g. `"Page"` or `"Runtime"`.
    ///
    /// # Errors
    ///
    /// Any error from [`Session::call`].
    pub fn enable_domain(&mut self, domain: &str) -> Result<()> {
        debug!(domain, "Enabling domain");
        self.call(&format!("{domain}.enable"), None)?;
        Ok(())
    }

    /// Returns `true` once `document.readyState` is interactive or complete.
    ///
    /// # Errors
    ///
    /// Any error from [`Session::evaluate`].
    pub fn document_is_ready(&mut self) -> Result<bool> {
        let state = self.evaluate("document.readyState")?;
        Ok(state.as_str().is_some_and(|s| READY_STATES.contains(&s)))
    }

    /// Returns a [`Waiter`] polling at this session's interval.
    #[must_use]
    pub fn waiter<'a, E>(&self, timeout: Duration) -> Waiter<'a, E> {
        Waiter::new(timeout).interval(self.poll_interval())
    }

    /// Waits until the document can be scripted, polling at
    /// [`Session::poll_interval`].
    ///
    /// Remote and evaluation failures count as "not ready yet". Call
    /// timeouts are retried until the deadline. Returns `false` if the page
    /// did not become ready in time.
    ///
    /// # Errors
    ///
    /// - the last call timeout, if the deadline passes while the remote
    ///   keeps timing out
    /// - other transport failures, which end the wait immediately
    pub fn wait_for_document_ready(&mut self, timeout: Duration) -> Result<bool> {
        debug!(
            timeout_ms = timeout.as_millis() as u64,
            interval_ms = self.poll_interval().as_millis() as u64,
            "Waiting for document"
        );

        let ready = self
            .waiter(timeout)
            .abort_if(|e: &Error| !e.is_remote() && !e.is_timeout())
            .until(|| match self.document_is_ready() {
                Err(e) if e.is_remote() => Ok(false),
                other => other,
            })?;

        debug!(ready, "Document wait finished");
        Ok(ready)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Picks a readable message out of `exceptionDetails`.
fn exception_text(details: &Value) -> String {
    let exception = details.get("exception");

    exception
        .and_then(|e| e.get("description"))
        .and_then(non_empty)
        .or_else(|| exception.and_then(|e| e.get("value")).and_then(non_empty))
        .or_else(|| details.get("text").and_then(non_empty))
        .unwrap_or_else(|| details.to_string())
}

/// Renders a JSON value as text unless it is empty, null or false.
fn non_empty(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Unwraps a `RemoteObject`: `value` when present, else `description`.
fn remote_object_value(object: Option<&Value>) -> Value {
    let Some(object) = object else {
        return Value::Null;
    };

    object
        .get("value")
        .or_else(|| object.get("description"))
        .cloned()
        .unwrap_or(Value::Null)
}

// ============================================================================
// Tests
// ============================================================================
