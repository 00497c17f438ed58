//! Request and Response message types.
//!
//! Defines the command sent to the remote end and the response it returns.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CallId;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "Domain.methodName",
///   "params": { ... }
/// }
/// ```
///
/// `params` is omitted when absent or an empty object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: CallId,

    /// Method name in `Domain.methodName` format.
    pub method: String,

    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a new request, dropping empty or null params.
    #[must_use]
    pub fn new(id: CallId, method: impl Into<String>, params: Option<Value>) -> Self {
        let params = params.filter(|p| match p {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        });

        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Serializes the request to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "error": { "code": -32601, "message": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Matches the request `id`.
    pub id: CallId,

    /// Result data, if present.
    pub result: Option<Value>,

    /// Error payload. Presence of the key marks an error, even when `null`.
    pub error: Option<Value>,
}

impl Response {
    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// A missing `result` yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteError`] carrying the `error` payload.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(payload) => Err(Error::remote(payload)),
            None => Ok(self.result.unwrap_or_else(|| Value::Object(Map::new()))),
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Gets a boolean value from the result.
    ///
    /// Returns false if key not found or not a boolean.
    #[inline]
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_bool())
            .unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
