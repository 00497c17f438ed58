//! Inbound message classification.
//!
//! Every text frame read from the wire becomes exactly one [`Message`]:
//! a [`Response`] when it carries an `id`, otherwise an [`Event`] when it
//! carries a `method`.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CallId;

use super::{Event, Response};

// ============================================================================
// Message
// ============================================================================

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Reply to a request.
    Response(Response),
    /// Unsolicited notification.
    Event(Event),
}

impl Message {
    /// Parses and classifies a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMessage`] for invalid JSON, non-objects,
    /// non-integer ids and objects with neither `id` nor `method`.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::malformed(format!("invalid JSON from remote: {e}")))?;
        Self::from_value(value)
    }

    /// Classifies an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// See [`Message::parse`].
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::malformed("expected a JSON object"));
        };

        if let Some(id) = map.remove("id") {
            let id = id
                .as_u64()
                .map(CallId::new)
                .ok_or_else(|| Error::malformed(format!("response id is not an integer: {id}")))?;

            return Ok(Self::Response(Response {
                id,
                result: map.remove("result"),
                error: map.remove("error"),
            }));
        }

        match map.remove("method") {
            Some(Value::String(method)) => Ok(Self::Event(Event {
                method,
                params: map
                    .remove("params")
                    .unwrap_or_else(|| Value::Object(Map::new())),
            })),
            Some(other) => Err(Error::malformed(format!(
                "event method is not a string: {other}"
            ))),
            None => Err(Error::malformed("message has neither `id` nor `method`")),
        }
    }

    /// Returns the response id, if this is a response.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<CallId> {
        match self {
            Self::Response(response) => Some(response.id),
            Self::Event(_) => None,
        }
    }

    /// Returns the event method, if this is an event.
    #[inline]
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Response(_) => None,
            Self::Event(event) => Some(&event.method),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
