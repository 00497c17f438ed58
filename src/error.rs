//! Error types for the DevTools RPC client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_rpc::{Result, Session};
//!
//! fn example(session: &mut Session) -> Result<()> {
//!     session.call("Page.enable", None)?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Address | [`Error::UnsupportedScheme`], [`Error::InvalidUrl`], [`Error::MissingHost`] |
//! | Handshake | [`Error::HandshakeTimeout`], [`Error::HandshakeRejected`], [`Error::Tls`] |
//! | Connection | [`Error::ConnectionClosed`], [`Error::Timeout`], [`Error::Protocol`] |
//! | Remote | [`Error::RemoteError`], [`Error::Evaluation`], [`Error::MalformedMessage`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Address Errors
    // ========================================================================
    /// URL scheme is neither `ws` nor `wss`.
    #[error("Unsupported WebSocket scheme: {scheme}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL has no host component.
    #[error("URL has no host: {url}")]
    MissingHost {
        /// The offending URL.
        url: String,
    },

    // ========================================================================
    // Handshake Errors
    // ========================================================================
    /// Upgrade response header block not complete before the deadline.
    #[error("Timed out waiting for WebSocket handshake after {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Upgrade response did not switch protocols.
    #[error("Unexpected handshake response: {status_line}")]
    HandshakeRejected {
        /// Status line returned by the peer.
        status_line: String,
    },

    /// TLS negotiation failed.
    #[error("TLS error: {message}")]
    Tls {
        /// Description of the TLS failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection closed by the peer or by a previous `close()`.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation timeout.
    ///
    /// Returned when a read or a call exceeds its deadline.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Wire-level protocol violation.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The response to a call carried an `error` object.
    #[error("Remote error: {payload}")]
    RemoteError {
        /// The `error` field verbatim.
        payload: Value,
    },

    /// A text frame that is not a usable JSON message.
    #[error("Malformed message: {message}")]
    MalformedMessage {
        /// Description of what was wrong.
        message: String,
    },

    /// A remote expression evaluation threw.
    #[error("JavaScript evaluation failed: {message}")]
    Evaluation {
        /// Exception description reported by the remote side.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an unsupported scheme error.
    #[inline]
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Creates a missing host error.
    #[inline]
    pub fn missing_host(url: impl Into<String>) -> Self {
        Self::MissingHost { url: url.into() }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout: Duration) -> Self {
        Self::HandshakeTimeout {
            timeout_ms: duration_ms(timeout),
        }
    }

    /// Creates a handshake rejected error.
    #[inline]
    pub fn handshake_rejected(status_line: impl Into<String>) -> Self {
        Self::HandshakeRejected {
            status_line: status_line.into(),
        }
    }

    /// Creates a TLS error.
    #[inline]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: duration_ms(timeout),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a remote error from the response `error` field.
    #[inline]
    pub fn remote(payload: Value) -> Self {
        Self::RemoteError { payload }
    }

    /// Creates a malformed message error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage {
            message: message.into(),
        }
    }

    /// Creates an evaluation error.
    #[inline]
    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation {
            message: message.into(),
        }
    }
}

#[inline]
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HandshakeTimeout { .. } | Self::Timeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed
                | Self::HandshakeTimeout { .. }
                | Self::HandshakeRejected { .. }
                | Self::Tls { .. }
                | Self::Io(_)
        )
    }

    /// Returns `true` if the remote side rejected a request.
    ///
    /// Unlike timeouts, these are not worth retrying unchanged.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteError { .. } | Self::Evaluation { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
