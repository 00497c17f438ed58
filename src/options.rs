//! Client configuration.
//!
//! Provides a type-safe interface for the timeouts and limits used by the
//! transport, the RPC session and the runtime helpers.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use devtools_rpc::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_call_timeout(Duration::from_secs(10))
//!     .with_poll_interval(Duration::from_millis(250));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(45);

/// Default timeout for a single RPC call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(45);

/// Default interval between condition polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default largest accepted frame payload (64 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 << 20;

// ============================================================================
// ClientOptions
// ============================================================================

/// Timeouts and limits for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Bound on TCP connect, TLS and the upgrade handshake together.
    pub connect_timeout: Duration,

    /// Default deadline for [`Session::call`](crate::Session::call).
    pub call_timeout: Duration,

    /// Interval used by polling helpers built on [`wait_for`](crate::wait_for).
    pub poll_interval: Duration,

    /// Frames announcing a larger payload are rejected.
    pub max_frame_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Creates options using one timeout for both connecting and calls.
    #[inline]
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            call_timeout: timeout,
            ..Self::new()
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the connect/handshake timeout.
    #[inline]
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the default call timeout.
    #[inline]
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the polling interval.
    #[inline]
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the largest accepted frame payload.
    #[inline]
    #[must_use]
    pub const fn with_max_frame_size(mut self, bytes: usize) -> Self {
        self.max_frame_size = bytes;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
