//! DevTools RPC - blocking WebSocket client for browser debugging endpoints.
//!
//! This library talks to a DevTools-style remote debugging endpoint (for
//! example a Chromium page target) over a minimal, hand-rolled WebSocket
//! client. It has no async runtime and no background threads.
//!
//! # Architecture
//!
//! - **Transport**: RFC 6455 client frames over TCP or TLS, with handshake,
//!   ping/pong and close handling
//! - **Session**: JSON requests with increasing ids, correlated responses and
//!   a queue of everything that arrived out of turn
//! - **Wait**: polling helper that remembers failures and surfaces the last
//!   one at timeout
//!
//! Key design principles:
//!
//! - One owner per connection; every I/O operation takes `&mut self`
//! - A single read loop demultiplexes responses and events
//! - Every blocking operation has a deadline
//! - Randomness (handshake key, frame masks) is injectable for tests
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use devtools_rpc::{ClientOptions, Result, Session};
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let options = ClientOptions::default();
//!     let mut session = Session::connect("ws://127.0.0.1:9222/devtools/page/ABC", &options)?;
//!
//!     session.enable_domain("Page")?;
//!     session.call("Page.navigate", Some(json!({"url": "https://example.com"})))?;
//!
//!     if session
//!         .poll_event("Page.loadEventFired", Duration::from_secs(30))?
//!         .is_some()
//!     {
//!         let title = session.evaluate("document.title")?;
//!         println!("Page title: {title}");
//!     }
//!
//!     session.close();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Call id newtype and generator |
//! | [`options`] | Client configuration |
//! | [`protocol`] | JSON message types |
//! | [`session`] | RPC session: [`Session`], [`SharedSession`] |
//! | [`transport`] | WebSocket client: [`WebSocket`] |
//! | [`wait`] | Wait-for-condition polling |
//!
//! # Features
//!
//! - **`tls`** (default): `wss://` support through `native-tls`

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrapper for request correlation ids.
pub mod identifiers;

/// Client configuration.
pub mod options;

/// JSON message types.
///
/// Requests, responses, events and inbound message classification.
pub mod protocol;

/// RPC session.
///
/// Request/response correlation and event polling.
pub mod session;

/// WebSocket transport layer.
///
/// Frame codec, handshake and blocking connection.
pub mod transport;

/// Wait-for-condition polling.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CallId, CallIdGenerator};

// Configuration
pub use options::ClientOptions;

// Protocol types
pub use protocol::{Event, Message, Request, Response};

// Session types
pub use session::{Session, SharedSession};

// Transport types
pub use transport::{ConnectionState, FixedRandom, RandomSource, ThreadRandom, WebSocket};

// Waiting
pub use wait::{Waiter, wait_for, wait_until};
