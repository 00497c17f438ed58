//! WebSocket transport layer.
//!
//! A hand-rolled, blocking RFC 6455 client: just enough WebSocket to carry
//! DevTools-style JSON text messages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │                              │  Remote target  │
//! │                 │   masked text frames ──►     │                 │
//! │  WebSocket      │◄────────────────────────────►│  DevTools       │
//! │  → frame codec  │   ◄── text / ping / close    │  endpoint       │
//! │  → TCP / TLS    │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `WebSocket::connect` - TCP (and TLS for `wss`), then HTTP upgrade
//! 2. `WebSocket::send_text` / `WebSocket::receive_text` - message exchange
//! 3. `WebSocket::close` - close frame, socket released (also on drop)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket owner, handshake, message I/O |
//! | `frame` | Pure frame encode/decode and masking |
//! | `handshake` | Upgrade request and response checks |
//! | `random` | Injectable randomness for keys and masks |
//! | `stream` | Plain or TLS socket |

// ============================================================================
// Submodules
// ============================================================================

/// Blocking WebSocket connection.
pub mod connection;

/// Frame codec.
pub mod frame;

/// HTTP upgrade handshake.
pub mod handshake;

/// Randomness sources.
pub mod random;

/// Plain or TLS stream.
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ConnectionState, WebSocket};
pub use frame::{Frame, FrameHeader, Opcode};
pub use random::{FixedRandom, RandomSource, ThreadRandom};
