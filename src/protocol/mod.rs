//! DevTools-style protocol message types.
//!
//! This module defines the JSON messages exchanged over the WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response (`result` or `error`) |
//! | `Event` | Remote → Local | Unsolicited notification |
//!
//! # Method Naming
//!
//! Methods and events follow `Domain.methodName` format:
//!
//! - `Runtime.evaluate`
//! - `Page.enable`
//! - `Page.loadEventFired`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Event type |
//! | `message` | Inbound message classification |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Event message type.
pub mod event;

/// Inbound message classification.
pub mod message;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::Event;
pub use message::Message;
pub use request::{Request, Response};
