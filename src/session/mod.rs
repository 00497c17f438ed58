//! RPC session over a WebSocket connection.
//!
//! A [`Session`] sends JSON requests with increasing ids, matches responses
//! to them and keeps every other message in arrival order until asked for.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Session struct, calls and event polling |
//! | `runtime` | Expression evaluation, domain enabling, document readiness |
//! | `shared` | Lock-protected handle for use from several threads |
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use devtools_rpc::{ClientOptions, Session};
//!
//! let mut session = Session::connect(ws_url, &ClientOptions::default())?;
//! session.enable_domain("Page")?;
//!
//! let title = session.evaluate("document.title")?;
//! let loaded = session.poll_event("Page.loadEventFired", Duration::from_secs(10))?;
//! session.close();
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod runtime;
mod shared;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Session;
pub use shared::SharedSession;
