//! Thread-shareable session handle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use serde_json::Value;

use crate::error::Result;
use crate::protocol::Event;

use super::Session;

// ============================================================================
// SharedSession
// ============================================================================

/// A [`Session`] behind a lock, cloneable across threads.
///
/// Every operation holds the lock for its whole duration, so concurrent
/// callers are serialized. A long `poll_event` blocks every other caller
/// until it returns. There is no fairness guarantee.
///
/// # Example
///
/// ```ignore
/// let shared = SharedSession::new(Session::connect(url, &options)?);
///
/// let worker = shared.clone();
/// std::thread::spawn(move || worker.call("Runtime.enable", None));
///
/// shared.call("Page.enable", None)?;
/// ```
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    /// Wraps a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Locks the session for a sequence of operations.
    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    /// See [`Session::call`].
    ///
    /// # Errors
    ///
    /// Same as [`Session::call`].
    pub fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.inner.lock().call(method, params)
    }

    /// See [`Session::call_with_timeout`].
    ///
    /// # Errors
    ///
    /// Same as [`Session::call_with_timeout`].
    pub fn call_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Value> {
        self.inner.lock().call_with_timeout(method, params, timeout)
    }

    /// See [`Session::poll_event`].
    ///
    /// # Errors
    ///
    /// Same as [`Session::poll_event`].
    pub fn poll_event(&self, method: &str, timeout: Duration) -> Result<Option<Event>> {
        self.inner.lock().poll_event(method, timeout)
    }

    /// See [`Session::close`].
    pub fn close(&self) {
        self.inner.lock().close();
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}

// ============================================================================
// Tests
// ============================================================================
