//! Polling until a condition holds.
//!
//! A predicate is evaluated repeatedly until it yields a value or the
//! deadline passes. Errors from the predicate do not end the wait: the most
//! recent one is remembered and returned if the deadline passes without a
//! value.
//!
//! # Outcomes
//!
//! | Predicate history | Result |
//! |-------------------|--------|
//! | `Ok(Some(v))` at any point | `Ok(Some(v))` immediately |
//! | only `Ok(None)` until the deadline | `Ok(None)` |
//! | at least one `Err` before the deadline | the last `Err` |
//! | an `Err` matched by [`Waiter::abort_if`] | that `Err` immediately |
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use devtools_rpc::wait::{Waiter, wait_for};
//!
//! let title = wait_for(
//!     || session.evaluate("document.title").map(|v| v.as_str().map(str::to_owned)),
//!     Duration::from_secs(10),
//!     Duration::from_millis(250),
//! )?;
//!
//! let ready = Waiter::new(Duration::from_secs(30))
//!     .interval(Duration::from_millis(500))
//!     .abort_if(|e: &Error| e.is_connection_error())
//!     .until(|| session.document_is_ready())?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::options::DEFAULT_POLL_INTERVAL;

// ============================================================================
// Waiter
// ============================================================================

/// Configurable polling loop.
///
/// By default every predicate error is remembered and polling continues.
/// Use [`Waiter::abort_if`] to end the wait early for errors that cannot
/// recover.
pub struct Waiter<'a, E> {
    timeout: Duration,
    interval: Duration,
    abort_if: Option<Box<dyn Fn(&E) -> bool + 'a>>,
}

impl<E> fmt::Debug for Waiter<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("abort_if", &self.abort_if.is_some())
            .finish()
    }
}

impl<'a, E> Waiter<'a, E> {
    /// Creates a waiter with the default poll interval.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
            abort_if: None,
        }
    }

    /// Sets the pause between evaluations.
    #[inline]
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Ends the wait immediately on errors matching `classify`.
    #[must_use]
    pub fn abort_if<F>(mut self, classify: F) -> Self
    where
        F: Fn(&E) -> bool + 'a,
    {
        self.abort_if = Some(Box::new(classify));
        self
    }

    /// Polls `predicate` until it yields a value or the deadline passes.
    ///
    /// The predicate is evaluated only while the deadline has not passed,
    /// and sleeps never run past it. A timeout too large to form a deadline
    /// polls until the predicate yields a value or an aborting error.
    ///
    /// # Errors
    ///
    /// The last predicate error if the deadline passes without a value, or
    /// the first error matched by [`Waiter::abort_if`].
    pub fn run<T, F>(&self, mut predicate: F) -> Result<Option<T>, E>
    where
        F: FnMut() -> Result<Option<T>, E>,
    {
        let deadline = Instant::now().checked_add(self.timeout);
        let mut last_error = None;
        let mut attempts = 0u32;

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }

            attempts = attempts.saturating_add(1);
            match predicate() {
                Ok(Some(value)) => {
                    trace!(attempts, "Condition met");
                    return Ok(Some(value));
                }
                Ok(None) => {}
                Err(e) => {
                    if self.abort_if.as_ref().is_some_and(|abort| abort(&e)) {
                        debug!(attempts, "Wait aborted by predicate error");
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }

            let pause = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    self.interval.min(remaining)
                }
                None => self.interval,
            };
            thread::sleep(pause);
        }

        debug!(
            attempts,
            timeout_ms = self.timeout.as_millis() as u64,
            failed = last_error.is_some(),
            "Wait deadline passed"
        );

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Polls a boolean predicate. Returns `Ok(true)` once it holds.
    ///
    /// # Errors
    ///
    /// Same as [`Waiter::run`].
    pub fn until<F>(&self, mut predicate: F) -> Result<bool, E>
    where
        F: FnMut() -> Result<bool, E>,
    {
        self.run(|| predicate().map(|ok| ok.then_some(())))
            .map(|found| found.is_some())
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Polls `predicate` every `interval` until it yields a value or `timeout`
/// passes.
///
/// # Errors
///
/// The last error the predicate returned, if the deadline passes without a
/// value.
pub fn wait_for<T, E, F>(predicate: F, timeout: Duration, interval: Duration) -> Result<Option<T>, E>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    Waiter::new(timeout).interval(interval).run(predicate)
}

/// Polls a boolean predicate. Returns `Ok(false)` on a clean timeout.
///
/// # Errors
///
/// Same as [`wait_for`].
pub fn wait_until<E, F>(predicate: F, timeout: Duration, interval: Duration) -> Result<bool, E>
where
    F: FnMut() -> Result<bool, E>,
{
    Waiter::new(timeout).interval(interval).until(predicate)
}

// ============================================================================
// Tests
// ============================================================================
