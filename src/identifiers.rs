//! Type-safe identifiers.
//!
//! Newtype wrappers keep correlation ids from mixing with other integers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// CallId
// ============================================================================

/// Correlation id of an RPC call.
///
/// Allocated by [`CallIdGenerator`], starting at 1 and never reused within a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(u64);

impl CallId {
    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CallId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// ============================================================================
// CallIdGenerator
// ============================================================================

/// Strictly increasing id counter.
#[derive(Debug)]
pub struct CallIdGenerator {
    next: u64,
}

impl Default for CallIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CallIdGenerator {
    /// Creates a counter whose first id is 1.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next id.
    #[inline]
    pub fn next_id(&mut self) -> CallId {
        let id = CallId(self.next);
        self.next += 1;
        id
    }

    /// Returns the id the next call will use, without allocating it.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> CallId {
        CallId(self.next)
    }
}

// ============================================================================
// Tests
// ============================================================================
