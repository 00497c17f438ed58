//! Randomness for handshake keys and frame masks.
//!
//! The connection never reaches for a global generator directly; it holds a
//! [`RandomSource`] so tests can substitute deterministic bytes.

// ============================================================================
// Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;

// ============================================================================
// RandomSource
// ============================================================================

/// Source of random bytes used by the WebSocket client.
pub trait RandomSource: Send {
    /// Fills `dest` with random bytes.
    fn fill(&mut self, dest: &mut [u8]);

    /// Returns a fresh 4-byte frame mask.
    fn mask(&mut self) -> [u8; 4] {
        let mut mask = [0u8; 4];
        self.fill(&mut mask);
        mask
    }

    /// Returns a fresh `Sec-WebSocket-Key` (base64 of 16 random bytes).
    fn handshake_key(&mut self) -> String {
        let mut nonce = [0u8; 16];
        self.fill(&mut nonce);
        STANDARD.encode(nonce)
    }
}

// ============================================================================
// ThreadRandom
// ============================================================================

/// Default source backed by the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    #[inline]
    fn fill(&mut self, dest: &mut [u8]) {
        rand::thread_rng().fill_bytes(dest);
    }
}

// ============================================================================
// FixedRandom
// ============================================================================

/// Deterministic source that cycles through a fixed byte pattern.
#[derive(Debug, Clone)]
pub struct FixedRandom {
    pattern: Vec<u8>,
    pos: usize,
}

impl FixedRandom {
    /// Creates a source repeating `pattern`. An empty pattern yields zeros.
    #[must_use]
    pub fn new(pattern: impl Into<Vec<u8>>) -> Self {
        Self {
            pattern: pattern.into(),
            pos: 0,
        }
    }
}

impl RandomSource for FixedRandom {
    fn fill(&mut self, dest: &mut [u8]) {
        if self.pattern.is_empty() {
            dest.fill(0);
            return;
        }
        for byte in dest.iter_mut() {
            *byte = self.pattern[self.pos];
            self.pos = (self.pos + 1) % self.pattern.len();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
