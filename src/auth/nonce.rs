//! Nonce generation for authenticated requests.
//!
//! Most venues require a strictly increasing nonce per API key to prevent
//! replay attacks. A nonce, once issued, is burned: a venue-side rejection
//! must be retried with a fresh value, never the same one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for providing nonces for authenticated requests.
///
/// The nonce must be strictly increasing across all calls on one instance,
/// including calls racing from concurrently dispatched operations.
pub trait NonceProvider: Send + Sync {
    /// Generate the next nonce value.
    ///
    /// This value must be greater than any previously returned value.
    fn next_nonce(&self) -> u64;
}

/// A nonce provider that generates strictly increasing nonces based on time.
///
/// Uses milliseconds since UNIX epoch, falling back to `last + 1` when two
/// requests land in the same millisecond, so uniqueness holds even under
/// concurrent use of a single client instance.
pub struct IncreasingNonce {
    last_nonce: AtomicU64,
}

impl IncreasingNonce {
    /// Create a new increasing nonce provider.
    pub fn new() -> Self {
        Self {
            last_nonce: AtomicU64::new(0),
        }
    }

    /// Get current time in milliseconds since UNIX epoch.
    fn current_time_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl Default for IncreasingNonce {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceProvider for IncreasingNonce {
    fn next_nonce(&self) -> u64 {
        let time_nonce = Self::current_time_millis();

        // max(clock, last + 1), installed with a CAS loop so a racing
        // caller can never observe or reuse an already-issued value.
        loop {
            let last = self.last_nonce.load(Ordering::SeqCst);
            let next = time_nonce.max(last + 1);

            if self
                .last_nonce
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
            // CAS failed: another in-flight request took this slot. Retry.
        }
    }
}

/// A nonce provider backed by a plain counter, for venues that accept any
/// strictly increasing integer and for deterministic tests.
pub struct CounterNonce {
    counter: AtomicU64,
}

impl CounterNonce {
    /// Create a counter-based provider starting after `start`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl NonceProvider for CounterNonce {
    fn next_nonce(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
