//! Key-value backend trait definition.

use crate::error::KvResult;
use crate::script::CompareTokenScript;
use std::time::Duration;

/// Outcome of an atomic compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The stored token matched and the value was replaced.
    Swapped,
    /// The stored token differs from the expected one. Nothing changed.
    TokenMismatch,
    /// No live value exists under the key.
    NotFound,
}

/// How an atomic write treats the key's expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlUpdate {
    /// Keep whatever expiry (or lack of one) the key already has.
    Keep,
    /// Expire the key this many seconds after the write.
    Set(u64),
}

impl TtlUpdate {
    /// Interprets a signed seconds value.
    ///
    /// Zero and negative values mean "leave the expiry alone". They never
    /// mean "expire now" or "never expire".
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        if seconds > 0 {
            Self::Set(seconds as u64)
        } else {
            Self::Keep
        }
    }
}

/// Remaining lifetime of a key, as reported by [`KvBackend::ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlState {
    /// The key does not exist (or has expired).
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key expires after the given duration.
    Expires(Duration),
}

/// A TTL-capable key-value store.
///
/// # Invariants
///
/// - An expired key is indistinguishable from a missing one
/// - `set` clears any expiry previously attached to the key
/// - `execute_atomic` performs read, compare, write and expire as one step;
///   no other call on the same backend observes or interleaves with it
/// - After `close`, every operation fails with [`crate::KvError::Closed`]
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For tests and ephemeral stores
/// - [`super::FileBackend`] - For stores that survive restarts
pub trait KvBackend: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed or unreachable.
    fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed or the write fails.
    fn set(&self, key: &str, value: &str) -> KvResult<()>;

    /// Sets the key to expire `seconds` from now.
    ///
    /// Returns `false` if the key does not exist. A zero TTL expires the key
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed or the write fails.
    fn expire(&self, key: &str, seconds: u64) -> KvResult<bool>;

    /// Reports the remaining lifetime of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed.
    fn ttl(&self, key: &str) -> KvResult<TtlState>;

    /// Atomically replaces the value under `key` if its stored token equals
    /// `expected_token`.
    ///
    /// The stored value is inspected with `script`. On a match the value is
    /// replaced by `new_value` and `ttl` is applied, all without releasing
    /// the backend for other callers in between.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed, the stored value cannot be
    /// evaluated by the script, or the write fails. A mismatch or a missing
    /// key is reported through [`CasOutcome`], not as an error.
    fn execute_atomic(
        &self,
        key: &str,
        script: &CompareTokenScript,
        expected_token: &str,
        new_value: &str,
        ttl: TtlUpdate,
    ) -> KvResult<CasOutcome>;

    /// Removes every expired key and returns how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is closed or the write fails.
    fn purge_expired(&self) -> KvResult<usize>;

    /// Makes all completed writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> KvResult<()>;

    /// Flushes and closes the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    fn close(&self) -> KvResult<()>;
}
