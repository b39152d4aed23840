//! In-memory key-value backend.

use crate::backend::{CasOutcome, KvBackend, TtlState, TtlUpdate};
use crate::clock::{Clock, SystemClock};
use crate::error::{KvError, KvResult};
use crate::keyspace::Keyspace;
use crate::script::CompareTokenScript;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An in-memory key-value backend.
///
/// This backend keeps the whole keyspace behind one mutex and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// Every operation, including the atomic compare-and-swap, runs under the
/// keyspace lock, so concurrent callers are serialized per backend.
///
/// # Example
///
/// ```rust
/// use netpaste_kv::{InMemoryBackend, KvBackend, TtlState};
///
/// let backend = InMemoryBackend::new();
/// backend.set("note:a", "{}").unwrap();
/// assert_eq!(backend.get("note:a").unwrap().as_deref(), Some("{}"));
/// assert_eq!(backend.ttl("note:a").unwrap(), TtlState::Persistent);
/// ```
#[derive(Debug)]
pub struct InMemoryBackend {
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl InMemoryBackend {
    /// Creates an empty backend on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty backend on the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::default()),
            clock,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the number of stored keys, including expired ones not yet
    /// dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyspace.lock().len()
    }

    /// Returns true if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn open_keyspace(&self) -> KvResult<MutexGuard<'_, Keyspace>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }
        Ok(self.keyspace.lock())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for InMemoryBackend {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let now = self.clock.now_millis();
        Ok(self.open_keyspace()?.get(key, now))
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.open_keyspace()?.set(key, value);
        Ok(())
    }

    fn expire(&self, key: &str, seconds: u64) -> KvResult<bool> {
        let now = self.clock.now_millis();
        Ok(self.open_keyspace()?.expire(key, seconds, now))
    }

    fn ttl(&self, key: &str) -> KvResult<TtlState> {
        let now = self.clock.now_millis();
        Ok(self.open_keyspace()?.ttl(key, now))
    }

    fn execute_atomic(
        &self,
        key: &str,
        script: &CompareTokenScript,
        expected_token: &str,
        new_value: &str,
        ttl: TtlUpdate,
    ) -> KvResult<CasOutcome> {
        let mut keyspace = self.open_keyspace()?;
        let now = self.clock.now_millis();
        keyspace.execute_atomic(key, script, expected_token, new_value, ttl, now)
    }

    fn purge_expired(&self) -> KvResult<usize> {
        let now = self.clock.now_millis();
        Ok(self.open_keyspace()?.purge_expired(now))
    }

    fn flush(&self) -> KvResult<()> {
        // Nothing buffered
        Ok(())
    }

    fn close(&self) -> KvResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
