//! Keyspace shared by the in-memory and file backends.
//!
//! All methods take the current time explicitly; callers hold the keyspace
//! lock for the whole call.

use crate::backend::{CasOutcome, TtlState, TtlUpdate};
use crate::error::KvResult;
use crate::script::CompareTokenScript;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Entry {
    value: String,
    /// Absolute unix milliseconds. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<u64>,
}

impl Entry {
    fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at_ms.map_or(true, |deadline| deadline > now_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Keyspace {
    entries: HashMap<String, Entry>,
}

fn deadline(now_ms: u64, seconds: u64) -> u64 {
    now_ms.saturating_add(seconds.saturating_mul(1_000))
}

impl Keyspace {
    /// Returns the live entry under `key`, dropping it first if it expired.
    fn live_entry(&mut self, key: &str, now_ms: u64) -> Option<&mut Entry> {
        if self.entries.get(key).is_some_and(|e| !e.is_live(now_ms)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copies the raw entry under `key`, expired or not.
    pub(crate) fn entry(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).cloned()
    }

    /// Puts back an entry captured with [`Keyspace::entry`].
    pub(crate) fn restore(&mut self, key: &str, previous: Option<Entry>) {
        match previous {
            Some(entry) => {
                self.entries.insert(key.to_owned(), entry);
            }
            None => {
                self.entries.remove(key);
            }
        }
    }

    pub(crate) fn get(&mut self, key: &str, now_ms: u64) -> Option<String> {
        self.live_entry(key, now_ms).map(|e| e.value.clone())
    }

    pub(crate) fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at_ms: None,
            },
        );
    }

    pub(crate) fn expire(&mut self, key: &str, seconds: u64, now_ms: u64) -> bool {
        match self.live_entry(key, now_ms) {
            Some(entry) => {
                entry.expires_at_ms = Some(deadline(now_ms, seconds));
                true
            }
            None => false,
        }
    }

    pub(crate) fn ttl(&mut self, key: &str, now_ms: u64) -> TtlState {
        match self.live_entry(key, now_ms) {
            None => TtlState::Missing,
            Some(Entry {
                expires_at_ms: None,
                ..
            }) => TtlState::Persistent,
            Some(Entry {
                expires_at_ms: Some(deadline),
                ..
            }) => TtlState::Expires(Duration::from_millis(deadline.saturating_sub(now_ms))),
        }
    }

    pub(crate) fn execute_atomic(
        &mut self,
        key: &str,
        script: &CompareTokenScript,
        expected_token: &str,
        new_value: &str,
        ttl: TtlUpdate,
        now_ms: u64,
    ) -> KvResult<CasOutcome> {
        let Some(entry) = self.live_entry(key, now_ms) else {
            return Ok(CasOutcome::NotFound);
        };

        if !script.matches(&entry.value, expected_token)? {
            return Ok(CasOutcome::TokenMismatch);
        }

        entry.value = new_value.to_owned();
        if let TtlUpdate::Set(seconds) = ttl {
            entry.expires_at_ms = Some(deadline(now_ms, seconds));
        }

        Ok(CasOutcome::Swapped)
    }

    pub(crate) fn purge_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now_ms));
        before - self.entries.len()
    }
}
