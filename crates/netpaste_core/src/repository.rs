//! Note repository.
//!
//! Two operations touch the backend:
//!
//! - [`NoteRepository::fetch_or_create`] reads a note, creating it on first
//!   sight, and writes the read bookkeeping back. Creation is a plain
//!   get-then-set: two first reads of a new name may both create it and the
//!   last write wins. Both candidates are empty notes, so nothing of value is
//!   lost.
//! - [`NoteRepository::commit`] replaces a note's content if and only if the
//!   caller's version token is still current. The compare and the write run
//!   inside the backend as one atomic script call, so of several writers
//!   holding the same token exactly one succeeds.

use crate::access_log::{AccessLogEntry, ClientClass};
use crate::config::RepositoryConfig;
use crate::error::{CoreError, CoreResult};
use crate::record::{NoteRecord, NoteView};
use crate::timestamp;
use crate::token::VersionToken;
use netpaste_kv::{CasOutcome, CompareTokenScript, KvBackend, TtlUpdate};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Who is reading a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Network origin of the request, unmasked.
    pub origin: String,
    /// User-agent style hint used to classify the client.
    pub user_agent: String,
}

impl ClientInfo {
    /// Creates client information.
    pub fn new(origin: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            user_agent: user_agent.into(),
        }
    }

    fn class(&self) -> ClientClass {
        ClientClass::from_user_agent(&self.user_agent)
    }
}

/// A request to replace a note's content.
#[derive(Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Note name.
    pub name: String,
    /// Token the writer last observed.
    pub expected_token: VersionToken,
    /// Replacement content.
    pub content: String,
    /// New password. `None` or empty leaves the current one in place.
    pub password: Option<String>,
    /// New lifetime in seconds. Zero or negative leaves the expiry alone.
    pub ttl_seconds: i64,
}

impl CommitRequest {
    /// Creates a commit that keeps the password and expiry.
    pub fn new(
        name: impl Into<String>,
        expected_token: impl Into<VersionToken>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            expected_token: expected_token.into(),
            content: content.into(),
            password: None,
            ttl_seconds: 0,
        }
    }

    /// Sets a password on the note.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the note's lifetime, counted from the commit.
    #[must_use]
    pub fn ttl_seconds(mut self, seconds: i64) -> Self {
        self.ttl_seconds = seconds;
        self
    }
}

impl fmt::Debug for CommitRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitRequest")
            .field("name", &self.name)
            .field("expected_token", &self.expected_token)
            .field("content_len", &self.content.len())
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// A successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    /// Identifier of the committed note.
    pub note_id: String,
    /// Token to present on the next commit.
    pub version_token: VersionToken,
    /// Commit timestamp.
    pub timestamp: String,
}

/// Maps note names to records stored in a key-value backend.
///
/// The repository holds no locks of its own and is safe to share across
/// threads; every cross-request guarantee comes from the backend.
pub struct NoteRepository {
    backend: Arc<dyn KvBackend>,
    config: RepositoryConfig,
    script: CompareTokenScript,
}

impl NoteRepository {
    /// Creates a repository over `backend`.
    pub fn new(backend: Arc<dyn KvBackend>, config: RepositoryConfig) -> Self {
        let script = CompareTokenScript::new(config.token_field.clone());
        Self {
            backend,
            config,
            script,
        }
    }

    /// Creates a repository with the default configuration.
    pub fn with_defaults(backend: Arc<dyn KvBackend>) -> Self {
        Self::new(backend, RepositoryConfig::default())
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns the backend handle.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Returns the backend key of a note.
    #[must_use]
    pub fn key_for(&self, name: &str) -> String {
        format!("{}{}", self.config.key_prefix, name)
    }

    /// Loads the stored record, password included, without any bookkeeping
    /// or password check. Callers outside the crate only ever see a
    /// [`NoteView`].
    pub(crate) fn load(&self, name: &str) -> CoreResult<Option<NoteRecord>> {
        let Some(raw) = self.backend.get(&self.key_for(name))? else {
            return Ok(None);
        };
        NoteRecord::from_json(&raw)
            .map(Some)
            .map_err(|e| CoreError::corrupt_record(name, e.to_string()))
    }

    /// Reads a note, creating an empty one if the name is unused.
    ///
    /// Every successful call is also a write: the read count, last read time
    /// and access log are updated and the note's lifetime is renewed.
    ///
    /// The bookkeeping write-back is guarded by the token the read observed,
    /// so a read never reverts a commit that landed in between; it starts
    /// over against the newer record instead.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AccessDenied`] if the note has a password and
    ///   `password` differs. Nothing is updated in that case.
    /// - [`CoreError::Contended`] if commits kept landing between the read
    ///   and its write-back for `read_retry_limit` attempts.
    /// - [`CoreError::BackendUnavailable`] if the backend fails.
    /// - [`CoreError::CorruptRecord`] if the stored record cannot be decoded.
    pub fn fetch_or_create(
        &self,
        name: &str,
        password: &str,
        client: &ClientInfo,
    ) -> CoreResult<NoteView> {
        let attempts = self.config.read_retry_limit.max(1);

        for attempt in 1..=attempts {
            let now = timestamp::now();
            let access = AccessLogEntry::new(
                client.class(),
                &client.origin,
                self.config.location_label.clone(),
                now.clone(),
            );

            let Some(current) = self.load(name)? else {
                let record = NoteRecord::create(name, access, now, self.config.default_ttl_seconds);
                self.create(&record)?;
                info!(note = name, id = record.id(), "created note");
                return Ok(record.view());
            };

            if !current.password_matches(password) {
                warn!(note = name, "rejected read with wrong password");
                return Err(CoreError::access_denied(name));
            }

            let observed = current.version_token().clone();
            let record = current.with_read(access, now, self.config.access_log_capacity);
            let encoded = record
                .to_json()
                .map_err(|e| CoreError::corrupt_record(name, e.to_string()))?;
            let ttl = match record.ttl_seconds() {
                0 => TtlUpdate::Keep,
                seconds => TtlUpdate::Set(seconds),
            };

            match self.backend.execute_atomic(
                &self.key_for(name),
                &self.script,
                observed.as_str(),
                &encoded,
                ttl,
            )? {
                CasOutcome::Swapped => {
                    debug!(note = name, reads = record.read_count(), "recorded read");
                    return Ok(record.view());
                }
                CasOutcome::TokenMismatch | CasOutcome::NotFound => {
                    debug!(note = name, attempt, "note changed during read, retrying");
                }
            }
        }

        warn!(note = name, attempts, "gave up recording read");
        Err(CoreError::contended(name, attempts))
    }

    /// Replaces a note's content if `request.expected_token` is current.
    ///
    /// On success a fresh token is minted and returned. The stored password
    /// changes only if a non-empty one is supplied; the expiry changes only
    /// if `ttl_seconds` is positive.
    ///
    /// # Errors
    ///
    /// - [`CoreError::TokenMismatch`] if another commit landed first.
    ///   Nothing is written.
    /// - [`CoreError::NotFound`] if the note doesn't exist or expired.
    /// - [`CoreError::BackendUnavailable`] if the backend fails.
    /// - [`CoreError::CorruptRecord`] if the stored record cannot be decoded.
    pub fn commit(&self, request: CommitRequest) -> CoreResult<Committed> {
        let CommitRequest {
            name,
            expected_token,
            content,
            password,
            ttl_seconds,
        } = request;

        let Some(current) = self.load(&name)? else {
            return Err(CoreError::not_found(name));
        };

        let now = timestamp::now();
        let version_token = VersionToken::generate();
        let ttl = TtlUpdate::from_seconds(ttl_seconds);
        let new_ttl = match ttl {
            TtlUpdate::Set(seconds) => Some(seconds),
            TtlUpdate::Keep => None,
        };
        let password = password.filter(|p| !p.is_empty());

        let next = current.with_commit(content, version_token.clone(), now.clone(), password, new_ttl);
        let encoded = next
            .to_json()
            .map_err(|e| CoreError::corrupt_record(&name, e.to_string()))?;

        let outcome = self.backend.execute_atomic(
            &self.key_for(&name),
            &self.script,
            expected_token.as_str(),
            &encoded,
            ttl,
        )?;

        match outcome {
            CasOutcome::Swapped => {
                info!(note = %name, ?ttl, "committed note");
                Ok(Committed {
                    note_id: next.id().to_string(),
                    version_token,
                    timestamp: now,
                })
            }
            CasOutcome::TokenMismatch => {
                warn!(note = %name, "rejected commit with stale token");
                Err(CoreError::token_mismatch(name))
            }
            CasOutcome::NotFound => {
                debug!(note = %name, "note vanished before commit");
                Err(CoreError::not_found(name))
            }
        }
    }

    /// Flushes and closes the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BackendUnavailable`] if the final flush fails.
    pub fn close(self) -> CoreResult<()> {
        self.backend.close()?;
        Ok(())
    }

    /// Writes a newly created record with a plain set, then applies its
    /// lifetime. Last writer wins if two creations race.
    fn create(&self, record: &NoteRecord) -> CoreResult<()> {
        let key = self.key_for(record.name());
        let encoded = record
            .to_json()
            .map_err(|e| CoreError::corrupt_record(record.name(), e.to_string()))?;

        self.backend.set(&key, &encoded)?;
        if record.ttl_seconds() > 0 {
            self.backend.expire(&key, record.ttl_seconds())?;
        }
        Ok(())
    }
}

impl fmt::Debug for NoteRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoteRepository")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
