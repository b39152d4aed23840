//! The note record and its wire format.
//!
//! A [`NoteRecord`] is an immutable value. Reads and commits consume the
//! current value and return the replacement, which is then written to the
//! backend as a whole.
//!
//! The persisted form is a flat JSON object whose field names are shared
//! with every other writer of the same keyspace:
//!
//! | field | meaning |
//! |-------|---------|
//! | `note_id` | identifier, fixed at creation |
//! | `note_name` | lookup name, fixed at creation |
//! | `note_content` | text payload |
//! | `note_token` | version token compared by commits |
//! | `created_time`, `updated_time`, `last_read_time` | timestamps |
//! | `read_count` | successful reads, creation included |
//! | `expire_time` | lifetime in seconds applied on write, `0` = none |
//! | `log_list` | access log, newest first |
//! | `file_list` | attachments, always empty here |
//! | `note_pwd` | password, empty when unset |
//! | `has_password` | derived from `note_pwd` |

use crate::access_log::{AccessLog, AccessLogEntry};
use crate::token::{generate_note_id, VersionToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredNote", from = "StoredNote")]
pub struct NoteRecord {
    id: String,
    name: String,
    content: String,
    version_token: VersionToken,
    created_at: String,
    updated_at: String,
    last_read_at: String,
    read_count: u64,
    ttl_seconds: u64,
    access_log: AccessLog,
    password: Option<String>,
    attachments: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct StoredNote {
    note_id: String,
    note_name: String,
    note_content: String,
    note_token: VersionToken,
    created_time: String,
    updated_time: String,
    last_read_time: String,
    read_count: u64,
    expire_time: i64,
    log_list: AccessLog,
    #[serde(default)]
    file_list: Vec<Value>,
    #[serde(default)]
    note_pwd: String,
    #[serde(default)]
    has_password: bool,
}

impl From<NoteRecord> for StoredNote {
    fn from(record: NoteRecord) -> Self {
        let has_password = record.password.is_some();
        Self {
            note_id: record.id,
            note_name: record.name,
            note_content: record.content,
            note_token: record.version_token,
            created_time: record.created_at,
            updated_time: record.updated_at,
            last_read_time: record.last_read_at,
            read_count: record.read_count,
            expire_time: i64::try_from(record.ttl_seconds).unwrap_or(i64::MAX),
            log_list: record.access_log,
            file_list: record.attachments,
            note_pwd: record.password.unwrap_or_default(),
            has_password,
        }
    }
}

impl From<StoredNote> for NoteRecord {
    fn from(stored: StoredNote) -> Self {
        Self {
            id: stored.note_id,
            name: stored.note_name,
            content: stored.note_content,
            version_token: stored.note_token,
            created_at: stored.created_time,
            updated_at: stored.updated_time,
            last_read_at: stored.last_read_time,
            read_count: stored.read_count,
            ttl_seconds: stored.expire_time.max(0) as u64,
            access_log: stored.log_list,
            password: Some(stored.note_pwd).filter(|p| !p.is_empty()),
            attachments: stored.file_list,
        }
    }
}

impl NoteRecord {
    /// Creates a fresh, empty note.
    ///
    /// The creating read counts as the first access: `read_count` starts at
    /// one and the log holds `first_access`.
    #[must_use]
    pub fn create(
        name: impl Into<String>,
        first_access: AccessLogEntry,
        now: impl Into<String>,
        ttl_seconds: u64,
    ) -> Self {
        let now = now.into();
        Self {
            id: generate_note_id(),
            name: name.into(),
            content: String::new(),
            version_token: VersionToken::generate(),
            created_at: now.clone(),
            updated_at: now.clone(),
            last_read_at: now,
            read_count: 1,
            ttl_seconds,
            access_log: AccessLog::starting_with(first_access),
            password: None,
            attachments: Vec::new(),
        }
    }

    /// Returns the record after one more successful read.
    #[must_use]
    pub fn with_read(
        self,
        access: AccessLogEntry,
        now: impl Into<String>,
        log_capacity: usize,
    ) -> Self {
        Self {
            read_count: self.read_count.saturating_add(1),
            last_read_at: now.into(),
            access_log: self.access_log.with_entry(access, log_capacity),
            ..self
        }
    }

    /// Returns the record after a successful commit.
    ///
    /// `password` replaces the stored one when given. `ttl_seconds` replaces
    /// the stored lifetime when given.
    #[must_use]
    pub fn with_commit(
        self,
        content: impl Into<String>,
        version_token: VersionToken,
        now: impl Into<String>,
        password: Option<String>,
        ttl_seconds: Option<u64>,
    ) -> Self {
        Self {
            content: content.into(),
            version_token,
            updated_at: now.into(),
            password: password.or(self.password),
            ttl_seconds: ttl_seconds.unwrap_or(self.ttl_seconds),
            ..self
        }
    }

    /// Returns whether `supplied` opens this note.
    ///
    /// A note without a password accepts anything.
    #[must_use]
    pub fn password_matches(&self, supplied: &str) -> bool {
        self.password.as_deref().map_or(true, |p| p == supplied)
    }

    /// Returns the read-side view, with the password redacted.
    #[must_use]
    pub fn view(&self) -> NoteView {
        NoteView {
            id: self.id.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
            version_token: self.version_token.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
            last_read_at: self.last_read_at.clone(),
            read_count: self.read_count,
            ttl_seconds: self.ttl_seconds,
            access_log: self.access_log.clone(),
            attachments: self.attachments.clone(),
            has_password: self.password.is_some(),
        }
    }

    /// Encodes the record in its wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes a record from its wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid record.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lookup name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text payload.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Current version token.
    #[must_use]
    pub fn version_token(&self) -> &VersionToken {
        &self.version_token
    }

    /// Creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Last commit timestamp.
    #[must_use]
    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Last read timestamp.
    #[must_use]
    pub fn last_read_at(&self) -> &str {
        &self.last_read_at
    }

    /// Successful reads so far.
    #[must_use]
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// Lifetime in seconds applied on write, `0` for none.
    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Access log, newest first.
    #[must_use]
    pub fn access_log(&self) -> &AccessLog {
        &self.access_log
    }

    /// True if a password gates reads.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// What a reader gets back: the record without its password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteView {
    /// Identifier.
    #[serde(rename = "note_id")]
    pub id: String,
    /// Lookup name.
    #[serde(rename = "note_name")]
    pub name: String,
    /// Text payload.
    #[serde(rename = "note_content")]
    pub content: String,
    /// Token to present on the next commit.
    #[serde(rename = "note_token")]
    pub version_token: VersionToken,
    /// Creation timestamp.
    #[serde(rename = "created_time")]
    pub created_at: String,
    /// Last commit timestamp.
    #[serde(rename = "updated_time")]
    pub updated_at: String,
    /// Last read timestamp.
    #[serde(rename = "last_read_time")]
    pub last_read_at: String,
    /// Successful reads so far.
    pub read_count: u64,
    /// Lifetime in seconds, `0` for none.
    #[serde(rename = "expire_time")]
    pub ttl_seconds: u64,
    /// Access log, newest first.
    #[serde(rename = "log_list")]
    pub access_log: AccessLog,
    /// Attachments.
    #[serde(rename = "file_list")]
    pub attachments: Vec<Value>,
    /// Whether reads are password-gated.
    pub has_password: bool,
}
