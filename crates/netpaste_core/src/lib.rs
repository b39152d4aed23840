//! # NetPaste Core
//!
//! Shared-text notes addressed by a human-chosen name.
//!
//! This crate provides:
//! - The note record and its JSON wire format
//! - The bounded, newest-first access log and origin masking
//! - The note repository: fetch-or-create reads and token-guarded commits
//!
//! Concurrent writers are serialized without in-process locks. Each commit
//! carries the version token its author last saw, and the backend's atomic
//! script rejects the commit if the token has moved on since.
//!
//! ## Example
//!
//! ```rust
//! use netpaste_core::{ClientInfo, CommitRequest, CoreError, NoteRepository};
//! use netpaste_kv::InMemoryBackend;
//! use std::sync::Arc;
//!
//! let repo = NoteRepository::with_defaults(Arc::new(InMemoryBackend::new()));
//! let client = ClientInfo::new("10.0.0.7", "Mozilla/5.0");
//!
//! let note = repo.fetch_or_create("x", "", &client).unwrap();
//! let t0 = note.version_token.clone();
//!
//! let done = repo
//!     .commit(CommitRequest::new("x", t0.clone(), "hello").ttl_seconds(3600))
//!     .unwrap();
//! assert_ne!(done.version_token, t0);
//!
//! let stale = repo.commit(CommitRequest::new("x", t0, "world"));
//! assert!(matches!(stale, Err(CoreError::TokenMismatch { .. })));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod access_log;
mod config;
mod error;
pub mod record;
mod repository;
pub mod timestamp;
mod token;

pub use access_log::{mask_origin, AccessLog, AccessLogEntry, ClientClass};
pub use config::RepositoryConfig;
pub use error::{CoreError, CoreResult};
pub use record::{NoteRecord, NoteView};
pub use repository::{ClientInfo, CommitRequest, Committed, NoteRepository};
pub use token::{generate_note_id, VersionToken};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
