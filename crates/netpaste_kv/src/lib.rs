//! # NetPaste KV
//!
//! Key-value backend abstraction for NetPaste.
//!
//! This crate is the storage collaborator of the note repository. Backends
//! are **string stores with expiry**: they know nothing about notes except
//! the one field the atomic token-compare script inspects.
//!
//! ## Design Principles
//!
//! - One key per note, values are opaque serialized strings
//! - Expiry is passive: an expired key reads as absent and is dropped lazily
//! - The compare-and-swap step runs as a single indivisible operation inside
//!   the backend, never as separate get/set calls from the caller
//! - Backends must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For tests and ephemeral stores
//! - [`FileBackend`] - Keyspace snapshotted to a JSON file after each write
//!
//! ## Example
//!
//! ```rust
//! use netpaste_kv::{CasOutcome, CompareTokenScript, InMemoryBackend, KvBackend, TtlUpdate};
//!
//! let backend = InMemoryBackend::new();
//! backend.set("note:x", r#"{"note_token":"t0"}"#).unwrap();
//!
//! let script = CompareTokenScript::default();
//! let outcome = backend
//!     .execute_atomic("note:x", &script, "t0", r#"{"note_token":"t1"}"#, TtlUpdate::Keep)
//!     .unwrap();
//! assert_eq!(outcome, CasOutcome::Swapped);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod clock;
mod error;
mod file;
mod keyspace;
mod memory;
mod script;

pub use backend::{CasOutcome, KvBackend, TtlState, TtlUpdate};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{KvError, KvResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use script::{CompareTokenScript, DEFAULT_TOKEN_FIELD};
