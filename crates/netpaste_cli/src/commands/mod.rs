//! CLI command implementations.

pub mod commit;
pub mod fetch;
pub mod purge;
pub mod ttl;

use netpaste_core::{NoteRepository, RepositoryConfig};
use netpaste_kv::FileBackend;
use std::path::Path;
use std::sync::Arc;

/// Opens the repository over the store file at `path`.
pub fn open_repository(path: &Path) -> Result<NoteRepository, Box<dyn std::error::Error>> {
    let backend = FileBackend::open_with_create_dirs(path)?;
    Ok(NoteRepository::new(
        Arc::new(backend),
        RepositoryConfig::default(),
    ))
}
