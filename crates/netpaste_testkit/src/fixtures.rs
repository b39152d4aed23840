//! Repository fixtures.
//!
//! Provides repositories wired to a controllable clock so tests can observe
//! expiry without sleeping.

use netpaste_core::{ClientInfo, NoteRecord, NoteRepository, NoteView, RepositoryConfig};
use netpaste_kv::{FileBackend, InMemoryBackend, KvBackend, ManualClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Start time of fixture clocks: 2024-01-01T00:00:00Z in unix milliseconds.
pub const FIXTURE_EPOCH_MS: u64 = 1_704_067_200_000;

/// A repository with its backend and clock exposed.
pub struct TestRepository {
    /// The repository under test, shareable across threads.
    pub repo: Arc<NoteRepository>,
    /// The backend behind `repo`.
    pub backend: Arc<dyn KvBackend>,
    /// The clock driving backend expiry.
    pub clock: Arc<ManualClock>,
    /// The snapshot file, for file-backed fixtures.
    path: Option<PathBuf>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestRepository {
    /// Creates a repository over an in-memory backend.
    pub fn memory() -> Self {
        Self::memory_with_config(RepositoryConfig::default())
    }

    /// Creates a repository over an in-memory backend with `config`.
    pub fn memory_with_config(config: RepositoryConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MS));
        let backend: Arc<dyn KvBackend> = Arc::new(InMemoryBackend::with_clock(clock.clone()));
        Self {
            repo: Arc::new(NoteRepository::new(Arc::clone(&backend), config)),
            backend,
            clock,
            path: None,
            _temp_dir: None,
        }
    }

    /// Creates a repository over a file backend in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("notes.json");
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH_MS));
        let backend: Arc<dyn KvBackend> = Arc::new(
            FileBackend::open_with_clock(&path, clock.clone())
                .expect("Failed to open file backend"),
        );
        Self {
            repo: Arc::new(NoteRepository::new(
                Arc::clone(&backend),
                RepositoryConfig::default(),
            )),
            backend,
            clock,
            path: Some(path),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the snapshot path if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Decodes the stored record of `name` straight from the backend.
    pub fn stored(&self, name: &str) -> Option<NoteRecord> {
        stored_record(&self.repo, name)
    }

    /// Fetches `name` without a password as the default client.
    pub fn fetch(&self, name: &str) -> NoteView {
        self.repo
            .fetch_or_create(name, "", &default_client())
            .expect("fetch failed")
    }
}

impl std::ops::Deref for TestRepository {
    type Target = NoteRepository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Decodes the record stored under `name`, bypassing the repository.
///
/// Tests use this to inspect bookkeeping and passwords that
/// [`NoteRepository`] never hands out.
pub fn stored_record(repo: &NoteRepository, name: &str) -> Option<NoteRecord> {
    repo.backend()
        .get(&repo.key_for(name))
        .expect("backend read failed")
        .map(|raw| NoteRecord::from_json(&raw).expect("stored record is corrupt"))
}

/// A desktop client at a private address.
pub fn default_client() -> ClientInfo {
    ClientInfo::new("192.168.1.20", "Mozilla/5.0 (X11; Linux x86_64)")
}

/// A mobile client at a private address.
pub fn mobile_client() -> ClientInfo {
    ClientInfo::new("10.1.2.3", "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148")
}

/// Runs a test with a fresh in-memory repository.
///
/// # Example
///
/// ```rust
/// use netpaste_testkit::with_memory_repo;
///
/// with_memory_repo(|fixture| {
///     assert_eq!(fixture.fetch("n").read_count, 1);
/// });
/// ```
pub fn with_memory_repo<F, R>(f: F) -> R
where
    F: FnOnce(&TestRepository) -> R,
{
    let fixture = TestRepository::memory();
    f(&fixture)
}
