//! File-backed key-value backend.

use crate::backend::{CasOutcome, KvBackend, TtlState, TtlUpdate};
use crate::clock::{Clock, SystemClock};
use crate::error::{KvError, KvResult};
use crate::keyspace::{Entry, Keyspace};
use crate::script::CompareTokenScript;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Snapshot {
    format_version: u32,
    keys: Keyspace,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    keys: &'a Keyspace,
}

/// A key-value backend persisted to a single JSON snapshot file.
///
/// The keyspace lives in memory and is rewritten to disk after every
/// mutating call, while the keyspace lock is still held. Each snapshot is
/// written and synced to a sibling temporary file, then renamed over the
/// previous one.
///
/// A mutation becomes visible only once its snapshot is on disk. If the
/// write fails, the in-memory keyspace is put back as it was and the call
/// returns the error, so a failed call has no effect.
///
/// Expiry deadlines are stored as unix milliseconds, so keys keep expiring
/// on schedule across restarts.
///
/// # Thread Safety
///
/// Same as [`crate::InMemoryBackend`]: one lock serializes every call.
/// Two processes opening the same file are not coordinated.
///
/// # Example
///
/// ```no_run
/// use netpaste_kv::{FileBackend, KvBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new("notes.json")).unwrap();
/// backend.set("note:a", "{}").unwrap();
/// backend.close().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
}

impl FileBackend {
    /// Opens the snapshot at `path`, or starts empty if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> KvResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens the snapshot, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the snapshot
    /// cannot be loaded.
    pub fn open_with_create_dirs(path: &Path) -> KvResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Opens the snapshot using the given clock for expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open_with_clock(path: &Path, clock: Arc<dyn Clock>) -> KvResult<Self> {
        let keyspace = if path.exists() {
            load_snapshot(path)?
        } else {
            Keyspace::default()
        };
        debug!(path = %path.display(), keys = keyspace.len(), "opened keyspace snapshot");

        Ok(Self {
            path: path.to_path_buf(),
            keyspace: Mutex::new(keyspace),
            clock,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_keyspace(&self) -> KvResult<MutexGuard<'_, Keyspace>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::Closed);
        }
        Ok(self.keyspace.lock())
    }

    fn persist(&self, keyspace: &Keyspace) -> KvResult<()> {
        let snapshot = SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            keys: keyspace,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        sync_parent_dir(&self.path)
    }

    /// Persists a mutation of `key`, putting back `previous` if that fails.
    fn persist_or_restore(
        &self,
        keyspace: &mut Keyspace,
        key: &str,
        previous: Option<Entry>,
    ) -> KvResult<()> {
        if let Err(e) = self.persist(keyspace) {
            warn!(path = %self.path.display(), key, error = %e, "snapshot write failed, change undone");
            keyspace.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> KvResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> KvResult<()> {
    // NTFS journals the rename itself
    Ok(())
}

fn load_snapshot(path: &Path) -> KvResult<Keyspace> {
    let bytes = fs::read(path)?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)
        .map_err(|e| KvError::corrupted(format!("{}: {e}", path.display())))?;

    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(KvError::corrupted(format!(
            "unsupported snapshot format version {}",
            snapshot.format_version
        )));
    }
    Ok(snapshot.keys)
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        let now = self.clock.now_millis();
        Ok(self.open_keyspace()?.get(key, now))
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut keyspace = self.open_keyspace()?;
        let previous = keyspace.entry(key);
        keyspace.set(key, value);
        self.persist_or_restore(&mut keyspace, key, previous)
    }

    fn expire(&self, key: &str, seconds: u64) -> KvResult<bool> {
        let mut keyspace = self.open_keyspace()?;
        let now = self.clock.now_millis();
        let previous = keyspace.entry(key);
        let existed = keyspace.expire(key, seconds, now);
        if existed {
            self.persist_or_restore(&mut keyspace, key, previous)?;
        }
        Ok(existed)
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
        let previous = keyspace.entry(key);
        let outcome = keyspace.execute_atomic(key, script, expected_token, new_value, ttl, now)?;
        if outcome == CasOutcome::Swapped {
            self.persist_or_restore(&mut keyspace, key, previous)?;
        }
        Ok(outcome)
    }

    fn purge_expired(&self) -> KvResult<usize> {
        let mut keyspace = self.open_keyspace()?;
        let now = self.clock.now_millis();
        let mut staged = keyspace.clone();
        let dropped = staged.purge_expired(now);
        if dropped > 0 {
            self.persist(&staged)?;
            *keyspace = staged;
        }
        Ok(dropped)
    }

    fn flush(&self) -> KvResult<()> {
        let keyspace = self.open_keyspace()?;
        self.persist(&keyspace)
    }

    fn close(&self) -> KvResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let keyspace = self.keyspace.lock();
        self.persist(&keyspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
        assert_eq!(backend.path(), path);
    }

    #[test]
    fn file_persistence_across_reopens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let backend = FileBackend::open(&path).unwrap();
            backend.set("note:a", r#"{"note_token":"t0"}"#).unwrap();
            backend.close().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(
            backend.get("note:a").unwrap().as_deref(),
            Some(r#"{"note_token":"t0"}"#)
        );
    }

    #[test]
    fn file_expiry_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let clock = Arc::new(ManualClock::new(10_000));

        {
            let backend = FileBackend::open_with_clock(&path, clock.clone()).unwrap();
            backend.set("k", "v").unwrap();
            backend.expire("k", 60).unwrap();
        }

        clock.advance(Duration::from_secs(20));
        let backend = FileBackend::open_with_clock(&path, clock.clone()).unwrap();
        assert_eq!(
            backend.ttl("k").unwrap(),
            TtlState::Expires(Duration::from_secs(40))
        );

        clock.advance(Duration::from_secs(40));
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn file_cas_persists_only_on_swap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let script = CompareTokenScript::default();

        let backend = FileBackend::open(&path).unwrap();
        backend.set("k", r#"{"note_token":"t0"}"#).unwrap();
        assert_eq!(
            backend
                .execute_atomic("k", &script, "stale", r#"{"note_token":"x"}"#, TtlUpdate::Keep)
                .unwrap(),
            CasOutcome::TokenMismatch
        );
        assert_eq!(
            backend
                .execute_atomic("k", &script, "t0", r#"{"note_token":"t1"}"#, TtlUpdate::Keep)
                .unwrap(),
            CasOutcome::Swapped
        );
        drop(backend);

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(
            reopened.get("k").unwrap().as_deref(),
            Some(r#"{"note_token":"t1"}"#)
        );
    }

    #[test]
    fn file_failed_swap_is_not_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let script = CompareTokenScript::default();
        let backend = FileBackend::open_with_clock(&path, Arc::new(ManualClock::new(0))).unwrap();
        backend.set("k", r#"{"note_token":"t0","c":"old"}"#).unwrap();
        backend.expire("k", 600).unwrap();
        let ttl_before = backend.ttl("k").unwrap();

        // A directory in the way of the temporary file makes every write fail
        fs::create_dir(path.with_extension("tmp")).unwrap();
        let failed = backend.execute_atomic(
            "k",
            &script,
            "t0",
            r#"{"note_token":"t1","c":"new"}"#,
            TtlUpdate::Set(5),
        );
        assert!(matches!(failed, Err(KvError::Io(_))));
        assert_eq!(
            backend.get("k").unwrap().as_deref(),
            Some(r#"{"note_token":"t0","c":"old"}"#)
        );
        assert_eq!(backend.ttl("k").unwrap(), ttl_before);
        assert_eq!(ttl_before, TtlState::Expires(Duration::from_secs(600)));

        // Once the disk is writable again the same token still wins
        fs::remove_dir(path.with_extension("tmp")).unwrap();
        assert_eq!(
            backend
                .execute_atomic("k", &script, "t0", r#"{"note_token":"t1","c":"new"}"#, TtlUpdate::Keep)
                .unwrap(),
            CasOutcome::Swapped
        );
    }

    #[test]
    fn file_failed_set_and_expire_are_not_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let backend = FileBackend::open(&path).unwrap();
        backend.set("k", "v").unwrap();

        fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(matches!(backend.set("k", "w"), Err(KvError::Io(_))));
        assert!(matches!(backend.set("fresh", "x"), Err(KvError::Io(_))));
        assert!(matches!(backend.expire("k", 10), Err(KvError::Io(_))));

        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(backend.get("fresh").unwrap(), None);
        assert_eq!(backend.ttl("k").unwrap(), TtlState::Persistent);
    }

    #[test]
    fn file_failed_purge_keeps_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let clock = Arc::new(ManualClock::new(0));
        let backend = FileBackend::open_with_clock(&path, clock.clone()).unwrap();
        backend.set("a", "1").unwrap();
        backend.expire("a", 1).unwrap();
        clock.advance(Duration::from_secs(2));

        fs::create_dir(path.with_extension("tmp")).unwrap();
        assert!(matches!(backend.purge_expired(), Err(KvError::Io(_))));

        fs::remove_dir(path.with_extension("tmp")).unwrap();
        assert_eq!(backend.purge_expired().unwrap(), 1);
    }

    #[test]
    fn file_snapshot_leaves_no_temporary_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let backend = FileBackend::open(&path).unwrap();
        backend.set("k", "v").unwrap();
        backend.flush().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
        let on_disk: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk["format_version"], 1);
        assert_eq!(on_disk["keys"]["k"]["value"], "v");
    }

    #[test]
    fn file_corrupted_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not a snapshot").unwrap();

        assert!(matches!(
            FileBackend::open(&path),
            Err(KvError::Corrupted(_))
        ));
    }

    #[test]
    fn file_unknown_format_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, br#"{"format_version":99,"keys":{}}"#).unwrap();

        assert!(matches!(
            FileBackend::open(&path),
            Err(KvError::Corrupted(_))
        ));
    }

    #[test]
    fn file_open_with_create_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.json");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        backend.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn file_closed_backend_rejects_calls() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(&dir.path().join("s.json")).unwrap();
        backend.close().unwrap();
        assert!(backend.close().is_ok());
        assert!(matches!(backend.get("k"), Err(KvError::Closed)));
    }
}
