//! Concurrency harnesses for the commit protocol.
//!
//! Each harness starts its threads behind a barrier so they hit the
//! repository at the same moment.

use crate::fixtures::{default_client, stored_record};
use netpaste_core::{CommitRequest, CoreError, NoteRepository, VersionToken};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Outcome of many writers committing against the same token.
#[derive(Debug, Clone)]
pub struct CasRaceResult {
    /// Token every writer presented.
    pub starting_token: VersionToken,
    /// Contents whose commit succeeded.
    pub winners: Vec<String>,
    /// Commits rejected as stale.
    pub mismatches: usize,
    /// Commits that failed any other way.
    pub other_failures: usize,
    /// Content stored after the race.
    pub stored_content: String,
}

/// Fetches `name`, then has `writers` threads commit against the token
/// observed by that single fetch.
pub fn race_commits(repo: Arc<NoteRepository>, name: &str, writers: usize) -> CasRaceResult {
    let starting_token = repo
        .fetch_or_create(name, "", &default_client())
        .expect("initial fetch failed")
        .version_token;
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();
            let token = starting_token.clone();

            thread::spawn(move || {
                let content = format!("writer {w} was here");
                barrier.wait();
                let result = repo.commit(CommitRequest::new(name, token, content.clone()));
                (content, result)
            })
        })
        .collect();

    let mut winners = Vec::new();
    let mut mismatches = 0;
    let mut other_failures = 0;
    for handle in handles {
        match handle.join().expect("writer panicked") {
            (content, Ok(_)) => winners.push(content),
            (_, Err(CoreError::TokenMismatch { .. })) => mismatches += 1,
            (_, Err(_)) => other_failures += 1,
        }
    }

    let stored_content = stored_record(&repo, name)
        .map(|r| r.content().to_string())
        .unwrap_or_default();

    CasRaceResult {
        starting_token,
        winners,
        mismatches,
        other_failures,
        stored_content,
    }
}

/// Has each of `threads` threads create and commit its own note.
pub fn stress_distinct_notes(repo: Arc<NoteRepository>, threads: usize) -> StressTestResult {
    let barrier = Arc::new(Barrier::new(threads));
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let name = format!("note-user-{t}");
                barrier.wait();
                let note = repo.fetch_or_create(&name, "", &default_client())?;
                repo.commit(CommitRequest::new(
                    name,
                    note.version_token,
                    format!("independent content for {t}"),
                ))
            })
        })
        .collect();

    let mut successful = 0usize;
    let mut failed = 0usize;
    for handle in handles {
        match handle.join() {
            Ok(Ok(_)) => successful += 1,
            _ => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Outcome of concurrent first reads of one name.
#[derive(Debug, Clone)]
pub struct CreationRaceResult {
    /// Distinct note ids handed to the readers.
    pub observed_ids: HashSet<String>,
    /// Id of the record left in the store.
    pub stored_id: Option<String>,
    /// Reads that returned an error.
    pub failures: usize,
}

/// Has `readers` threads fetch a name nobody has created yet.
///
/// Creation is not guarded, so several readers may each create the note and
/// see different ids. The last write wins.
pub fn race_first_fetch(repo: Arc<NoteRepository>, name: &str, readers: usize) -> CreationRaceResult {
    let barrier = Arc::new(Barrier::new(readers));

    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();

            thread::spawn(move || {
                barrier.wait();
                repo.fetch_or_create(&name, "", &default_client())
            })
        })
        .collect();

    let mut observed_ids = HashSet::new();
    let mut failures = 0;
    for handle in handles {
        match handle.join().expect("reader panicked") {
            Ok(note) => {
                observed_ids.insert(note.id);
            }
            Err(_) => failures += 1,
        }
    }

    let stored_id = stored_record(&repo, name).map(|r| r.id().to_string());

    CreationRaceResult {
        observed_ids,
        stored_id,
        failures,
    }
}

/// Has `writers` threads each append `appends` lines to one note, re-fetching
/// and retrying whenever their token goes stale.
///
/// Returns the number of retries taken.
pub fn stress_retrying_appends(
    repo: Arc<NoteRepository>,
    name: &str,
    writers: usize,
    appends: usize,
) -> usize {
    repo.fetch_or_create(name, "", &default_client())
        .expect("initial fetch failed");
    let barrier = Arc::new(Barrier::new(writers));

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let repo = Arc::clone(&repo);
            let barrier = Arc::clone(&barrier);
            let name = name.to_string();

            thread::spawn(move || {
                barrier.wait();
                let mut retries = 0usize;
                for a in 0..appends {
                    loop {
                        let note = match repo.fetch_or_create(&name, "", &default_client()) {
                            Ok(note) => note,
                            Err(CoreError::Contended { .. }) => {
                                retries += 1;
                                continue;
                            }
                            Err(e) => panic!("fetch failed: {e}"),
                        };
                        let content = format!("{}w{w}-{a}\n", note.content);
                        match repo.commit(CommitRequest::new(name.clone(), note.version_token, content)) {
                            Ok(_) => break,
                            Err(CoreError::TokenMismatch { .. }) => retries += 1,
                            Err(e) => panic!("commit failed: {e}"),
                        }
                    }
                }
                retries
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("writer panicked"))
        .sum()
}
