//! Purge command implementation.

use super::open_repository;
use std::path::Path;
use tracing::info;

/// Runs the purge command.
pub fn run(store: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(store)?;
    let dropped = repo.backend().purge_expired()?;
    info!(dropped, "purged expired notes");
    println!("Purged {dropped} expired note(s)");

    repo.close()?;
    Ok(())
}
