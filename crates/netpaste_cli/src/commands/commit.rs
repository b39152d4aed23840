//! Commit command implementation.

use super::open_repository;
use netpaste_core::{CommitRequest, CoreError, VersionToken};
use std::path::Path;
use tracing::warn;

/// Runs the commit command.
pub fn run(
    store: &Path,
    name: &str,
    token: &str,
    content: String,
    password: Option<String>,
    ttl_seconds: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(store)?;

    let mut request = CommitRequest::new(name, VersionToken::from_string(token), content)
        .ttl_seconds(ttl_seconds);
    if let Some(password) = password {
        request = request.password(password);
    }

    let committed = match repo.commit(request) {
        Ok(committed) => committed,
        Err(e @ CoreError::TokenMismatch { .. }) => {
            warn!(note = name, "note changed since it was fetched");
            repo.close()?;
            return Err(format!("{e}; fetch the note again and retry").into());
        }
        Err(e) => {
            repo.close()?;
            return Err(e.into());
        }
    };

    println!("Committed {name}");
    println!("  ID:    {}", committed.note_id);
    println!("  Token: {}", committed.version_token);
    println!("  At:    {}", committed.timestamp);

    repo.close()?;
    Ok(())
}
