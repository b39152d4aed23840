//! TTL command implementation.

use super::open_repository;
use netpaste_kv::TtlState;
use std::path::Path;

/// Runs the ttl command.
pub fn run(store: &Path, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(store)?;
    let key = repo.key_for(name);

    match repo.backend().ttl(&key)? {
        TtlState::Missing => println!("{name}: not found"),
        TtlState::Persistent => println!("{name}: no expiry"),
        TtlState::Expires(left) => println!("{name}: expires in {}s", left.as_secs()),
    }

    repo.close()?;
    Ok(())
}
