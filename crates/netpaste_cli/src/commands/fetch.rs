//! Fetch command implementation.

use super::open_repository;
use netpaste_core::{ClientInfo, NoteView};
use std::path::Path;

/// Runs the fetch command.
pub fn run(
    store: &Path,
    name: &str,
    password: &str,
    origin: &str,
    user_agent: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(store)?;
    let client = ClientInfo::new(origin, user_agent);
    let note = repo.fetch_or_create(name, password, &client)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&note)?),
        _ => print_text(&note),
    }

    repo.close()?;
    Ok(())
}

fn print_text(note: &NoteView) {
    println!("NetPaste Note");
    println!("=============");
    println!();
    println!("Name:       {}", note.name);
    println!("ID:         {}", note.id);
    println!("Token:      {}", note.version_token);
    println!("Created:    {}", note.created_at);
    println!("Updated:    {}", note.updated_at);
    println!("Reads:      {}", note.read_count);
    println!("TTL:        {}s", note.ttl_seconds);
    println!("Protected:  {}", if note.has_password { "yes" } else { "no" });

    if !note.access_log.is_empty() {
        println!();
        println!("Recent Access:");
        for entry in note.access_log.entries() {
            println!(
                "  {} {:<3} {} ({})",
                entry.timestamp,
                entry.client_class.as_str(),
                entry.origin,
                entry.location
            );
        }
    }

    println!();
    println!("{}", note.content);
}
