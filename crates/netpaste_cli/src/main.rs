//! NetPaste CLI
//!
//! Reads and writes notes in a file-backed NetPaste store.
//!
//! # Commands
//!
//! - `fetch` - Read a note, creating it if the name is unused
//! - `commit` - Replace a note's content using the token from a fetch
//! - `ttl` - Show how long a note has left
//! - `purge` - Drop expired notes from the store file

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared-text notes from the command line.
#[derive(Parser)]
#[command(name = "netpaste")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a note, creating it if the name is unused
    Fetch {
        /// Note name
        name: String,

        /// Password for protected notes
        #[arg(short, long, default_value = "")]
        password: String,

        /// Origin address recorded in the access log
        #[arg(long, default_value = "127.0.0.1")]
        origin: String,

        /// User agent used to classify the client
        #[arg(long, default_value = "netpaste-cli")]
        user_agent: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Replace a note's content
    Commit {
        /// Note name
        name: String,

        /// Version token from the last fetch
        #[arg(short, long)]
        token: String,

        /// New content
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read new content from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Set or replace the note's password
        #[arg(short, long)]
        password: Option<String>,

        /// New lifetime in seconds (0 keeps the current expiry)
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        ttl: i64,
    },

    /// Show how long a note has left
    Ttl {
        /// Note name
        name: String,
    },

    /// Drop expired notes from the store file
    Purge,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Fetch {
            name,
            password,
            origin,
            user_agent,
            format,
        } => {
            let store = cli.store.ok_or("Store path required for fetch")?;
            commands::fetch::run(&store, &name, &password, &origin, &user_agent, &format)?;
        }
        Commands::Commit {
            name,
            token,
            content,
            file,
            password,
            ttl,
        } => {
            let store = cli.store.ok_or("Store path required for commit")?;
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err("either --content or --file is required".into()),
            };
            commands::commit::run(&store, &name, &token, content, password, ttl)?;
        }
        Commands::Ttl { name } => {
            let store = cli.store.ok_or("Store path required for ttl")?;
            commands::ttl::run(&store, &name)?;
        }
        Commands::Purge => {
            let store = cli.store.ok_or("Store path required for purge")?;
            commands::purge::run(&store)?;
        }
        Commands::Version => {
            println!("NetPaste CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("NetPaste Core v{}", netpaste_core::VERSION);
        }
    }

    Ok(())
}
