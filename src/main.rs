//! CLI entry point for traxiv.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file; a missing file is fine.
    let dotenv = dotenvy::dotenv();

    // Parse CLI arguments before tracing, so --help works without logs
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(error) => debug!(error = %error, "No .env loaded"),
    }
    debug!(?cli, "CLI arguments parsed");

    match &cli.command {
        Command::List(args) => commands::run_list_command(&cli, args).await,
        Command::Sync(args) => commands::run_sync_command(&cli, args).await,
        Command::Purge(args) => commands::run_purge_command(&cli, args).await,
    }
}
