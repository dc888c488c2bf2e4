//! Roster — student account reconciliation CLI.
//!
//! # Usage
//!
//! ```text
//! roster init --org <id> --domain <domain> --base-url <url> [--live]
//! roster sync [--dry-run] [--json]
//! roster diff
//! roster status [--json]
//! ```

mod commands;
mod directory;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, init::InitArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Reconcile the student master list against the account directory",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write ~/.roster/config.yaml.
    Init(InitArgs),

    /// Reconcile the roster, provision accounts and update the master list.
    Sync(SyncArgs),

    /// Show what a live sync would change in the master list.
    Diff(DiffArgs),

    /// Summarize the current master list.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_env("ROSTER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub(crate) fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}
