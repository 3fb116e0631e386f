//! Command-line interface.

pub mod commands;
pub mod report;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "credsweep",
    version,
    about = "Scan source trees for hard-coded credentials",
    propagate_version = true
)]
pub struct Cli {
    /// Enable debug logging (skipped files, decode errors)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for credential-like strings
    Scan(commands::scan::ScanArgs),
    /// Replay the scan across successive commits of a git repository
    History(commands::history::HistoryArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let verbose = self.verbose > 0;
        match self.command {
            Commands::Scan(args) => commands::scan::execute(args, verbose),
            Commands::History(args) => commands::history::execute(args, verbose),
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins when set; otherwise
/// the verbose switch decides between info and debug.
pub fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .try_init();
}
