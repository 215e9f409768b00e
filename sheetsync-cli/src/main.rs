//! sheetsync: keep dashboard spreadsheets in sync with their GitHub copy.
//!
//! # Usage
//!
//! ```text
//! sheetsync fetch <locator> [-o FILE] [--json]
//! sheetsync reconcile <locator> <file> [--diff] [--json]
//! sheetsync publish <locator> <file> --expect <token> [--yes] [--any-format]
//! sheetsync sync <locator> [<file>] [--yes] [-o FILE] [--any-format] [--json]
//! sheetsync hash <file>
//! sheetsync config show|path|init
//! ```
//!
//! A locator has the form `<owner>/<repo>/contents/<file_path>[@branch]`.
//! A `https://raw.githubusercontent.com/<owner>/<repo>/<branch>/<path>` URL
//! is accepted too.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, fetch::FetchArgs, hash::HashArgs, publish::PublishArgs,
    reconcile::ReconcileArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sheetsync",
    version,
    about = "Fetch, compare and publish dashboard spreadsheets stored on GitHub",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Overridden by SHEETSYNC_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the current remote copy and show its version and hash.
    Fetch(FetchArgs),

    /// Compare a local file with the remote copy by content hash.
    Reconcile(ReconcileArgs),

    /// Conditionally replace the remote copy with a local file.
    Publish(PublishArgs),

    /// Upload flow: refresh, compare, publish on --yes, and emit the bytes to use.
    Sync(SyncArgs),

    /// Print the content hash and detected format of a local file.
    Hash(HashArgs),

    /// Inspect or create ~/.sheetsync/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Fetch(args) => args.run(),
        Commands::Reconcile(args) => args.run(),
        Commands::Publish(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Hash(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("SHEETSYNC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
