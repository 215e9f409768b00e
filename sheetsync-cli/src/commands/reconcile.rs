//! `sheetsync reconcile`: compare a local file with the remote copy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use sheetsync_sync::{diff::text_diff, Reconciliation};

use super::{load_config, parse_locator, print_json, read_file, synchronizer};

/// Arguments for `sheetsync reconcile`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// `<owner>/<repo>/contents/<file_path>[@branch]`
    pub locator: String,

    /// Local candidate file.
    pub file: PathBuf,

    /// Show a unified diff when both sides are text (CSV).
    #[arg(long, conflicts_with = "json")]
    pub diff: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ReconcileJson {
    remote: String,
    identical: bool,
    candidate_hash: String,
    remote_hash: String,
    remote_version: String,
}

impl ReconcileArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let remote = parse_locator(&self.locator, &config)?;
        let candidate = read_file(&self.file)?;
        let sync = synchronizer(&config);

        let current = sync
            .fetch(&remote)
            .with_context(|| format!("reconcile failed for '{remote}'"))?;
        let reconciliation = Reconciliation::between(&candidate, &current);

        if self.json {
            let (candidate_hash, remote_hash) = match &reconciliation {
                Reconciliation::Identical { hash } => (hash.clone(), hash.clone()),
                Reconciliation::Divergent { candidate, remote } => {
                    (candidate.clone(), remote.clone())
                }
            };
            return print_json(&ReconcileJson {
                remote: remote.to_string(),
                identical: reconciliation.is_identical(),
                candidate_hash: candidate_hash.0,
                remote_hash: remote_hash.0,
                remote_version: current.version.0,
            });
        }

        match &reconciliation {
            Reconciliation::Identical { hash } => {
                println!(
                    "{} '{}' is identical to {} ({})",
                    "✓".green(),
                    self.file.display(),
                    remote,
                    hash.short()
                );
            }
            Reconciliation::Divergent { candidate, remote: remote_hash } => {
                println!(
                    "{} '{}' differs from {}",
                    "≠".yellow(),
                    self.file.display(),
                    remote
                );
                println!("  local   {}", candidate.short());
                println!("  remote  {} (version {})", remote_hash.short(), current.version);
                println!(
                    "  publish with: sheetsync publish {} {} --expect {}",
                    self.locator,
                    self.file.display(),
                    current.version
                );
            }
        }

        if self.diff && !reconciliation.is_identical() {
            match text_diff(&current, &candidate) {
                Some(diff) if !diff.is_empty() => {
                    print!("{diff}");
                    if !diff.ends_with('\n') {
                        println!();
                    }
                }
                Some(_) => println!("  (only line endings differ)"),
                None => println!("  (binary content; no line diff)"),
            }
        }
        Ok(())
    }
}
