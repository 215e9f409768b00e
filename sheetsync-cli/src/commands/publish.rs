//! `sheetsync publish`: conditional write of a local file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use sheetsync_core::types::VersionToken;
use sheetsync_sync::{Reconciliation, SyncError, WriteAuthorization};

use super::{check_candidate_format, confirm, load_config, parse_locator, read_file, synchronizer};

/// Arguments for `sheetsync publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// `<owner>/<repo>/contents/<file_path>[@branch]`
    pub locator: String,

    /// Local file to publish.
    pub file: PathBuf,

    /// Version token observed at your last fetch (see `sheetsync fetch`).
    #[arg(long, value_name = "TOKEN")]
    pub expect: String,

    /// Publish without asking for confirmation.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Allow files that do not look like a spreadsheet.
    #[arg(long)]
    pub any_format: bool,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let remote = parse_locator(&self.locator, &config)?;
        let candidate = read_file(&self.file)?;
        check_candidate_format(&candidate, self.any_format)?;
        let sync = synchronizer(&config);
        let expected = VersionToken::from(self.expect.as_str());

        let current = sync
            .refresh(&remote)
            .with_context(|| format!("fetch failed for '{remote}'"))?;
        if Reconciliation::between(&candidate, &current).is_identical() {
            println!(
                "{} '{}' is identical to {}; nothing to publish",
                "✓".green(),
                self.file.display(),
                remote
            );
            return Ok(());
        }

        let authorization = if self.yes {
            WriteAuthorization::Confirmed
        } else {
            WriteAuthorization::from(confirm(&format!(
                "Publish '{}' to {}?",
                self.file.display(),
                remote
            ))?)
        };

        match sync.publish(&remote, &candidate, &expected, authorization) {
            Ok(published) => {
                println!("{} published {}", "✓".green(), remote);
                println!("  version  {} → {}", expected, published.version);
                println!("  sha256   {}", published.hash);
                Ok(())
            }
            Err(err @ SyncError::Conflict { .. }) => {
                bail!(
                    "{err}\n  the remote copy is now at version {}; \
                     re-run `sheetsync reconcile` and publish with that token",
                    current.version
                )
            }
            Err(err @ SyncError::NotAuthorized { .. }) => {
                bail!("{err}; pass --yes to publish without a prompt")
            }
            Err(err) => Err(err).with_context(|| format!("publish failed for '{remote}'")),
        }
    }
}
