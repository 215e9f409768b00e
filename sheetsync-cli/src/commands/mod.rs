//! Subcommand implementations and the helpers they share.

pub mod config;
pub mod fetch;
pub mod hash;
pub mod publish;
pub mod reconcile;
pub mod sync;

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use sheetsync_core::{config as sheetsync_config, types::RemoteRef, Config};
use sheetsync_github::GitHubStore;
use sheetsync_sync::{
    sniff::{self, WorkbookFormat},
    Synchronizer, SystemClock,
};

/// Config from `~/.sheetsync/config.yaml` with environment overrides applied.
pub fn load_config() -> Result<Config> {
    let mut config = sheetsync_config::load().context("failed to load sheetsync config")?;
    config.apply_env();
    Ok(config)
}

/// A synchronizer over the GitHub store described by `config`.
pub fn synchronizer(config: &Config) -> Synchronizer<GitHubStore> {
    let store = GitHubStore::new(config);
    if !store.has_token() {
        tracing::warn!("no GitHub token configured; private repositories and publishing will fail");
    }
    Synchronizer::from_config(store, config, Arc::new(SystemClock))
}

pub fn parse_locator(locator: &str, config: &Config) -> Result<RemoteRef> {
    RemoteRef::parse(locator, &config.default_branch).map_err(anyhow::Error::from)
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read '{}'", path.display()))
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("cannot write '{}'", path.display()))
}

/// Refuse candidates that are not a spreadsheet unless `any_format` is set.
pub fn check_candidate_format(bytes: &[u8], any_format: bool) -> Result<Option<WorkbookFormat>> {
    match sniff::sniff(bytes) {
        Ok(format) => Ok(Some(format)),
        Err(_) if any_format => Ok(None),
        Err(err) => bail!("{err} (pass --any-format to upload it anyway)"),
    }
}

/// Ask a yes/no question on the terminal. Non-interactive stdin answers no.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("{question} [y/N] ");
    std::io::stderr().flush().context("flush stderr")?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer).context("read answer")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to render JSON")?
    );
    Ok(())
}
