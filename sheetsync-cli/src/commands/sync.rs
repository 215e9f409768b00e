//! `sheetsync sync`: the dashboard upload flow in one command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use sheetsync_sync::{
    pipeline::{self, Outcome, Resolution, Source},
    WriteAuthorization,
};

use super::{
    check_candidate_format, confirm, load_config, parse_locator, print_json, read_file,
    synchronizer, write_file,
};

/// Arguments for `sheetsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// `<owner>/<repo>/contents/<file_path>[@branch]`
    pub locator: String,

    /// Uploaded candidate; omit to just use the remote copy.
    pub file: Option<PathBuf>,

    /// Publish a differing candidate without asking.
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Write the resolved bytes (remote or candidate) to this file.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Allow candidates that do not look like a spreadsheet.
    #[arg(long)]
    pub any_format: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SyncJson {
    remote: String,
    source: &'static str,
    outcome: &'static str,
    hash: String,
    version: Option<String>,
    error: Option<String>,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let remote = parse_locator(&self.locator, &config)?;
        let candidate = match &self.file {
            Some(path) => {
                let bytes = read_file(path)?;
                check_candidate_format(&bytes, self.any_format)?;
                Some(bytes)
            }
            None => None,
        };
        let sync = synchronizer(&config);

        let authorization = WriteAuthorization::from(self.yes);
        let mut resolution = pipeline::resolve(&sync, &remote, candidate.as_deref(), authorization)
            .with_context(|| format!("sync failed for '{remote}'"))?;

        // Interactive confirmation only once the candidate is known to differ.
        if matches!(resolution.outcome, Outcome::KeptLocal { remote: Some(_) })
            && !self.json
            && confirm(&format!("Uploaded file differs from {remote}. Publish it?"))?
        {
            resolution = pipeline::resolve(
                &sync,
                &remote,
                candidate.as_deref(),
                WriteAuthorization::Confirmed,
            )
            .with_context(|| format!("sync failed for '{remote}'"))?;
        }

        if let Some(output) = &self.output {
            write_file(output, &resolution.bytes)?;
        }

        if self.json {
            print_json(&to_json(&remote.to_string(), &resolution))?;
        } else {
            print_resolution(&remote.to_string(), &resolution, self.output.as_ref());
        }

        if let Outcome::PublishFailed(err) = &resolution.outcome {
            bail!("publish failed for '{remote}': {err}");
        }
        Ok(())
    }
}

fn source_label(source: Source) -> &'static str {
    match source {
        Source::Remote => "remote",
        Source::Candidate => "candidate",
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::RemoteOnly => "remote_only",
        Outcome::Identical => "identical",
        Outcome::KeptLocal { .. } => "kept_local",
        Outcome::Published(_) => "published",
        Outcome::PublishFailed(_) => "publish_failed",
    }
}

fn to_json(remote: &str, resolution: &Resolution) -> SyncJson {
    SyncJson {
        remote: remote.to_owned(),
        source: source_label(resolution.source),
        outcome: outcome_label(&resolution.outcome),
        hash: resolution.hash.0.clone(),
        version: match &resolution.outcome {
            Outcome::Published(published) => Some(published.version.0.clone()),
            _ => None,
        },
        error: match &resolution.outcome {
            Outcome::PublishFailed(err) => Some(err.to_string()),
            _ => None,
        },
    }
}

fn print_resolution(remote: &str, resolution: &Resolution, output: Option<&PathBuf>) {
    match &resolution.outcome {
        Outcome::RemoteOnly => println!("{} using remote copy of {remote}", "✓".green()),
        Outcome::Identical => println!(
            "{} uploaded file is identical to {remote}; using remote copy",
            "✓".green()
        ),
        Outcome::KeptLocal { remote: Some(_) } => println!(
            "{} uploaded file differs from {remote}; using it locally (re-run with --yes to publish)",
            "~".yellow()
        ),
        Outcome::KeptLocal { remote: None } => println!(
            "{} {remote} does not exist remotely; using uploaded file locally",
            "~".yellow()
        ),
        Outcome::Published(published) => println!(
            "{} published uploaded file to {remote} (version {})",
            "✎".green(),
            published.version
        ),
        Outcome::PublishFailed(_) => println!(
            "{} publishing to {remote} failed; using uploaded file locally",
            "✗".red()
        ),
    }
    println!("  sha256   {}", resolution.hash);
    if let Some(output) = output {
        println!("  saved to {} ({})", output.display(), source_label(resolution.source));
    }
}
