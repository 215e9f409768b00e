//! `sheetsync fetch`: download the remote copy.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use sheetsync_sync::sniff;

use super::{load_config, parse_locator, print_json, synchronizer, write_file};

/// Arguments for `sheetsync fetch`.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// `<owner>/<repo>/contents/<file_path>[@branch]`
    pub locator: String,

    /// Write the downloaded bytes to this file.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct FetchJson {
    remote: String,
    version: String,
    hash: String,
    size: usize,
    format: Option<String>,
    output: Option<String>,
}

impl FetchArgs {
    pub fn run(self) -> Result<()> {
        let config = load_config()?;
        let remote = parse_locator(&self.locator, &config)?;
        let sync = synchronizer(&config);

        let file = sync
            .fetch(&remote)
            .with_context(|| format!("fetch failed for '{remote}'"))?;
        if let Some(output) = &self.output {
            write_file(output, &file.bytes)?;
        }
        let format = sniff::sniff(&file.bytes).ok();

        if self.json {
            return print_json(&FetchJson {
                remote: remote.to_string(),
                version: file.version.0.clone(),
                hash: file.hash.0.clone(),
                size: file.len(),
                format: format.map(|f| f.to_string()),
                output: self.output.as_ref().map(|p| p.display().to_string()),
            });
        }

        println!("{} {}", "✓".green(), remote);
        println!("  version  {}", file.version);
        println!("  sha256   {}", file.hash);
        println!("  size     {} bytes", file.len());
        if let Some(format) = format {
            println!("  format   {format}");
        }
        if let Some(output) = &self.output {
            println!("  saved to {}", output.display());
        }
        Ok(())
    }
}
