//! `sheetsync hash`: content hash of a local file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use sheetsync_sync::{content_hash, sniff};

use super::read_file;

/// Arguments for `sheetsync hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub file: PathBuf,
}

impl HashArgs {
    pub fn run(self) -> Result<()> {
        let bytes = read_file(&self.file)?;
        let hash = content_hash(&bytes);
        let format = match sniff::sniff(&bytes) {
            Ok(format) => format.to_string(),
            Err(_) => "unknown".to_owned(),
        };
        println!("{hash}  {}  ({format}, {} bytes)", self.file.display(), bytes.len());
        Ok(())
    }
}
