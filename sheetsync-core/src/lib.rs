//! sheetsync core library: domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes for remote locations, hashes and version tokens
//! - [`error`]: [`ConfigError`], [`LocatorError`]
//! - [`config`]: load / save the `~/.sheetsync/config.yaml` file

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, LocatorError};
pub use types::{Branch, ContentHash, FilePath, RemoteFile, RemoteRef, RepoSlug, VersionToken};
