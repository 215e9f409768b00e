//! Error types for sheetsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading or saving the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, read-only directory, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A value parsed but makes no sense (zero TTL, empty API base, ...).
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.sheetsync/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Errors from parsing a `<owner>/<repo>/contents/<path>[@branch]` locator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("locator '{0}' must have the form '<owner>/<repo>/contents/<file_path>[@branch]'")]
    MissingContents(String),

    #[error("repository '{0}' must have the form '<owner>/<repo>'")]
    BadRepo(String),

    #[error("locator '{0}' has an empty file path")]
    EmptyPath(String),

    #[error("locator '{0}' has an empty branch")]
    EmptyBranch(String),

    #[error("locator '{0}' has an invalid percent-encoded path")]
    BadEncoding(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
