//! User configuration file.
//!
//! # Storage layout
//!
//! ```text
//! ~/.sheetsync/
//!   config.yaml     (mode 0600, may contain the store token)
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{Branch, FilePath};

/// Environment variables consulted for the store token, in priority order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["SHEETSYNC_GITHUB_TOKEN", "GITHUB_TOKEN"];

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update {path} via dashboard";

/// Settings supplied to the synchronizer and the remote store at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the contents API.
    pub api_base: String,
    /// Access token. Overridden by [`TOKEN_ENV_VARS`] when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Time-to-live of cached remote reads.
    pub cache_ttl_secs: u64,
    /// Upper bound on every remote request.
    pub timeout_secs: u64,
    /// Branch used when a locator has no `@branch` suffix.
    pub default_branch: Branch,
    /// Commit message template; `{path}` is replaced with the file path.
    pub commit_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            token: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_branch: Branch::default(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Render the commit message for a publish of `path`.
    pub fn commit_message_for(&self, path: &FilePath) -> String {
        render_commit_message(&self.commit_message, path)
    }

    /// Override `token` from the first non-empty variable in [`TOKEN_ENV_VARS`].
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// [`Config::apply_env`] with an injectable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = TOKEN_ENV_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .find(|value| !value.trim().is_empty())
        {
            self.token = Some(token);
        }
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "api_base",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.default_branch.0.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "default_branch",
                reason: "must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Substitute `{path}` in a commit message template.
pub fn render_commit_message(template: &str, path: &FilePath) -> String {
    template.replace("{path}", &path.0)
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.sheetsync/`
pub fn config_dir_at(home: &Path) -> PathBuf {
    home.join(".sheetsync")
}

/// `<home>/.sheetsync/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    config_dir_at(home).join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load `<home>/.sheetsync/config.yaml`.
///
/// A missing file yields [`Config::default`]. Returns `ConfigError::Parse`
/// (with path + line context) if the YAML is malformed, and
/// `ConfigError::Invalid` if a value is out of range. Environment overrides
/// are NOT applied here; call [`Config::apply_env`] afterwards.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let config: Config = if contents.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?
    };
    config.validate()?;
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    load_at(&home()?)
}

/// Atomically save the config to `<home>/.sheetsync/config.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn config_path_is_correct() {
        let home = TempDir::new().unwrap();
        let path = config_path_at(home.path());
        assert!(path.ends_with(".sheetsync/config.yaml"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let home = TempDir::new().unwrap();
        let config = load_at(home.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn partial_file_fills_remaining_fields_with_defaults() {
        let home = TempDir::new().unwrap();
        let dir = config_dir_at(home.path());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "cache_ttl_secs: 60\ndefault_branch: dev\n",
        )
        .unwrap();

        let config = load_at(home.path()).unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.default_branch, Branch::from("dev"));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let config = Config {
            token: Some("ghp_secret".to_owned()),
            timeout_secs: 5,
            ..Config::default()
        };
        save_at(home.path(), &config).unwrap();
        assert_eq!(load_at(home.path()).unwrap(), config);
    }

    #[test]
    #[cfg(unix)]
    fn saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let home = TempDir::new().unwrap();
        save_at(home.path(), &Config::default()).unwrap();
        let mode = std::fs::metadata(config_path_at(home.path()))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let home = TempDir::new().unwrap();
        save_at(home.path(), &Config::default()).unwrap();
        let tmp = config_path_at(home.path()).with_file_name("config.yaml.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "timeout_secs", .. }));
    }

    #[test]
    fn env_token_overrides_file_token_in_priority_order() {
        let env: HashMap<&str, &str> =
            HashMap::from([("GITHUB_TOKEN", "generic"), ("SHEETSYNC_GITHUB_TOKEN", "specific")]);
        let mut config = Config {
            token: Some("from-file".to_owned()),
            ..Config::default()
        };
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.token.as_deref(), Some("specific"));
    }

    #[test]
    fn blank_env_token_is_ignored() {
        let mut config = Config {
            token: Some("from-file".to_owned()),
            ..Config::default()
        };
        config.apply_env_from(|k| (k == "SHEETSYNC_GITHUB_TOKEN").then(|| "  ".to_owned()));
        assert_eq!(config.token.as_deref(), Some("from-file"));
    }

    #[test]
    fn commit_message_substitutes_path() {
        let config = Config::default();
        assert_eq!(
            config.commit_message_for(&FilePath::from("data/kontrak.xlsx")),
            "Update data/kontrak.xlsx via dashboard"
        );
    }

    #[test]
    fn home_not_found_error_message() {
        let err = ConfigError::HomeNotFound;
        assert!(err.to_string().contains("home directory"));
    }
}
