//! Domain types for sheetsync.
//!
//! Remote identities are plain strings wrapped in newtypes so a file path can
//! never be passed where a branch or version token is expected.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LocatorError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// An `owner/name` repository identifier in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoSlug(pub String);

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoSlug {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoSlug {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A file path inside a repository, without a leading `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilePath(pub String);

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A branch (or other ref) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch(pub String);

impl Default for Branch {
    fn default() -> Self {
        Self("main".to_owned())
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Branch {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Branch {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque revision identifier handed out by the remote store.
///
/// Required for conditional writes; never interpreted locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionToken(pub String);

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Lowercase hex SHA-256 digest of a byte blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// First 12 hex characters, for log lines and terminal output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// RemoteRef
// ---------------------------------------------------------------------------

/// Identity of a remote file: (store location, path, branch).
///
/// Also the key of the read-through cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteRef {
    pub repo: RepoSlug,
    pub path: FilePath,
    pub branch: Branch,
}

impl RemoteRef {
    pub fn new(
        repo: impl Into<RepoSlug>,
        path: impl Into<FilePath>,
        branch: impl Into<Branch>,
    ) -> Self {
        Self {
            repo: repo.into(),
            path: path.into(),
            branch: branch.into(),
        }
    }

    /// Parse a `<owner>/<repo>/contents/<file_path>[@branch]` locator.
    ///
    /// `default_branch` is used when the locator carries no `@branch` suffix.
    /// A `raw.githubusercontent.com/<owner>/<repo>/<branch>/<path>` URL is
    /// accepted as well and names the same file.
    pub fn parse(locator: &str, default_branch: &Branch) -> Result<Self, LocatorError> {
        let locator = locator.trim();
        if let Some(rest) = RAW_URL_PREFIXES.iter().find_map(|p| locator.strip_prefix(*p)) {
            return Self::parse_raw_url(locator, rest);
        }
        let Some((repo, rest)) = locator.split_once("/contents/") else {
            return Err(LocatorError::MissingContents(locator.to_owned()));
        };

        let mut parts = repo.split('/');
        let valid_repo = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
        );
        if !valid_repo {
            return Err(LocatorError::BadRepo(repo.to_owned()));
        }

        let (path, branch) = match rest.rsplit_once('@') {
            Some((_, "")) => return Err(LocatorError::EmptyBranch(locator.to_owned())),
            Some((path, branch)) => (path, Branch::from(branch)),
            None => (rest, default_branch.clone()),
        };

        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(LocatorError::EmptyPath(locator.to_owned()));
        }

        Ok(Self::new(repo, path, branch))
    }

    fn parse_raw_url(locator: &str, rest: &str) -> Result<Self, LocatorError> {
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let mut segments = rest.splitn(3, '/');
        let (owner, name, tail) = match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), tail) if !owner.is_empty() && !name.is_empty() => {
                (owner, name, tail.unwrap_or_default())
            }
            _ => return Err(LocatorError::BadRepo(rest.to_owned())),
        };

        let tail = tail.strip_prefix("refs/heads/").unwrap_or(tail);
        let (branch, path) = tail.split_once('/').unwrap_or((tail, ""));
        if branch.is_empty() {
            return Err(LocatorError::EmptyBranch(locator.to_owned()));
        }
        let path = urlencoding::decode(path)
            .map_err(|_| LocatorError::BadEncoding(locator.to_owned()))?;
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(LocatorError::EmptyPath(locator.to_owned()));
        }

        Ok(Self::new(format!("{owner}/{name}"), path, branch))
    }
}

const RAW_URL_PREFIXES: [&str; 2] = [
    "https://raw.githubusercontent.com/",
    "http://raw.githubusercontent.com/",
];

impl FromStr for RemoteRef {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, &Branch::default())
    }
}

impl fmt::Display for RemoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/contents/{}@{}", self.repo, self.path, self.branch)
    }
}

// ---------------------------------------------------------------------------
// RemoteFile
// ---------------------------------------------------------------------------

/// Canonical bytes of a remote file at one observed revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub remote: RemoteRef,
    pub bytes: Arc<[u8]>,
    pub hash: ContentHash,
    pub version: VersionToken,
}

impl RemoteFile {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
