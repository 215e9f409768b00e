//! Remote file synchronizer.
//!
//! ## Publish protocol
//!
//! 1. Caller obtains the remote copy with [`Synchronizer::refresh`] (never a
//!    cached hash when the comparison gates a write).
//! 2. SHA-256 hash the candidate and compare with the remote hash.
//! 3. Identical → stop, nothing is written.
//! 4. Divergent and [`WriteAuthorization::Confirmed`] → base64-encode and
//!    issue a conditional write carrying the observed version token.
//! 5. Success → invalidate the cache entry and hand back the new token.
//!
//! Steps 1–4 are packaged in [`crate::pipeline::resolve`].

use std::sync::Arc;

use sheetsync_core::{
    config::{render_commit_message, Config, DEFAULT_COMMIT_MESSAGE},
    types::{ContentHash, RemoteFile, RemoteRef, VersionToken},
};

use crate::cache::{Clock, FileCache};
use crate::error::SyncError;
use crate::hash::content_hash;
use crate::store::{RemoteStore, StoreError};
use crate::transport;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of comparing a candidate against the remote copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Candidate bytes hash to the remote hash.
    Identical { hash: ContentHash },
    /// Hashes differ.
    Divergent {
        candidate: ContentHash,
        remote: ContentHash,
    },
}

impl Reconciliation {
    /// Compare `candidate` against an already fetched remote file.
    pub fn between(candidate: &[u8], remote: &RemoteFile) -> Self {
        let candidate = content_hash(candidate);
        if candidate == remote.hash {
            Reconciliation::Identical { hash: candidate }
        } else {
            Reconciliation::Divergent {
                candidate,
                remote: remote.hash.clone(),
            }
        }
    }

    pub fn is_identical(&self) -> bool {
        matches!(self, Reconciliation::Identical { .. })
    }
}

/// Explicit go-ahead for a remote write, decided outside the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteAuthorization {
    Confirmed,
    #[default]
    Declined,
}

impl From<bool> for WriteAuthorization {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            WriteAuthorization::Confirmed
        } else {
            WriteAuthorization::Declined
        }
    }
}

/// A successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub version: VersionToken,
    pub hash: ContentHash,
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Cached reads and conditional writes against one [`RemoteStore`].
///
/// The cache is passed in rather than owned so that several synchronizers
/// (one per request, say) can share a single process-wide cache.
pub struct Synchronizer<S> {
    store: S,
    cache: Arc<FileCache>,
    commit_message: String,
}

impl<S: RemoteStore> Synchronizer<S> {
    pub fn new(store: S, cache: Arc<FileCache>) -> Self {
        Self {
            store,
            cache,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
        }
    }

    /// Build from config: TTL and commit message template come from `config`.
    pub fn from_config(store: S, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(FileCache::new(config.cache_ttl(), clock));
        Self::new(store, cache).with_commit_message(&config.commit_message)
    }

    /// Commit message template; `{path}` is replaced with the file path.
    pub fn with_commit_message(mut self, template: &str) -> Self {
        self.commit_message = template.to_owned();
        self
    }

    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }

    /// Current remote file, served from the cache while fresh.
    pub fn fetch(&self, remote: &RemoteRef) -> Result<RemoteFile, SyncError> {
        if let Some(file) = self.cache.get_fresh(remote) {
            tracing::debug!(remote = %remote, version = %file.version, "cache hit");
            return Ok(file);
        }
        tracing::debug!(remote = %remote, "cache miss");
        self.refresh(remote)
    }

    /// Read `remote` from the store, bypassing the cache, and cache the result.
    ///
    /// On failure the cache is left exactly as it was.
    pub fn refresh(&self, remote: &RemoteRef) -> Result<RemoteFile, SyncError> {
        let object = self.store.get(remote).map_err(|e| read_error(remote, e))?;
        let bytes = transport::decode(&object.payload).map_err(|e| SyncError::RemoteUnavailable {
            remote: remote.clone(),
            reason: format!("undecodable content: {e}"),
        })?;

        let file = RemoteFile {
            remote: remote.clone(),
            hash: content_hash(&bytes),
            bytes: bytes.into(),
            version: object.version,
        };
        tracing::debug!(
            remote = %remote,
            version = %file.version,
            hash = file.hash.short(),
            size = file.len(),
            "fetched remote file",
        );
        self.cache.insert(file.clone());
        Ok(file)
    }

    /// Compare `candidate` with the current remote file. Never writes.
    pub fn reconcile(
        &self,
        remote: &RemoteRef,
        candidate: &[u8],
    ) -> Result<Reconciliation, SyncError> {
        let file = self.fetch(remote)?;
        Ok(Reconciliation::between(candidate, &file))
    }

    /// Conditionally replace `remote` with `candidate`.
    ///
    /// `expected` must be the version token seen at the most recent fetch.
    /// A stale token yields [`SyncError::Conflict`]; every other store
    /// failure yields [`SyncError::Rejected`]. The cache entry for `remote`
    /// is dropped on success and on conflict.
    pub fn publish(
        &self,
        remote: &RemoteRef,
        candidate: &[u8],
        expected: &VersionToken,
        authorization: WriteAuthorization,
    ) -> Result<Published, SyncError> {
        if authorization != WriteAuthorization::Confirmed {
            tracing::debug!(remote = %remote, "publish skipped: not authorized");
            return Err(SyncError::NotAuthorized {
                remote: remote.clone(),
            });
        }

        let hash = content_hash(candidate);
        let content = transport::encode(candidate);
        let message = render_commit_message(&self.commit_message, &remote.path);

        match self.store.put(remote, &content, expected, &message) {
            Ok(version) => {
                self.cache.invalidate(remote);
                tracing::info!(
                    remote = %remote,
                    from = %expected,
                    to = %version,
                    hash = hash.short(),
                    "published",
                );
                Ok(Published { version, hash })
            }
            Err(StoreError::Conflict(reason)) => {
                self.cache.invalidate(remote);
                tracing::warn!(remote = %remote, expected = %expected, %reason, "publish conflict");
                Err(SyncError::Conflict {
                    remote: remote.clone(),
                    expected: expected.clone(),
                })
            }
            Err(err) => {
                tracing::warn!(remote = %remote, error = %err, "publish rejected");
                Err(SyncError::Rejected {
                    remote: remote.clone(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Drop any cached copy of `remote`.
    pub fn invalidate(&self, remote: &RemoteRef) -> bool {
        self.cache.invalidate(remote)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn read_error(remote: &RemoteRef, err: StoreError) -> SyncError {
    match err {
        StoreError::NotFound => SyncError::NotFound {
            remote: remote.clone(),
        },
        other => SyncError::RemoteUnavailable {
            remote: remote.clone(),
            reason: other.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
