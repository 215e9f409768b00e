//! Error types for sheetsync-sync.

use thiserror::Error;

use sheetsync_core::types::{RemoteRef, VersionToken};

/// Every distinct failure a synchronizer operation can surface.
///
/// Nothing here is retried internally; the caller decides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The path does not exist in the remote store.
    #[error("remote file not found: {remote}")]
    NotFound { remote: RemoteRef },

    /// Network, timeout or authentication failure while reading. Transient.
    #[error("remote store unavailable for {remote}: {reason}")]
    RemoteUnavailable { remote: RemoteRef, reason: String },

    /// The expected version token is stale; re-fetch before deciding again.
    #[error("version conflict on {remote}: {expected} is no longer the current revision")]
    Conflict {
        remote: RemoteRef,
        expected: VersionToken,
    },

    /// Any other publish failure (permission denied, validation, transport).
    #[error("publish of {remote} rejected: {reason}")]
    Rejected { remote: RemoteRef, reason: String },

    /// `publish` was called without a confirmed write authorization.
    #[error("publish of {remote} was not authorized")]
    NotAuthorized { remote: RemoteRef },
}

impl SyncError {
    /// `true` only for transient read failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::RemoteUnavailable { .. })
    }
}
