//! Upload pipeline shared by every dashboard page and the CLI.
//!
//! Decides which bytes a page should render (the canonical remote copy or
//! an uploaded candidate) and publishes the candidate when asked to.

use std::sync::Arc;

use sheetsync_core::types::{ContentHash, RemoteRef};

use crate::hash::content_hash;
use crate::store::RemoteStore;
use crate::synchronizer::{Published, Reconciliation, Synchronizer, WriteAuthorization};
use crate::SyncError;

/// Where the resolved bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Candidate,
}

/// What happened on the way to a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No candidate was supplied.
    RemoteOnly,
    /// Candidate matches the remote copy; nothing was written.
    Identical,
    /// Candidate differs (or the remote file is absent) and no write was
    /// authorized; the candidate is used locally.
    KeptLocal { remote: Option<ContentHash> },
    /// Candidate was written to the store.
    Published(Published),
    /// Candidate was authorized but the write failed; used locally anyway.
    PublishFailed(SyncError),
}

/// Bytes to use plus how they were chosen.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub source: Source,
    pub bytes: Arc<[u8]>,
    pub hash: ContentHash,
    pub outcome: Outcome,
}

/// Run the upload flow for `remote`.
///
/// The remote copy is always refreshed first so the comparison that gates a
/// write never rests on a cached hash. A missing remote file is only an error
/// when there is no candidate to fall back on. Read failures other than
/// `NotFound` are returned as-is.
pub fn resolve<S: RemoteStore>(
    sync: &Synchronizer<S>,
    remote: &RemoteRef,
    candidate: Option<&[u8]>,
    authorization: WriteAuthorization,
) -> Result<Resolution, SyncError> {
    let current = match sync.refresh(remote) {
        Ok(file) => Some(file),
        Err(SyncError::NotFound { .. }) if candidate.is_some() => None,
        Err(err) => return Err(err),
    };

    let Some(candidate) = candidate else {
        // `current` is always Some here: NotFound without a candidate returned above.
        let Some(file) = current else {
            return Err(SyncError::NotFound {
                remote: remote.clone(),
            });
        };
        return Ok(Resolution {
            source: Source::Remote,
            bytes: file.bytes,
            hash: file.hash,
            outcome: Outcome::RemoteOnly,
        });
    };

    let Some(file) = current else {
        tracing::info!(remote = %remote, "remote file missing; using candidate locally");
        return Ok(local(candidate, Outcome::KeptLocal { remote: None }));
    };

    let remote_hash = match Reconciliation::between(candidate, &file) {
        Reconciliation::Identical { .. } => {
            tracing::info!(remote = %remote, "candidate identical to remote; using remote copy");
            return Ok(Resolution {
                source: Source::Remote,
                bytes: file.bytes,
                hash: file.hash,
                outcome: Outcome::Identical,
            });
        }
        Reconciliation::Divergent { remote, .. } => remote,
    };

    if authorization != WriteAuthorization::Confirmed {
        return Ok(local(
            candidate,
            Outcome::KeptLocal {
                remote: Some(remote_hash),
            },
        ));
    }

    let outcome = match sync.publish(remote, candidate, &file.version, authorization) {
        Ok(published) => Outcome::Published(published),
        Err(err) => {
            tracing::error!(
                remote = %remote,
                error = %err,
                "publish failed; using candidate locally"
            );
            Outcome::PublishFailed(err)
        }
    };
    Ok(local(candidate, outcome))
}

fn local(candidate: &[u8], outcome: Outcome) -> Resolution {
    Resolution {
        source: Source::Candidate,
        bytes: candidate.into(),
        hash: content_hash(candidate),
        outcome,
    }
}
