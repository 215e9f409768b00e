//! Remote content store boundary.
//!
//! A store speaks in transport payloads: reads hand back either base64 text
//! or raw bytes (large files served from a download URL), writes always carry
//! base64 text. Decoding and encoding happen in [`crate::transport`], never
//! inside a store implementation.

use std::sync::Arc;

use thiserror::Error;

use sheetsync_core::types::{RemoteRef, VersionToken};

/// File content as delivered by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Base64 text, possibly wrapped with line breaks.
    Base64(String),
    /// Bytes that needed no transport decoding.
    Raw(Vec<u8>),
}

/// Result of a successful store read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub payload: Payload,
    pub version: VersionToken,
}

/// Failures reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    /// Conditional write refused because the expected token is stale.
    #[error("version mismatch: {0}")]
    Conflict(String),

    /// Authentication or permission failure.
    #[error("access denied (status {status}): {message}")]
    Denied { status: u16, message: String },

    /// Network, timeout or server-side failure.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something that could not be understood.
    #[error("invalid response: {0}")]
    Invalid(String),
}

/// A remote store offering reads and conditional writes keyed by version token.
pub trait RemoteStore: Send + Sync {
    /// Read the current content and version token of `remote`.
    fn get(&self, remote: &RemoteRef) -> Result<StoredObject, StoreError>;

    /// Replace the content of `remote` with base64 `content`, but only if its
    /// current version is `expected`. Returns the new version token.
    fn put(
        &self,
        remote: &RemoteRef,
        content: &str,
        expected: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    fn get(&self, remote: &RemoteRef) -> Result<StoredObject, StoreError> {
        (**self).get(remote)
    }

    fn put(
        &self,
        remote: &RemoteRef,
        content: &str,
        expected: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        (**self).put(remote, content, expected, message)
    }
}

impl<T: RemoteStore + ?Sized> RemoteStore for &T {
    fn get(&self, remote: &RemoteRef) -> Result<StoredObject, StoreError> {
        (**self).get(remote)
    }

    fn put(
        &self,
        remote: &RemoteRef,
        content: &str,
        expected: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        (**self).put(remote, content, expected, message)
    }
}
