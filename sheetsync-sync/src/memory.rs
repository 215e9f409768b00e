//! In-process [`RemoteStore`] with conditional writes.
//!
//! Serves reads as wrapped base64, like the contents API, and counts every
//! call so tests can tell cache hits from remote reads. Failure switches
//! simulate an unreachable store and a read-only token.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use sheetsync_core::types::{RemoteRef, VersionToken};

use crate::store::{Payload, RemoteStore, StoreError, StoredObject};
use crate::transport;

#[derive(Debug, Clone)]
struct Revision {
    bytes: Vec<u8>,
    version: VersionToken,
}

/// A [`RemoteStore`] kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<RemoteRef, Revision>>,
    last_message: Mutex<Option<String>>,
    next_revision: AtomicU64,
    gets: AtomicUsize,
    puts: AtomicUsize,
    unavailable: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed (or overwrite) `remote` unconditionally.
    pub fn insert(&self, remote: &RemoteRef, bytes: &[u8], version: VersionToken) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                remote.clone(),
                Revision {
                    bytes: bytes.to_vec(),
                    version,
                },
            );
    }

    /// Current bytes and token of `remote`, without counting as a read.
    pub fn current(&self, remote: &RemoteRef) -> Option<(Vec<u8>, VersionToken)> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(remote)
            .map(|rev| (rev.bytes.clone(), rev.version.clone()))
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Commit message of the most recent accepted write.
    pub fn last_message(&self) -> Option<String> {
        self.last_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fail every call with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail every write with [`StoreError::Denied`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn next_version(&self) -> VersionToken {
        let n = self.next_revision.fetch_add(1, Ordering::SeqCst) + 1;
        VersionToken(format!("mem-{n}"))
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_owned()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn get(&self, remote: &RemoteRef) -> Result<StoredObject, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let rev = files.get(remote).ok_or(StoreError::NotFound)?;
        Ok(StoredObject {
            payload: Payload::Base64(transport::wrap(&transport::encode(&rev.bytes), 60)),
            version: rev.version.clone(),
        })
    }

    fn put(
        &self,
        remote: &RemoteRef,
        content: &str,
        expected: &VersionToken,
        message: &str,
    ) -> Result<VersionToken, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Denied {
                status: 403,
                message: "read-only token".to_owned(),
            });
        }
        let bytes = transport::decode(&Payload::Base64(content.to_owned()))
            .map_err(|e| StoreError::Invalid(format!("content is not base64: {e}")))?;

        // Check-and-swap under one lock: concurrent writers with the same
        // token are serialised here.
        let mut files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        let rev = files.get_mut(remote).ok_or(StoreError::NotFound)?;
        if &rev.version != expected {
            return Err(StoreError::Conflict(format!(
                "{} does not match {}",
                expected, rev.version
            )));
        }
        let version = self.next_version();
        rev.bytes = bytes;
        rev.version = version.clone();
        drop(files);

        *self
            .last_message
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_owned());
        Ok(version)
    }
}
