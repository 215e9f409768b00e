//! Read-through cache of remote files.
//!
//! Entries are keyed by [`RemoteRef`] and expire after a fixed TTL measured
//! with an injected [`Clock`]. The cache is shared by every caller holding the
//! same `Arc<FileCache>`; concurrent inserts for one key are last-writer-wins.
//! An entry is only ever inserted whole, so an aborted read cannot leave a
//! partial entry behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use sheetsync_core::types::{RemoteFile, RemoteRef};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "now" for TTL decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        if let Some(next) = now.checked_add_signed(by) {
            *now = next;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// FileCache
// ---------------------------------------------------------------------------

/// A cached remote read.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub file: RemoteFile,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide TTL cache of [`RemoteFile`]s.
pub struct FileCache {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<RemoteRef, CacheEntry>>,
}

impl FileCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The entry for `remote` if it is younger than the TTL.
    ///
    /// Expired entries are left in place; the next insert replaces them.
    pub fn get_fresh(&self, remote: &RemoteRef) -> Option<RemoteFile> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(remote)?;
        (now - entry.fetched_at < self.ttl).then(|| entry.file.clone())
    }

    /// The entry for `remote` regardless of age.
    pub fn peek(&self, remote: &RemoteRef) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(remote)
            .cloned()
    }

    /// Store `file`, stamped with the current clock time.
    pub fn insert(&self, file: RemoteFile) {
        let entry = CacheEntry {
            fetched_at: self.clock.now(),
            file,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry.file.remote.clone(), entry);
    }

    /// Drop the entry for `remote`. Returns whether one existed.
    pub fn invalidate(&self, remote: &RemoteRef) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(remote)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
