//! # sheetsync-sync
//!
//! Read-through cached access to remote spreadsheet files and a
//! hash-gated, version-checked publish path.
//!
//! Build a [`Synchronizer`] over any [`RemoteStore`], then call
//! [`Synchronizer::fetch`], [`Synchronizer::reconcile`] and
//! [`Synchronizer::publish`], or run the whole upload flow with
//! [`pipeline::resolve`].

pub mod cache;
pub mod diff;
pub mod error;
pub mod hash;
pub mod memory;
pub mod pipeline;
pub mod sniff;
pub mod store;
pub mod synchronizer;
pub mod transport;

pub use cache::{CacheEntry, Clock, FileCache, ManualClock, SystemClock};
pub use error::SyncError;
pub use hash::content_hash;
pub use memory::MemoryStore;
pub use store::{Payload, RemoteStore, StoreError, StoredObject};
pub use synchronizer::{Published, Reconciliation, Synchronizer, WriteAuthorization};
