//! GitHub Contents API backend for sheetsync.
//!
//! [`GitHubStore`] implements [`sheetsync_sync::RemoteStore`]: reads use
//! `GET /repos/{repo}/contents/{path}?ref={branch}`, writes use a `PUT` to the
//! same URL carrying the blob SHA last seen, which GitHub checks before
//! accepting the commit.

pub mod api;
mod client;

pub use client::GitHubStore;
