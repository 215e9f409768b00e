//! Content hashing: SHA-256 over raw bytes, hex encoded.
//!
//! Equality of two blobs is decided by this digest alone; sizes, names and
//! upload times never participate.

use sha2::{Digest, Sha256};

use sheetsync_core::types::ContentHash;

/// SHA-256 hex digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    let mut h = Sha256::new();
    h.update(bytes);
    ContentHash(hex::encode(h.finalize()))
}
