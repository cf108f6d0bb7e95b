//! Entry key hashing for the SQLite store.

use sha2::{Digest, Sha256};

/// Compute the primary key for a cached entry.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
