//! Exact duplicate index: SHA-256 of the raw capture bytes.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Set of digests seen during the run.
#[derive(Debug, Default)]
pub struct ExactIndex {
    seen: Mutex<HashSet<String>>,
}

impl ExactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True (and records the digest) the first time these bytes are seen.
    pub fn is_unique(&self, bytes: &[u8]) -> bool {
        self.record(sha256_hex(bytes))
    }

    /// True if `digest` was not yet recorded.
    pub fn record(&self, digest: String) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(digest)
    }

    /// Drops a digest recorded for a capture that was never kept.
    pub fn remove(&self, digest: &str) -> bool {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).remove(digest)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_content() {
        assert_eq!(
            sha256_hex(b"hello\n"),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn unique_once_per_digest() {
        let index = ExactIndex::new();
        assert!(index.is_unique(b"page one"));
        assert!(!index.is_unique(b"page one"));
        assert!(index.is_unique(b"page two"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn removed_digest_is_unique_again() {
        let index = ExactIndex::new();
        assert!(index.is_unique(b"page"));
        assert!(index.remove(&sha256_hex(b"page")));
        assert!(index.is_empty());
        assert!(index.is_unique(b"page"));
    }

    #[test]
    fn concurrent_inserts_admit_one_winner() {
        let index = std::sync::Arc::new(ExactIndex::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = index.clone();
                std::thread::spawn(move || index.is_unique(b"same bytes"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|unique| *unique)
            .count();
        assert_eq!(winners, 1);
    }
}
