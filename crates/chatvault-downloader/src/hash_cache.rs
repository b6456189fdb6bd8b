// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-lifetime content digest cache.
//!
//! Each path is read and hashed at most once per process; later calls return
//! the cached digest without touching the file. A stale digest for a file
//! mutated in place at the same path is an accepted risk. Read failures are
//! surfaced and never cached, so a retry can succeed once the file exists.

use std::path::{Path, PathBuf};

use chatvault_core::ChatvaultError;
use dashmap::DashMap;
use sha2::{Digest, Sha256};

/// Memoized SHA-256 digests keyed by file path.
#[derive(Default)]
pub struct HashCache {
    entries: DashMap<PathBuf, String>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hex SHA-256 digest of the file's content, from cache when available.
    pub fn digest(&self, path: &Path) -> Result<String, ChatvaultError> {
        if let Some(hit) = self.entries.get(path) {
            return Ok(hit.clone());
        }

        let bytes = std::fs::read(path).map_err(ChatvaultError::storage)?;
        let digest = hex::encode(Sha256::digest(&bytes));
        self.entries.insert(path.to_path_buf(), digest.clone());
        Ok(digest)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_for_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let cache = HashCache::new();
        assert_eq!(cache.digest(&a).unwrap(), cache.digest(&b).unwrap());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn second_call_does_not_reread_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("once.bin");
        std::fs::write(&path, b"payload").unwrap();

        let cache = HashCache::new();
        let first = cache.digest(&path).unwrap();

        // With the file gone, only a cache hit can answer.
        std::fs::remove_file(&path).unwrap();
        let second = cache.digest(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn read_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.bin");

        let cache = HashCache::new();
        assert!(cache.digest(&path).is_err());
        assert!(cache.is_empty());

        // Once the file exists the retry succeeds.
        std::fs::write(&path, b"now present").unwrap();
        assert!(cache.digest(&path).is_ok());
        assert_eq!(cache.len(), 1);
    }
}
