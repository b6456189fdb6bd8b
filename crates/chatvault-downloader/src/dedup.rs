// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content-based duplicate handling for freshly downloaded files.
//!
//! A new file whose content matches an existing sibling from the same copy
//! family (`name`, `name-copy1`, ...) is deleted and the surviving path is
//! referenced instead. This is explicit policy: identical media forwarded
//! into many messages is stored once.

use std::path::{Path, PathBuf};

use chatvault_core::ChatvaultError;
use tracing::debug;

use crate::hash_cache::HashCache;
use crate::paths::copy_family_stem;

/// Resolve a freshly written file against same-family siblings.
///
/// Returns the path the caller should reference: the original sibling when
/// the new file duplicates it (the new copy is removed), otherwise the new
/// file itself.
pub fn resolve_duplicate(path: &Path, hashes: &HashCache) -> Result<PathBuf, ChatvaultError> {
    if !path.is_file() {
        return Ok(path.to_path_buf());
    }

    let Some(parent) = path.parent() else {
        return Ok(path.to_path_buf());
    };
    let family = copy_family_stem(path);

    let new_digest = hashes.digest(path)?;

    let entries = std::fs::read_dir(parent).map_err(ChatvaultError::storage)?;
    for entry in entries {
        let entry = entry.map_err(ChatvaultError::storage)?;
        let candidate = entry.path();
        if candidate == path || !candidate.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(family.as_str()) || copy_family_stem(&candidate) != family {
            continue;
        }

        // A sibling that vanished or turned unreadable between the directory
        // scan and the hash is simply skipped.
        let Ok(existing_digest) = hashes.digest(&candidate) else {
            continue;
        };
        if existing_digest == new_digest {
            std::fs::remove_file(path).map_err(ChatvaultError::storage)?;
            debug!(
                duplicate = %path.display(),
                kept = %candidate.display(),
                "discarded duplicate download"
            );
            return Ok(candidate);
        }
    }

    Ok(path.to_path_buf())
}
