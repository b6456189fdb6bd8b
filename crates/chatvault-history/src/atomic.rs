// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atomic document replacement.
//!
//! Presentation documents are regenerated wholesale; writing into a temp
//! file in the destination directory and renaming over the old document
//! means an observer never sees a half-written file, and a failed write
//! leaves the previous document untouched.

use std::io::Write;
use std::path::Path;

use chatvault_core::ChatvaultError;

/// Write `content` to `path` via temp-file-then-rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ChatvaultError> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(ChatvaultError::storage)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(ChatvaultError::storage)?;
    tmp.write_all(content.as_bytes())
        .map_err(ChatvaultError::storage)?;
    tmp.flush().map_err(ChatvaultError::storage)?;
    tmp.persist(path)
        .map_err(|e| ChatvaultError::storage(e.error))?;
    Ok(())
}
