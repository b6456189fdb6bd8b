// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only per-chat JSONL log, the archive's source of truth.
//!
//! One serialized [`HistoryEntry`] per line, appended and fsynced per batch,
//! never rewritten in place. Only the coordinating task for a chat appends
//! to its log, so there is no concurrent-writer case by construction. The
//! reader tolerates a torn final line from an earlier crash: bad lines are
//! skipped with a warning, not repaired.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use chatvault_core::ChatvaultError;
use chatvault_core::types::ChatId;
use tracing::warn;

use crate::entry::HistoryEntry;

/// The per-chat durable logs under one history directory.
pub struct HistoryLog {
    dir: PathBuf,
}

impl HistoryLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of a chat's log file (`chat_<abs id>.jsonl`).
    pub fn log_path(&self, chat: ChatId) -> PathBuf {
        self.dir.join(format!("chat_{}.jsonl", chat.archive_id()))
    }

    /// Append a batch of entries and sync them to disk.
    pub fn append_batch(
        &self,
        chat: ChatId,
        entries: &[HistoryEntry],
    ) -> Result<(), ChatvaultError> {
        std::fs::create_dir_all(&self.dir).map_err(ChatvaultError::storage)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(chat))
            .map_err(ChatvaultError::storage)?;
        let mut writer = BufWriter::new(file);

        for entry in entries {
            let line = serde_json::to_string(entry).map_err(|e| ChatvaultError::Storage {
                source: Box::new(e),
            })?;
            writeln!(writer, "{line}").map_err(ChatvaultError::storage)?;
        }

        let file = writer
            .into_inner()
            .map_err(|e| ChatvaultError::storage(e.into_error()))?;
        file.sync_all().map_err(ChatvaultError::storage)?;
        Ok(())
    }

    /// Read the full log for a chat, skipping unparseable lines.
    ///
    /// A missing log is an empty history, not an error.
    pub fn read_all(&self, chat: ChatId) -> Result<Vec<HistoryEntry>, ChatvaultError> {
        let path = self.log_path(chat);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&path).map_err(ChatvaultError::storage)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(ChatvaultError::storage)?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(trimmed) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        line = line_no + 1,
                        error = %err,
                        "skipping unparseable history line"
                    );
                }
            }
        }
        Ok(entries)
    }

    /// Archive ids of every chat that has a log file on disk.
    pub fn list_archive_ids(&self) -> Vec<u64> {
        let Ok(dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut ids: Vec<u64> = dir
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.strip_prefix("chat_")?
                    .strip_suffix(".jsonl")?
                    .parse()
                    .ok()
            })
            .collect();
        ids.sort_unstable();
        ids
    }
}
