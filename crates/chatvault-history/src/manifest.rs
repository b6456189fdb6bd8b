// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index manifest: per-chat metadata carried across runs.
//!
//! The manifest lets the global index document cover chats archived in
//! earlier runs without rescanning every log on every batch. It is derived
//! data (each entry is recomputed from the chat's log when the chat is
//! touched) and may be deleted at any time; the logs remain authoritative.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chatvault_core::ChatvaultError;
use tracing::warn;

use crate::atomic::write_atomic;
use crate::entry::ChatSummary;

/// Persistent map of chat id to summary, stored as `index.json`.
pub struct IndexManifest {
    path: PathBuf,
    chats: BTreeMap<i64, ChatSummary>,
}

impl IndexManifest {
    /// Load the manifest, treating a missing or unreadable file as empty.
    pub fn load(path: PathBuf) -> Self {
        let chats = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<i64, ChatSummary>>(&raw) {
                Ok(chats) => chats,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring unreadable index manifest");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, chats }
    }

    /// Insert or replace a chat's summary.
    pub fn upsert(&mut self, summary: ChatSummary) {
        self.chats.insert(summary.chat_id, summary);
    }

    /// Whether any entry's id maps to this archive (sign-free) id.
    pub fn contains_archive_id(&self, archive_id: u64) -> bool {
        self.chats
            .keys()
            .any(|id| id.unsigned_abs() == archive_id)
    }

    /// All summaries, in key order.
    pub fn summaries(&self) -> Vec<ChatSummary> {
        self.chats.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Persist the manifest atomically.
    pub fn save(&self) -> Result<(), ChatvaultError> {
        let raw = serde_json::to_string_pretty(&self.chats).map_err(|e| {
            ChatvaultError::Storage {
                source: Box::new(e),
            }
        })?;
        write_atomic(&self.path, &raw)
    }
}
