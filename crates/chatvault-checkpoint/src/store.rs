// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The checkpoint store: all chats' resume state in one JSON file.
//!
//! Every mutation persists synchronously (temp file + rename) before
//! returning, so a crash immediately after a batch loses at most that one
//! in-flight batch. A checkpoint that cannot be persisted is a hard error:
//! continuing to fetch batches past an unsaved checkpoint would re-download
//! and re-append them after a restart.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chatvault_core::ChatvaultError;
use chatvault_core::types::ChatId;
use tracing::{debug, info};

use crate::state::{ChatCheckpoint, ChatStatus};

/// Owner of `checkpoints.json`. One instance per run, used only from the
/// coordinating task.
pub struct CheckpointStore {
    path: PathBuf,
    chats: BTreeMap<i64, ChatCheckpoint>,
}

impl CheckpointStore {
    /// Load the store, treating a missing file as an empty archive.
    ///
    /// A present-but-unreadable file is an error rather than an empty
    /// store: silently restarting every chat from id 0 would duplicate the
    /// whole archive.
    pub fn load(path: PathBuf) -> Result<Self, ChatvaultError> {
        let chats = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ChatvaultError::Checkpoint {
                message: format!("unreadable checkpoint file {}", path.display()),
                source: Some(Box::new(e)),
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(ChatvaultError::Checkpoint {
                    message: format!("cannot read checkpoint file {}", path.display()),
                    source: Some(Box::new(err)),
                });
            }
        };
        Ok(Self { path, chats })
    }

    /// Seed a chat from configuration, keeping any existing progress.
    pub fn ensure_chat(
        &mut self,
        chat: ChatId,
        title: Option<&str>,
        enabled: bool,
    ) -> Result<(), ChatvaultError> {
        let entry = self
            .chats
            .entry(chat.0)
            .or_insert_with(|| ChatCheckpoint::new(chat.0));
        if let Some(title) = title
            && !title.trim().is_empty()
        {
            entry.title = Some(title.to_string());
        }
        entry.enabled = enabled;
        self.persist()
    }

    /// Record the title learned from the source on first contact.
    pub fn set_title(&mut self, chat: ChatId, title: &str) -> Result<(), ChatvaultError> {
        let entry = self
            .chats
            .entry(chat.0)
            .or_insert_with(|| ChatCheckpoint::new(chat.0));
        entry.title = Some(title.to_string());
        self.persist()
    }

    /// Transition a chat to `InProgress` at the start of its pass.
    pub fn begin(&mut self, chat: ChatId) -> Result<(), ChatvaultError> {
        self.set_status(chat, ChatStatus::InProgress)
    }

    /// Terminal transition after a clean pass.
    pub fn complete(&mut self, chat: ChatId) -> Result<(), ChatvaultError> {
        self.set_status(chat, ChatStatus::Completed)
    }

    /// Terminal transition after a chat-level failure or cancellation.
    pub fn pause(&mut self, chat: ChatId) -> Result<(), ChatvaultError> {
        self.set_status(chat, ChatStatus::Paused)
    }

    fn set_status(&mut self, chat: ChatId, status: ChatStatus) -> Result<(), ChatvaultError> {
        let entry = self
            .chats
            .entry(chat.0)
            .or_insert_with(|| ChatCheckpoint::new(chat.0));
        debug!(chat = %chat, from = %entry.status, to = %status, "chat status transition");
        entry.status = status;
        self.persist()
    }

    /// Merge one batch's outcome and persist before returning.
    ///
    /// `attempted` are all message ids the batch resolved (success or
    /// failure): resolved ids leave the pending-retry set, `failed` ids
    /// (re-)enter it. The checkpoint advances with `max`, so a batch
    /// delivered out of order can never regress it.
    pub fn record_batch_result(
        &mut self,
        chat: ChatId,
        max_processed_id: i64,
        attempted: &[i64],
        failed: &[i64],
    ) -> Result<(), ChatvaultError> {
        let entry = self
            .chats
            .entry(chat.0)
            .or_insert_with(|| ChatCheckpoint::new(chat.0));

        for id in attempted {
            entry.pending_retry.remove(id);
        }
        entry.pending_retry.extend(failed.iter().copied());
        entry.last_processed_id = entry.last_processed_id.max(max_processed_id);

        info!(
            chat = %chat,
            last_processed_id = entry.last_processed_id,
            pending_retry = entry.pending_retry.len(),
            "checkpoint advanced"
        );
        self.persist()
    }

    /// Resumption starts strictly after this id.
    pub fn resume_position(&self, chat: ChatId) -> i64 {
        self.chats
            .get(&chat.0)
            .map(|c| c.last_processed_id)
            .unwrap_or(0)
    }

    /// Ids queued for retry ahead of fresh pagination.
    pub fn pending_retry(&self, chat: ChatId) -> Vec<i64> {
        self.chats
            .get(&chat.0)
            .map(|c| c.pending_retry.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, chat: ChatId) -> Option<&ChatCheckpoint> {
        self.chats.get(&chat.0)
    }

    /// All checkpoints, for the status report.
    pub fn checkpoints(&self) -> impl Iterator<Item = &ChatCheckpoint> {
        self.chats.values()
    }

    fn persist(&self) -> Result<(), ChatvaultError> {
        let raw = serde_json::to_string_pretty(&self.chats).map_err(|e| {
            ChatvaultError::Checkpoint {
                message: "checkpoint serialization failed".to_string(),
                source: Some(Box::new(e)),
            }
        })?;

        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let io_err = |e: std::io::Error| ChatvaultError::Checkpoint {
            message: format!("cannot persist checkpoint to {}", self.path.display()),
            source: Some(Box::new(e)),
        };

        std::fs::create_dir_all(parent).map_err(io_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(raw.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
