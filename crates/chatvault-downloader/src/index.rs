// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-scoped download index.
//!
//! Maps [`MessageKey`] to the downloaded artifact path while a chat is in
//! flight. Entries live from task completion until the owning chat finishes
//! its processing pass, so memory is bounded by in-flight chats times batch
//! size, never by total history. Message ids are chat-local; the composite
//! key keeps two chats' id 5 from ever colliding.

use std::collections::HashMap;
use std::path::PathBuf;

use chatvault_core::types::{ChatId, MessageKey};
use dashmap::DashMap;

/// Concurrent mapping from message identity to downloaded artifact path.
#[derive(Default)]
pub struct DownloadIndex {
    entries: DashMap<MessageKey, PathBuf>,
}

impl DownloadIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed download. Safe to call from concurrent workers.
    pub fn record(&self, key: MessageKey, path: PathBuf) {
        self.entries.insert(key, path);
    }

    /// Artifact path for one message, if a download completed for it.
    pub fn lookup(&self, key: &MessageKey) -> Option<PathBuf> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// All entries belonging to `chat`, keyed by message id.
    ///
    /// Filters on the key's chat component explicitly; entries of other
    /// chats never leak into the result.
    pub fn snapshot(&self, chat: ChatId) -> HashMap<i64, PathBuf> {
        self.entries
            .iter()
            .filter(|entry| entry.key().chat_id == chat)
            .map(|entry| (entry.key().message_id, entry.value().clone()))
            .collect()
    }

    /// Drop every entry belonging to `chat`, returning how many were removed.
    ///
    /// Must only run after the chat's final batch is durably persisted.
    pub fn evict(&self, chat: ChatId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.chat_id != chat);
        before - self.entries.len()
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
    fn same_message_id_in_two_chats_does_not_collide() {
        let index = DownloadIndex::new();
        index.record(MessageKey::new(ChatId(1), 5), PathBuf::from("/a/path_a"));
        index.record(MessageKey::new(ChatId(2), 5), PathBuf::from("/b/path_b"));

        assert_eq!(
            index.lookup(&MessageKey::new(ChatId(1), 5)),
            Some(PathBuf::from("/a/path_a"))
        );
        assert_eq!(
            index.lookup(&MessageKey::new(ChatId(2), 5)),
            Some(PathBuf::from("/b/path_b"))
        );
    }

    #[test]
    fn snapshot_filters_to_requested_chat() {
        let index = DownloadIndex::new();
        index.record(MessageKey::new(ChatId(1), 1), PathBuf::from("/a/1"));
        index.record(MessageKey::new(ChatId(1), 2), PathBuf::from("/a/2"));
        index.record(MessageKey::new(ChatId(9), 1), PathBuf::from("/z/1"));

        let snap = index.snapshot(ChatId(1));
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[&1], PathBuf::from("/a/1"));
        assert_eq!(snap[&2], PathBuf::from("/a/2"));
        assert!(!snap.values().any(|p| p.starts_with("/z")));
    }

    #[test]
    fn evict_removes_every_and_only_chat_entries() {
        let index = DownloadIndex::new();
        for id in 0..4 {
            index.record(MessageKey::new(ChatId(1), id), PathBuf::from("/a"));
        }
        index.record(MessageKey::new(ChatId(2), 0), PathBuf::from("/b"));

        let before = index.len();
        let removed = index.evict(ChatId(1));
        assert_eq!(removed, 4);
        assert_eq!(index.len(), before - 4);
        assert!(index.lookup(&MessageKey::new(ChatId(2), 0)).is_some());
        assert!(index.snapshot(ChatId(1)).is_empty());
    }
}
