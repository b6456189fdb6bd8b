// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The progress feed: shared mutable snapshot plus a push channel.
//!
//! Download workers, the scheduler, and the run coordinator all write here;
//! consumers either poll [`ProgressFeed::snapshot`] or subscribe to the
//! watch channel. Transport beyond the channel is an external concern.

use std::sync::{Arc, Mutex};

use chatvault_core::types::ChatId;
use chatvault_core::ProgressObserver;
use tokio::sync::watch;

use crate::state::{ChatPhase, ChatProgress, DownloadProgress, ProgressState};

/// Shared progress feed. Cheap to clone behind an [`Arc`]; every mutation
/// publishes a fresh snapshot on the watch channel.
pub struct ProgressFeed {
    state: Mutex<ProgressState>,
    tx: watch::Sender<ProgressState>,
}

impl Default for ProgressFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self {
            state: Mutex::new(ProgressState::default()),
            tx,
        }
    }

    /// Subscribe to snapshot pushes. The receiver always starts with the
    /// latest published state.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    /// Current snapshot (poll interface).
    pub fn snapshot(&self) -> ProgressState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProgressState> {
        // A poisoned lock only means a writer panicked mid-update; the
        // snapshot is still structurally valid, so recover it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn mutate(&self, f: impl FnOnce(&mut ProgressState)) {
        let snapshot = {
            let mut state = self.lock();
            f(&mut state);
            state.clone()
        };
        // Send fails only when no subscriber exists, which is fine.
        let _ = self.tx.send(snapshot);
    }

    /// Record the number of chats scheduled for this run.
    pub fn run_started(&self, total_chats: usize) {
        self.mutate(|s| {
            s.overall.total_chats = total_chats;
            s.overall.finished_chats = 0;
            s.overall.status = "running".to_string();
        });
    }

    /// Mark the run finished.
    pub fn run_finished(&self) {
        self.mutate(|s| {
            s.overall.status = "done".to_string();
            s.downloads.clear();
        });
    }

    /// Register a chat (or refresh its title) in the pending phase.
    pub fn chat_registered(&self, chat: ChatId, title: &str) {
        let title = title.to_string();
        self.mutate(move |s| {
            s.chats
                .entry(chat.0)
                .and_modify(|c| c.title = title.clone())
                .or_insert(ChatProgress {
                    title,
                    phase: ChatPhase::Pending,
                    messages_archived: 0,
                    media_downloaded: 0,
                    pending_retry: 0,
                });
        });
    }

    /// Move a chat into a new phase; terminal phases bump the finished count.
    pub fn chat_phase(&self, chat: ChatId, phase: ChatPhase) {
        self.mutate(move |s| {
            if let Some(entry) = s.chats.get_mut(&chat.0) {
                let was_terminal =
                    matches!(entry.phase, ChatPhase::Completed | ChatPhase::Paused);
                entry.phase = phase;
                let is_terminal = matches!(phase, ChatPhase::Completed | ChatPhase::Paused);
                if is_terminal && !was_terminal {
                    s.overall.finished_chats += 1;
                }
            }
        });
    }

    /// Record a persisted batch: messages archived and the current size of
    /// the pending-retry set.
    pub fn batch_persisted(&self, chat: ChatId, archived: u64, pending_retry: usize) {
        self.mutate(move |s| {
            if let Some(entry) = s.chats.get_mut(&chat.0) {
                entry.messages_archived += archived;
                entry.pending_retry = pending_retry;
            }
        });
    }

    /// Count one completed media download for a chat.
    pub fn media_downloaded(&self, chat: ChatId) {
        self.mutate(move |s| {
            if let Some(entry) = s.chats.get_mut(&chat.0) {
                entry.media_downloaded += 1;
            }
        });
    }
}

/// Byte-progress handle for one in-flight download.
///
/// Implements [`ProgressObserver`] so it can be handed straight to
/// `MessageSource::fetch_media`. Dropping the handle removes the feed entry.
pub struct DownloadHandle {
    feed: Arc<ProgressFeed>,
    id: String,
}

impl DownloadHandle {
    /// Begin tracking one in-flight download; the handle reports byte
    /// progress and removes the feed entry when dropped.
    pub fn begin(feed: Arc<ProgressFeed>, description: String, total: Option<u64>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let entry_id = id.clone();
        feed.mutate(move |s| {
            s.downloads.insert(
                entry_id,
                DownloadProgress {
                    description,
                    transferred: 0,
                    total,
                },
            );
        });
        Self { feed, id }
    }
}

impl ProgressObserver for DownloadHandle {
    fn on_bytes(&self, transferred: u64, total: Option<u64>) {
        let id = self.id.clone();
        self.feed.mutate(move |s| {
            if let Some(entry) = s.downloads.get_mut(&id) {
                entry.transferred = transferred;
                if total.is_some() {
                    entry.total = total;
                }
            }
        });
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        let id = self.id.clone();
        self.feed.mutate(move |s| {
            s.downloads.remove(&id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_lifecycle_updates_counts() {
        let feed = Arc::new(ProgressFeed::new());
        feed.run_started(2);
        feed.chat_registered(ChatId(1), "One");
        feed.chat_registered(ChatId(2), "Two");
        feed.chat_phase(ChatId(1), ChatPhase::Downloading);
        feed.chat_phase(ChatId(1), ChatPhase::Completed);

        let snap = feed.snapshot();
        assert_eq!(snap.overall.total_chats, 2);
        assert_eq!(snap.overall.finished_chats, 1);
        assert_eq!(snap.chats[&1].phase, ChatPhase::Completed);
        assert_eq!(snap.chats[&2].phase, ChatPhase::Pending);
    }

    #[test]
    fn terminal_phase_counted_once() {
        let feed = Arc::new(ProgressFeed::new());
        feed.run_started(1);
        feed.chat_registered(ChatId(1), "One");
        feed.chat_phase(ChatId(1), ChatPhase::Paused);
        feed.chat_phase(ChatId(1), ChatPhase::Completed);
        assert_eq!(feed.snapshot().overall.finished_chats, 1);
    }

    #[test]
    fn download_handle_reports_and_cleans_up() {
        let feed = Arc::new(ProgressFeed::new());
        let handle = DownloadHandle::begin(Arc::clone(&feed), "photo.jpg".to_string(), Some(100));
        handle.on_bytes(40, Some(100));

        let snap = feed.snapshot();
        assert_eq!(snap.downloads.len(), 1);
        let entry = snap.downloads.values().next().unwrap();
        assert_eq!(entry.transferred, 40);
        assert_eq!(entry.total, Some(100));

        drop(handle);
        assert!(feed.snapshot().downloads.is_empty());
    }

    #[tokio::test]
    async fn subscriber_sees_pushed_snapshots() {
        let feed = Arc::new(ProgressFeed::new());
        let mut rx = feed.subscribe();
        feed.run_started(3);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().overall.total_chats, 3);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let feed = Arc::new(ProgressFeed::new());
        feed.run_started(1);
        feed.chat_registered(ChatId(-100), "Group");
        let json = serde_json::to_string(&feed.snapshot()).unwrap();
        assert!(json.contains("\"total_chats\":1"));
        assert!(json.contains("Group"));
    }
}
