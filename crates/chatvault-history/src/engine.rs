// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The history persistence engine.
//!
//! Per batch: append entries to the chat's durable log, regenerate that
//! chat's presentation document from the *entire* log, refresh the index
//! manifest, and regenerate the global index document. Regeneration cost is
//! O(log size) per batch by design; the batch size config trades that cost
//! against data at risk in an unflushed batch.
//!
//! Document writes go through temp-file-then-rename and are retried once;
//! a failure after the retry surfaces as a chat-level storage error with
//! the previous document left intact.

use std::collections::HashMap;
use std::path::PathBuf;

use chatvault_core::ChatvaultError;
use chatvault_core::types::{ChatId, MessageDescriptor};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::atomic::write_atomic;
use crate::entry::{ChatSummary, HistoryEntry};
use crate::log::HistoryLog;
use crate::manifest::IndexManifest;
use crate::render::HistoryRenderer;

/// Two-tier persistence: append-only log plus regenerated presentation.
pub struct HistoryEngine {
    history_dir: PathBuf,
    log: HistoryLog,
    renderer: Box<dyn HistoryRenderer>,
    manifest: IndexManifest,
}

impl HistoryEngine {
    pub fn new(history_dir: PathBuf, renderer: Box<dyn HistoryRenderer>) -> Self {
        let log = HistoryLog::new(history_dir.clone());
        let manifest = IndexManifest::load(history_dir.join("index.json"));
        Self {
            history_dir,
            log,
            renderer,
            manifest,
        }
    }

    /// Read access to the durable log (used by resume checks and tests).
    pub fn log(&self) -> &HistoryLog {
        &self.log
    }

    /// Persist one fully-resolved batch for a chat.
    ///
    /// Appends to the log first; the checkpoint must only advance after this
    /// returns. `downloads` is the download index snapshot for this chat.
    ///
    /// Entries are append-only: a message id already in the log is skipped,
    /// unless this batch brings an artifact the logged entry lacks (a retry
    /// that finally succeeded) — that appends a correction entry, never an
    /// edit. Presentation collapses corrections to the newest entry per id.
    pub fn save_batch(
        &mut self,
        chat: ChatId,
        title: Option<&str>,
        messages: &[MessageDescriptor],
        downloads: &HashMap<i64, PathBuf>,
    ) -> Result<(), ChatvaultError> {
        if messages.is_empty() {
            return Ok(());
        }

        let logged: HashMap<i64, bool> = self
            .log
            .read_all(chat)?
            .into_iter()
            .map(|e| (e.id, e.artifact_path.is_some()))
            .collect();

        let entries: Vec<HistoryEntry> = messages
            .iter()
            .filter(|msg| match logged.get(&msg.id) {
                None => true,
                Some(has_artifact) => !has_artifact && downloads.contains_key(&msg.id),
            })
            .map(|msg| HistoryEntry::from_message(msg, title, downloads))
            .collect();

        if entries.is_empty() {
            debug!(chat = %chat, "batch already fully logged, refreshing documents only");
        } else {
            self.log.append_batch(chat, &entries)?;
            counter!("chatvault_entries_appended_total").increment(entries.len() as u64);
            debug!(chat = %chat, entries = entries.len(), "batch appended to log");
        }
        counter!("chatvault_batches_persisted_total").increment(1);

        self.regenerate_chat(chat, title)?;
        self.refresh_manifest(chat, title)?;
        self.regenerate_index()?;
        Ok(())
    }

    /// Regenerate every presentation document from the logs on disk.
    ///
    /// Used by the `rebuild` command after manual log surgery or a renderer
    /// change; fetches nothing.
    pub fn rebuild(&mut self) -> Result<(), ChatvaultError> {
        let archive_ids = self.log.list_archive_ids();
        info!(chats = archive_ids.len(), "rebuilding presentation from logs");
        for archive_id in archive_ids {
            let chat = ChatId(archive_id as i64);
            self.regenerate_chat(chat, None)?;
            self.refresh_manifest(chat, None)?;
        }
        self.regenerate_index()
    }

    fn chat_document_path(&self, chat: ChatId) -> PathBuf {
        self.history_dir.join(format!(
            "chat_{}.{}",
            chat.archive_id(),
            self.renderer.extension()
        ))
    }

    /// The log with correction entries collapsed: newest entry per id wins,
    /// ordered by message id.
    fn effective_entries(&self, chat: ChatId) -> Result<Vec<HistoryEntry>, ChatvaultError> {
        let mut by_id: std::collections::BTreeMap<i64, HistoryEntry> =
            std::collections::BTreeMap::new();
        for entry in self.log.read_all(chat)? {
            by_id.insert(entry.id, entry);
        }
        Ok(by_id.into_values().collect())
    }

    fn regenerate_chat(&self, chat: ChatId, title: Option<&str>) -> Result<(), ChatvaultError> {
        let entries = self.effective_entries(chat)?;
        let title = resolve_title(chat, title, &entries);
        let document = self.renderer.render_chat(&title, &entries);
        let path = self.chat_document_path(chat);
        retry_once(|| write_atomic(&path, &document))
    }

    fn refresh_manifest(&mut self, chat: ChatId, title: Option<&str>) -> Result<(), ChatvaultError> {
        let entries = self.effective_entries(chat)?;
        let summary = ChatSummary {
            chat_id: chat.0,
            title: resolve_title(chat, title, &entries),
            message_count: entries.len() as u64,
            last_message_at: entries.iter().map(|e| e.timestamp).max(),
        };
        self.manifest.upsert(summary);

        // Fold in logs from earlier runs that predate the manifest.
        for archive_id in self.log.list_archive_ids() {
            if self.manifest.contains_archive_id(archive_id) {
                continue;
            }
            let found = ChatId(archive_id as i64);
            let entries = self.effective_entries(found)?;
            self.manifest.upsert(ChatSummary {
                chat_id: found.0,
                title: resolve_title(found, None, &entries),
                message_count: entries.len() as u64,
                last_message_at: entries.iter().map(|e| e.timestamp).max(),
            });
        }

        self.manifest.save()
    }

    fn regenerate_index(&self) -> Result<(), ChatvaultError> {
        let document = self.renderer.render_index(&self.manifest.summaries());
        let path = self
            .history_dir
            .join(format!("index.{}", self.renderer.extension()));
        retry_once(|| write_atomic(&path, &document))
    }
}

/// Title precedence: caller-provided, then the newest logged title, then a
/// placeholder from the archive id.
fn resolve_title(chat: ChatId, provided: Option<&str>, entries: &[HistoryEntry]) -> String {
    if let Some(title) = provided
        && !title.trim().is_empty()
    {
        return title.to_string();
    }
    entries
        .iter()
        .rev()
        .find_map(|e| e.chat_title.clone())
        .unwrap_or_else(|| format!("Chat {}", chat.archive_id()))
}

/// Run a document write, retrying once before surfacing the error.
fn retry_once(
    mut op: impl FnMut() -> Result<(), ChatvaultError>,
) -> Result<(), ChatvaultError> {
    if let Err(first) = op() {
        warn!(error = %first, "document write failed, retrying once");
        return op();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::renderer_for;
    use chatvault_core::types::MediaKind;
    use chatvault_test_utils::{media_message, text_message};

    fn engine_in(dir: &std::path::Path, format: &str) -> HistoryEngine {
        HistoryEngine::new(dir.to_path_buf(), renderer_for(format))
    }

    #[test]
    fn save_batch_appends_log_and_writes_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);
        let messages = vec![
            text_message(chat, 1, "one"),
            text_message(chat, 2, "two"),
            text_message(chat, 3, "three"),
        ];

        engine
            .save_batch(chat, Some("Test Chat"), &messages, &HashMap::new())
            .unwrap();

        assert_eq!(engine.log().read_all(chat).unwrap().len(), 3);
        let html = std::fs::read_to_string(dir.path().join("chat_10.html")).unwrap();
        assert_eq!(html.matches("class=\"bubble\"").count(), 3);
        assert!(dir.path().join("index.html").exists());
        assert!(dir.path().join("index.json").exists());
    }

    #[test]
    fn regeneration_without_new_entries_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);
        engine
            .save_batch(
                chat,
                Some("Chat"),
                &[text_message(chat, 1, "a")],
                &HashMap::new(),
            )
            .unwrap();

        let path = dir.path().join("chat_10.html");
        let first = std::fs::read_to_string(&path).unwrap();
        engine.regenerate_chat(chat, Some("Chat")).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn presentation_reflects_full_history_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);

        engine
            .save_batch(chat, Some("Chat"), &[text_message(chat, 1, "a")], &HashMap::new())
            .unwrap();
        engine
            .save_batch(
                chat,
                Some("Chat"),
                &[text_message(chat, 2, "b"), text_message(chat, 3, "c")],
                &HashMap::new(),
            )
            .unwrap();

        let html = std::fs::read_to_string(dir.path().join("chat_10.html")).unwrap();
        assert_eq!(html.matches("class=\"bubble\"").count(), 3);
        assert!(html.contains("3 messages"));
    }

    #[test]
    fn failed_download_renders_null_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);
        let messages = vec![
            text_message(chat, 1, "before"),
            media_message(chat, 2, MediaKind::Photo, "r2", "lost.jpg"),
            text_message(chat, 3, "after"),
        ];

        // Message 2's download failed: no snapshot entry for it.
        engine
            .save_batch(chat, Some("Chat"), &messages, &HashMap::new())
            .unwrap();

        let html = std::fs::read_to_string(dir.path().join("chat_10.html")).unwrap();
        assert_eq!(html.matches("class=\"bubble\"").count(), 3);
        assert!(html.contains("not downloaded"));
    }

    #[test]
    fn index_covers_chats_from_previous_runs() {
        let dir = tempfile::tempdir().unwrap();
        let chat_a = ChatId(1);
        let chat_b = ChatId(2);

        {
            let mut engine = engine_in(dir.path(), "html");
            engine
                .save_batch(chat_a, Some("First"), &[text_message(chat_a, 1, "a")], &HashMap::new())
                .unwrap();
        }
        // A new engine (fresh process) archiving another chat still lists both.
        let mut engine = engine_in(dir.path(), "html");
        engine
            .save_batch(chat_b, Some("Second"), &[text_message(chat_b, 1, "b")], &HashMap::new())
            .unwrap();

        let index = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(index.contains("First"));
        assert!(index.contains("Second"));
    }

    #[test]
    fn rebuild_regenerates_documents_from_logs_alone() {
        let dir = tempfile::tempdir().unwrap();
        let chat = ChatId(10);
        {
            let mut engine = engine_in(dir.path(), "html");
            engine
                .save_batch(chat, Some("Chat"), &[text_message(chat, 1, "a")], &HashMap::new())
                .unwrap();
        }
        std::fs::remove_file(dir.path().join("chat_10.html")).unwrap();
        std::fs::remove_file(dir.path().join("index.html")).unwrap();

        let mut engine = engine_in(dir.path(), "html");
        engine.rebuild().unwrap();
        assert!(dir.path().join("chat_10.html").exists());
        assert!(dir.path().join("index.html").exists());
    }

    #[test]
    fn replaying_a_logged_batch_appends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);
        let messages = vec![text_message(chat, 1, "a"), text_message(chat, 2, "b")];

        engine.save_batch(chat, Some("Chat"), &messages, &HashMap::new()).unwrap();
        engine.save_batch(chat, Some("Chat"), &messages, &HashMap::new()).unwrap();

        assert_eq!(engine.log().read_all(chat).unwrap().len(), 2);
    }

    #[test]
    fn successful_retry_appends_a_correction_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "html");
        let chat = ChatId(10);
        let msg = media_message(chat, 2, MediaKind::Photo, "r2", "pic.jpg");

        // First pass: download failed, artifact null.
        engine.save_batch(chat, Some("Chat"), &[msg.clone()], &HashMap::new()).unwrap();

        // Retry pass: the artifact arrived.
        let mut downloads = HashMap::new();
        downloads.insert(2, std::path::PathBuf::from("/data/photo/pic.jpg"));
        engine.save_batch(chat, Some("Chat"), &[msg], &downloads).unwrap();

        // Log keeps both entries; presentation shows one item with the artifact.
        let raw = engine.log().read_all(chat).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw[0].artifact_path.is_none());
        assert!(raw[1].artifact_path.is_some());

        let html = std::fs::read_to_string(dir.path().join("chat_10.html")).unwrap();
        assert_eq!(html.matches("class=\"bubble\"").count(), 1);
        assert!(html.contains("file:///data/photo/pic.jpg"));
        assert!(!html.contains("not downloaded"));
    }

    #[test]
    fn text_format_writes_txt_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "text");
        let chat = ChatId(10);
        engine
            .save_batch(chat, Some("Chat"), &[text_message(chat, 1, "hello")], &HashMap::new())
            .unwrap();

        let text = std::fs::read_to_string(dir.path().join("chat_10.txt")).unwrap();
        assert!(text.contains("ID:1 hello"));
        assert!(dir.path().join("index.txt").exists());
        // The JSONL log is written regardless of presentation format.
        assert!(dir.path().join("chat_10.jsonl").exists());
    }
}
