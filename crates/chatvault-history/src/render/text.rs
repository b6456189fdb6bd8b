// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text presentation: one line per message, grep-friendly.

use std::fmt::Write;

use crate::entry::{ChatSummary, HistoryEntry};
use crate::render::{HistoryRenderer, format_size};

/// Text renderer for terminal-first archives.
pub struct TextRenderer;

impl HistoryRenderer for TextRenderer {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn render_chat(&self, title: &str, entries: &[HistoryEntry]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{title} — {} messages", entries.len());
        let _ = writeln!(out, "{}", "=".repeat(title.chars().count() + 14));

        for entry in entries {
            let date = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
            let text = entry.text.as_deref().unwrap_or("[no text]");
            let _ = write!(out, "[{date}] ID:{} {text}", entry.id);

            if let Some(kind) = entry.media_kind {
                let _ = write!(out, " [media: {kind}");
                if let Some(name) = &entry.media_file_name {
                    let _ = write!(out, ", file: {name}");
                }
                if let Some(size) = entry.media_size {
                    let _ = write!(out, ", {}", format_size(size));
                }
                let _ = write!(out, "]");
            }
            let _ = writeln!(out);

            match (&entry.artifact_path, entry.media_kind) {
                (Some(path), _) => {
                    let _ = writeln!(out, "  saved: {}", path.display());
                }
                (None, Some(_)) => {
                    let _ = writeln!(out, "  saved: (not downloaded)");
                }
                (None, None) => {}
            }
        }
        out
    }

    fn render_index(&self, chats: &[ChatSummary]) -> String {
        let mut ordered: Vec<&ChatSummary> = chats.iter().collect();
        ordered.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(a.chat_id.cmp(&b.chat_id))
        });

        let mut out = String::new();
        let _ = writeln!(out, "Chatvault Archive — {} chats", chats.len());
        let _ = writeln!(out, "{}", "=".repeat(32));
        for chat in ordered {
            let date = chat
                .last_message_at
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let _ = writeln!(
                out,
                "{}  ({} messages, last {date})  -> chat_{}.txt",
                chat.title,
                chat.message_count,
                chat.chat_id.unsigned_abs(),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn one_line_per_message_with_media_details() {
        let entries = vec![
            HistoryEntry {
                id: 1,
                timestamp: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
                text: Some("hello".into()),
                sender_id: None,
                reply_to: None,
                media_kind: None,
                media_file_name: None,
                media_size: None,
                artifact_path: None,
                chat_title: None,
            },
            HistoryEntry {
                id: 2,
                timestamp: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 1, 0).unwrap(),
                text: None,
                sender_id: None,
                reply_to: None,
                media_kind: Some(chatvault_core::types::MediaKind::Document),
                media_file_name: Some("notes.txt".into()),
                media_size: Some(2048),
                artifact_path: Some(PathBuf::from("/d/document/notes.txt")),
                chat_title: None,
            },
        ];
        let text = TextRenderer.render_chat("Chat", &entries);
        assert!(text.contains("ID:1 hello"));
        assert!(text.contains("[media: document, file: notes.txt, 2.0 KB]"));
        assert!(text.contains("saved: /d/document/notes.txt"));
        assert_eq!(TextRenderer.render_chat("Chat", &entries), text);
    }

    #[test]
    fn undownloaded_media_is_marked() {
        let entries = vec![HistoryEntry {
            id: 9,
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            text: None,
            sender_id: None,
            reply_to: None,
            media_kind: Some(chatvault_core::types::MediaKind::Photo),
            media_file_name: None,
            media_size: None,
            artifact_path: None,
            chat_title: None,
        }];
        let text = TextRenderer.render_chat("Chat", &entries);
        assert!(text.contains("(not downloaded)"));
    }
}
