// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The durable history entry: one JSONL line per archived message.

use std::collections::HashMap;
use std::path::PathBuf;

use chatvault_core::types::{MediaKind, MessageDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One archived message, merged from the message descriptor and the
/// download index snapshot. Appended exactly once, never mutated;
/// corrections require a new entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_kind: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_size: Option<u64>,
    /// Absolute path of the downloaded artifact; `None` when the message
    /// has no media or the download has not succeeded (yet).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
}

impl HistoryEntry {
    /// Build the entry for one message, resolving its artifact path from the
    /// chat's download index snapshot.
    pub fn from_message(
        msg: &MessageDescriptor,
        chat_title: Option<&str>,
        downloads: &HashMap<i64, PathBuf>,
    ) -> Self {
        let media = msg.media.as_ref();
        Self {
            id: msg.id,
            timestamp: msg.timestamp,
            text: msg.text.clone(),
            sender_id: msg.sender_id,
            reply_to: msg.reply_to,
            media_kind: media.map(|m| m.kind),
            media_file_name: media.and_then(|m| m.file_name.clone()),
            media_size: media.and_then(|m| m.size),
            artifact_path: downloads.get(&msg.id).cloned(),
            chat_title: chat_title.map(|t| t.to_string()),
        }
    }
}

/// Per-chat summary row for the global index document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: i64,
    pub title: String,
    pub message_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<DateTime<Utc>>,
}
