// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shorthand constructors for message descriptors in tests.

use chatvault_core::types::{ChatId, MediaKind, MediaRef, MessageDescriptor};
use chrono::{TimeZone, Utc};

/// A text-only message. Timestamps step one minute per id from a fixed base
/// so ordering assertions stay deterministic.
pub fn text_message(chat: ChatId, id: i64, text: &str) -> MessageDescriptor {
    MessageDescriptor {
        id,
        chat_id: chat,
        timestamp: base_time() + chrono::Duration::minutes(id),
        text: Some(text.to_string()),
        sender_id: Some(1000),
        reply_to: None,
        media: None,
    }
}

/// A message carrying a media reference with a known remote id.
pub fn media_message(
    chat: ChatId,
    id: i64,
    kind: MediaKind,
    remote_id: &str,
    file_name: &str,
) -> MessageDescriptor {
    MessageDescriptor {
        id,
        chat_id: chat,
        timestamp: base_time() + chrono::Duration::minutes(id),
        text: None,
        sender_id: Some(1000),
        reply_to: None,
        media: Some(MediaRef {
            kind,
            remote_id: remote_id.to_string(),
            file_name: Some(file_name.to_string()),
            mime_type: None,
            size: None,
        }),
    }
}

fn base_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid base time")
}
