// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Chatvault crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a chat on the remote messaging source.
///
/// Group and channel identifiers may be negative (platform convention);
/// [`ChatId::archive_id`] strips the sign for use in file names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChatId(pub i64);

impl ChatId {
    /// Sign-free form of the identifier used in archive file names.
    pub fn archive_id(&self) -> u64 {
        self.0.unsigned_abs()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key identifying one message within one chat.
///
/// Message identifiers are only unique within their chat, so every mapping
/// keyed by message must carry the chat component. Keying by the bare
/// message id is unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageKey {
    pub chat_id: ChatId,
    pub message_id: i64,
}

impl MessageKey {
    pub fn new(chat_id: ChatId, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Kind of media attached to a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    VideoNote,
    Audio,
    Voice,
    Document,
}

impl MediaKind {
    /// All kinds, in the order used when config enables `all`.
    pub const ALL: [MediaKind; 6] = [
        MediaKind::Photo,
        MediaKind::Video,
        MediaKind::VideoNote,
        MediaKind::Audio,
        MediaKind::Voice,
        MediaKind::Document,
    ];
}

/// Reference to a downloadable media object attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Kind of the media object.
    pub kind: MediaKind,
    /// Opaque identifier understood by the message source.
    pub remote_id: String,
    /// Original file name, when the source knows one.
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type reported by the source.
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes, when known up front.
    #[serde(default)]
    pub size: Option<u64>,
}

impl MediaRef {
    /// File format derived from the MIME subtype (e.g. `video/mp4` -> `mp4`).
    /// Photos without a MIME type default to `jpg`.
    pub fn file_format(&self) -> Option<String> {
        if let Some(mime) = &self.mime_type {
            return mime.rsplit('/').next().map(|s| s.to_string());
        }
        if self.kind == MediaKind::Photo {
            return Some("jpg".to_string());
        }
        None
    }
}

/// A single message as received from the message source.
///
/// Immutable once received; the identifier is unique only within `chat_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub id: i64,
    pub chat_id: ChatId,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default)]
    pub reply_to: Option<i64>,
    #[serde(default)]
    pub media: Option<MediaRef>,
}

impl MessageDescriptor {
    /// Composite key of this message.
    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.chat_id, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn archive_id_strips_sign() {
        assert_eq!(ChatId(-1001234).archive_id(), 1001234);
        assert_eq!(ChatId(42).archive_id(), 42);
    }

    #[test]
    fn message_keys_differ_across_chats() {
        let a = MessageKey::new(ChatId(1), 5);
        let b = MessageKey::new(ChatId(2), 5);
        assert_ne!(a, b);
        assert_eq!(a, MessageKey::new(ChatId(1), 5));
    }

    #[test]
    fn media_kind_display_and_parse() {
        assert_eq!(MediaKind::VideoNote.to_string(), "video_note");
        assert_eq!(
            MediaKind::from_str("video_note").unwrap(),
            MediaKind::VideoNote
        );
        for kind in MediaKind::ALL {
            let parsed = MediaKind::from_str(&kind.to_string()).unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn media_kind_serde_snake_case() {
        let json = serde_json::to_string(&MediaKind::VideoNote).unwrap();
        assert_eq!(json, "\"video_note\"");
        let parsed: MediaKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MediaKind::VideoNote);
    }

    #[test]
    fn file_format_from_mime() {
        let media = MediaRef {
            kind: MediaKind::Video,
            remote_id: "abc".into(),
            file_name: None,
            mime_type: Some("video/mp4".into()),
            size: None,
        };
        assert_eq!(media.file_format().as_deref(), Some("mp4"));
    }

    #[test]
    fn photo_defaults_to_jpg() {
        let media = MediaRef {
            kind: MediaKind::Photo,
            remote_id: "abc".into(),
            file_name: None,
            mime_type: None,
            size: None,
        };
        assert_eq!(media.file_format().as_deref(), Some("jpg"));
    }

    #[test]
    fn descriptor_round_trips_through_json() {
        let msg = MessageDescriptor {
            id: 7,
            chat_id: ChatId(-100),
            timestamp: Utc::now(),
            text: Some("hello".into()),
            sender_id: Some(12345),
            reply_to: None,
            media: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: MessageDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, parsed);
    }
}
