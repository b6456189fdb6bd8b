// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the HTTP message source API.
//!
//! Messages arrive without their chat id (it is in the URL path); the wire
//! type converts into the chat-qualified [`MessageDescriptor`].

use chatvault_core::types::{ChatId, MediaKind, MediaRef, MessageDescriptor};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /chats/{id}` response.
#[derive(Debug, Deserialize)]
pub struct WireChat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// `GET /chats/{id}/messages` response envelope.
#[derive(Debug, Deserialize)]
pub struct WireMessagesPage {
    pub messages: Vec<WireMessage>,
}

/// One message on the wire.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sender_id: Option<i64>,
    #[serde(default)]
    pub reply_to: Option<i64>,
    #[serde(default)]
    pub media: Option<WireMedia>,
}

/// Media reference on the wire.
#[derive(Debug, Deserialize)]
pub struct WireMedia {
    pub kind: MediaKind,
    pub remote_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl WireMessage {
    /// Qualify the message with the chat it was fetched for.
    pub fn into_descriptor(self, chat: ChatId) -> MessageDescriptor {
        MessageDescriptor {
            id: self.id,
            chat_id: chat,
            timestamp: self.timestamp,
            text: self.text,
            sender_id: self.sender_id,
            reply_to: self.reply_to,
            media: self.media.map(|m| MediaRef {
                kind: m.kind,
                remote_id: m.remote_id,
                file_name: m.file_name,
                mime_type: m.mime_type,
                size: m.size,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_deserializes_with_optional_fields() {
        let json = r#"{
            "messages": [
                {"id": 1, "timestamp": "2025-03-01T09:00:00Z", "text": "hi", "sender_id": 7},
                {"id": 2, "timestamp": "2025-03-01T09:01:00Z",
                 "media": {"kind": "photo", "remote_id": "ph-2", "size": 1024}}
            ]
        }"#;
        let page: WireMessagesPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.messages[0].text.as_deref(), Some("hi"));
        let media = page.messages[1].media.as_ref().unwrap();
        assert_eq!(media.kind, MediaKind::Photo);
        assert_eq!(media.size, Some(1024));
    }

    #[test]
    fn descriptor_conversion_attaches_chat_id() {
        let wire = WireMessage {
            id: 9,
            timestamp: "2025-03-01T09:00:00Z".parse().unwrap(),
            text: None,
            sender_id: None,
            reply_to: Some(8),
            media: None,
        };
        let msg = wire.into_descriptor(ChatId(-55));
        assert_eq!(msg.chat_id, ChatId(-55));
        assert_eq!(msg.reply_to, Some(8));
    }

    #[test]
    fn chat_title_is_optional() {
        let chat: WireChat = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert!(chat.title.is_none());
    }
}
