// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat checkpoint state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Processing state of a chat. `Idle -> InProgress -> {Completed, Paused}`;
/// a paused chat goes back through `InProgress` on the next run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Idle,
    InProgress,
    Completed,
    Paused,
}

/// Durable resume state for one chat.
///
/// `last_processed_id` only ever advances, and only after the corresponding
/// history entries are on disk. The pending-retry set has no cap and no
/// dead-lettering: an id stays until a download succeeds or an operator
/// intervenes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCheckpoint {
    pub chat_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub last_processed_id: i64,
    #[serde(default)]
    pub pending_retry: BTreeSet<i64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_status")]
    pub status: ChatStatus,
}

impl ChatCheckpoint {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            title: None,
            last_processed_id: 0,
            pending_retry: BTreeSet::new(),
            enabled: true,
            status: ChatStatus::Idle,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_status() -> ChatStatus {
    ChatStatus::Idle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ChatStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let checkpoint: ChatCheckpoint = serde_json::from_str("{\"chat_id\": 5}").unwrap();
        assert_eq!(checkpoint.last_processed_id, 0);
        assert!(checkpoint.pending_retry.is_empty());
        assert!(checkpoint.enabled);
        assert_eq!(checkpoint.status, ChatStatus::Idle);
    }
}
