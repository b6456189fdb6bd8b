// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serializable progress snapshot types.
//!
//! The snapshot is the wire contract consumed by external dashboards; it is
//! pushed on a watch channel after every mutation and can also be polled.

use std::collections::BTreeMap;

use serde::Serialize;

/// Phase of a chat within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatPhase {
    Pending,
    Downloading,
    Completed,
    Paused,
}

/// Run-wide totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverallProgress {
    /// Chats scheduled for this run.
    pub total_chats: usize,
    /// Chats that reached a terminal phase (completed or paused).
    pub finished_chats: usize,
    /// Free-form run status line ("idle", "running", "done").
    pub status: String,
}

/// Per-chat progress counters.
#[derive(Debug, Clone, Serialize)]
pub struct ChatProgress {
    pub title: String,
    pub phase: ChatPhase,
    /// Messages appended to the durable log this run.
    pub messages_archived: u64,
    /// Media downloads completed this run.
    pub media_downloaded: u64,
    /// Message ids currently pending retry.
    pub pending_retry: usize,
}

/// Byte progress of one in-flight media download.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadProgress {
    pub description: String,
    pub transferred: u64,
    pub total: Option<u64>,
}

/// The full feed snapshot: overall totals, per-chat status, and in-flight
/// download byte progress.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressState {
    pub overall: OverallProgress,
    pub chats: BTreeMap<i64, ChatProgress>,
    pub downloads: BTreeMap<String, DownloadProgress>,
}
