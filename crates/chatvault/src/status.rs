// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatvault status` command implementation.
//!
//! Reads the checkpoint file and prints per-chat resume state: status,
//! last processed id, pending-retry count. `--json` emits a structured
//! document for scripting.

use std::path::PathBuf;

use chatvault_checkpoint::CheckpointStore;
use chatvault_config::ChatvaultConfig;
use chatvault_core::ChatvaultError;
use serde::Serialize;

/// One row of `chatvault status --json` output.
#[derive(Debug, Serialize)]
pub struct ChatStatusRow {
    pub chat_id: i64,
    pub title: Option<String>,
    pub status: String,
    pub enabled: bool,
    pub last_processed_id: i64,
    pub pending_retry: usize,
}

/// Run the `chatvault status` command.
pub fn run_status(config: &ChatvaultConfig, json: bool) -> Result<(), ChatvaultError> {
    let path = PathBuf::from(&config.archive.base_directory).join("checkpoints.json");
    let store = CheckpointStore::load(path)?;

    let rows: Vec<ChatStatusRow> = store
        .checkpoints()
        .map(|c| ChatStatusRow {
            chat_id: c.chat_id,
            title: c.title.clone(),
            status: c.status.to_string(),
            enabled: c.enabled,
            last_processed_id: c.last_processed_id,
            pending_retry: c.pending_retry.len(),
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&rows).map_err(|e| {
            ChatvaultError::Internal(format!("status serialization failed: {e}"))
        })?;
        println!("{out}");
        return Ok(());
    }

    if rows.is_empty() {
        println!("no chats archived yet");
        return Ok(());
    }

    println!(
        "{:<14} {:<24} {:<12} {:>8} {:>14} {:>8}",
        "CHAT", "TITLE", "STATUS", "ENABLED", "LAST MESSAGE", "RETRY"
    );
    for row in rows {
        println!(
            "{:<14} {:<24} {:<12} {:>8} {:>14} {:>8}",
            row.chat_id,
            row.title.as_deref().unwrap_or("-"),
            row.status,
            if row.enabled { "yes" } else { "no" },
            row.last_processed_id,
            row.pending_retry,
        );
    }
    Ok(())
}
