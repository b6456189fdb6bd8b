// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress feed for the Chatvault archiver.
//!
//! Exposes run, chat, and per-download progress as a serializable snapshot
//! pushed on a `tokio::sync::watch` channel. The feed is updated at least
//! once per persisted batch and once per download-task completion; the
//! dashboard (or any other consumer) lives outside this workspace.

pub mod feed;
pub mod state;

pub use feed::{DownloadHandle, ProgressFeed};
pub use state::{ChatPhase, ChatProgress, DownloadProgress, OverallProgress, ProgressState};
