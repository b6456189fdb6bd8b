// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History persistence for the Chatvault archiver.
//!
//! Two tiers: an append-only JSONL log per chat (the source of truth) and
//! presentation documents regenerated wholesale from the log after every
//! batch, replaced atomically so readers never see a half-written file.

pub mod atomic;
pub mod engine;
pub mod entry;
pub mod log;
pub mod manifest;
pub mod render;

pub use engine::HistoryEngine;
pub use entry::{ChatSummary, HistoryEntry};
pub use log::HistoryLog;
pub use render::{HistoryRenderer, HtmlRenderer, TextRenderer, renderer_for};
