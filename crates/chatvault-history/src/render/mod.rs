// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presentation rendering seam.
//!
//! The durable JSONL log is the source of truth; renderers derive a
//! human-browsable document from it and are free to be replaced (e.g. by an
//! incremental renderer) without touching the scheduler or checkpoint
//! logic. Rendering must be a pure function of its inputs: regenerating
//! from an unchanged log yields byte-identical output.

pub mod html;
pub mod text;

use crate::entry::{ChatSummary, HistoryEntry};

pub use html::HtmlRenderer;
pub use text::TextRenderer;

/// Renders chat and index documents from the durable log.
pub trait HistoryRenderer: Send + Sync {
    /// File extension of the rendered documents (without dot).
    fn extension(&self) -> &'static str;

    /// Render one chat's full history.
    fn render_chat(&self, title: &str, entries: &[HistoryEntry]) -> String;

    /// Render the global index over all known chats.
    fn render_index(&self, chats: &[ChatSummary]) -> String;
}

/// Renderer for a validated `archive.format` value.
pub fn renderer_for(format: &str) -> Box<dyn HistoryRenderer> {
    match format {
        "text" => Box::new(TextRenderer),
        _ => Box::new(HtmlRenderer),
    }
}

/// Human-readable file size, binary units.
pub(crate) fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else if bytes < GIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_sensible_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn renderer_factory_matches_format() {
        assert_eq!(renderer_for("html").extension(), "html");
        assert_eq!(renderer_for("text").extension(), "txt");
    }
}
