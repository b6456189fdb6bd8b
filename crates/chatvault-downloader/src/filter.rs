// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media admission filter.
//!
//! Decides whether a message's media should be downloaded at all: media kind
//! enabled, sender allowed, timestamp inside the configured window, file
//! format allowed for its kind. Rejected messages still flow into the
//! history log; only the download is skipped.

use std::collections::HashSet;

use chatvault_config::ChatvaultConfig;
use chatvault_config::parse_filter_date;
use chatvault_core::types::{MediaKind, MediaRef, MessageDescriptor};
use chrono::{DateTime, Utc};

/// Compiled admission rules for download tasks.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    enabled_kinds: HashSet<MediaKind>,
    sender_ids: Vec<i64>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    audio_formats: Vec<String>,
    document_formats: Vec<String>,
    video_formats: Vec<String>,
}

impl MediaFilter {
    /// Build the filter from validated configuration.
    pub fn from_config(config: &ChatvaultConfig) -> Self {
        Self {
            enabled_kinds: config.download.enabled_kinds().into_iter().collect(),
            sender_ids: config.filter.sender_ids.clone(),
            start_date: config
                .filter
                .start_date
                .as_deref()
                .and_then(parse_filter_date),
            end_date: config.filter.end_date.as_deref().and_then(parse_filter_date),
            audio_formats: config.filter.formats.audio.clone(),
            document_formats: config.filter.formats.document.clone(),
            video_formats: config.filter.formats.video.clone(),
        }
    }

    /// Whether this message's media should be downloaded.
    pub fn admits(&self, msg: &MessageDescriptor, media: &MediaRef) -> bool {
        if !self.enabled_kinds.contains(&media.kind) {
            return false;
        }

        if !self.sender_ids.is_empty() {
            match msg.sender_id {
                Some(sender) if self.sender_ids.contains(&sender) => {}
                _ => return false,
            }
        }

        if let Some(start) = self.start_date
            && msg.timestamp < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && msg.timestamp > end
        {
            return false;
        }

        self.format_allowed(media)
    }

    /// Per-kind file format allow-list check. Kinds without a configured
    /// list (photo, voice, video note) always pass.
    fn format_allowed(&self, media: &MediaRef) -> bool {
        let allowed = match media.kind {
            MediaKind::Audio => &self.audio_formats,
            MediaKind::Document => &self.document_formats,
            MediaKind::Video => &self.video_formats,
            _ => return true,
        };
        if allowed.iter().any(|f| f == "all") {
            return true;
        }
        match media.file_format() {
            Some(format) => allowed.iter().any(|f| *f == format),
            None => false,
        }
    }
}
