// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chatvault archiver.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::str::FromStr;

use chatvault_core::types::MediaKind;
use serde::{Deserialize, Serialize};

/// Top-level Chatvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatvaultConfig {
    /// Archive layout and presentation settings.
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Download scheduling and retry settings.
    #[serde(default)]
    pub download: DownloadConfig,

    /// Remote message source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Message admission filters.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Chats to archive. Each entry carries the chat identifier and an
    /// enabled flag; progress state lives in the checkpoint file, not here.
    #[serde(default)]
    pub chats: Vec<ChatEntryConfig>,
}

/// Archive layout and presentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Base directory for downloaded media and history.
    #[serde(default = "default_base_directory")]
    pub base_directory: String,

    /// Name of the history directory inside the base directory.
    #[serde(default = "default_history_directory")]
    pub history_directory: String,

    /// Presentation format regenerated from the durable log: "html" or "text".
    /// The JSONL log itself is always written.
    #[serde(default = "default_format")]
    pub format: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_directory: default_base_directory(),
            history_directory: default_history_directory(),
            format: default_format(),
            log_level: default_log_level(),
        }
    }
}

fn default_base_directory() -> String {
    dirs::data_dir()
        .map(|p| p.join("chatvault"))
        .unwrap_or_else(|| std::path::PathBuf::from("chatvault"))
        .to_string_lossy()
        .into_owned()
}

fn default_history_directory() -> String {
    "history".to_string()
}

fn default_format() -> String {
    "html".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Download scheduling and retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DownloadConfig {
    /// Maximum number of concurrent download tasks per batch.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Messages fetched and persisted per batch. Larger batches amortize
    /// presentation regeneration; smaller batches lose less on crash.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fetch attempts per media object before the message is recorded
    /// as failed for this batch.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay in seconds between fetch attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Media kinds to download ("all" or any of photo, video, video_note,
    /// audio, voice, document). Messages with other kinds are archived
    /// without their media.
    #[serde(default = "default_media_types")]
    pub media_types: Vec<String>,

    /// Delete a freshly downloaded file when an identical-content sibling
    /// already exists, referencing the surviving copy instead.
    #[serde(default = "default_skip_duplicates")]
    pub skip_duplicates: bool,

    /// Stop a chat after this many downloaded media objects in one run.
    #[serde(default)]
    pub max_messages: Option<u64>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            media_types: default_media_types(),
            skip_duplicates: default_skip_duplicates(),
            max_messages: None,
        }
    }
}

impl DownloadConfig {
    /// Media kinds enabled by `media_types`, expanding `all`.
    ///
    /// Unknown entries are ignored here; validation reports them.
    pub fn enabled_kinds(&self) -> Vec<MediaKind> {
        if self.media_types.iter().any(|t| t == "all") {
            return MediaKind::ALL.to_vec();
        }
        self.media_types
            .iter()
            .filter_map(|t| MediaKind::from_str(t).ok())
            .collect()
    }
}

fn default_max_parallel() -> usize {
    4
}

fn default_batch_size() -> usize {
    100
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

fn default_media_types() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_skip_duplicates() -> bool {
    true
}

/// Remote message source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Base URL of the message source API. `None` disables remote runs
    /// (only `status` works without a source).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the source API.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    120
}

/// Message admission filters.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Only download media sent by these sender identifiers. Empty = everyone.
    #[serde(default)]
    pub sender_ids: Vec<i64>,

    /// Skip messages older than this RFC 3339 date or datetime.
    #[serde(default)]
    pub start_date: Option<String>,

    /// Skip messages newer than this RFC 3339 date or datetime.
    #[serde(default)]
    pub end_date: Option<String>,

    /// Per-kind file format allow-lists.
    #[serde(default)]
    pub formats: FormatFilterConfig,
}

/// File format allow-lists for the kinds that carry arbitrary formats.
///
/// `["all"]` admits every format of that kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FormatFilterConfig {
    #[serde(default = "default_all_formats")]
    pub audio: Vec<String>,

    #[serde(default = "default_all_formats")]
    pub document: Vec<String>,

    #[serde(default = "default_all_formats")]
    pub video: Vec<String>,
}

impl Default for FormatFilterConfig {
    fn default() -> Self {
        Self {
            audio: default_all_formats(),
            document: default_all_formats(),
            video: default_all_formats(),
        }
    }
}

fn default_all_formats() -> Vec<String> {
    vec!["all".to_string()]
}

/// One chat to archive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatEntryConfig {
    /// Chat identifier on the message source.
    pub id: i64,

    /// Display title, if known ahead of the first fetch.
    #[serde(default)]
    pub title: Option<String>,

    /// Disabled chats keep their checkpoint but are skipped by runs.
    #[serde(default = "default_chat_enabled")]
    pub enabled: bool,
}

fn default_chat_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_kinds_expands_all() {
        let config = DownloadConfig::default();
        assert_eq!(config.enabled_kinds().len(), MediaKind::ALL.len());
    }

    #[test]
    fn enabled_kinds_honors_explicit_list() {
        let config = DownloadConfig {
            media_types: vec!["photo".to_string(), "voice".to_string()],
            ..DownloadConfig::default()
        };
        assert_eq!(
            config.enabled_kinds(),
            vec![MediaKind::Photo, MediaKind::Voice]
        );
    }

    #[test]
    fn chats_array_deserializes_with_defaults() {
        let toml_str = r#"
[[chats]]
id = -1001234
title = "Family"

[[chats]]
id = 42
"#;
        let config: ChatvaultConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chats.len(), 2);
        assert_eq!(config.chats[0].title.as_deref(), Some("Family"));
        assert!(config.chats[1].enabled);
        assert!(config.chats[1].title.is_none());
    }

    #[test]
    fn chats_deny_unknown_fields() {
        let toml_str = r#"
[[chats]]
id = 1
last_read = 99
"#;
        assert!(toml::from_str::<ChatvaultConfig>(toml_str).is_err());
    }

    #[test]
    fn format_filters_default_to_all() {
        let config: ChatvaultConfig = toml::from_str("").unwrap();
        assert_eq!(config.filter.formats.audio, vec!["all"]);
        assert_eq!(config.filter.formats.video, vec!["all"]);
        assert_eq!(config.filter.formats.document, vec!["all"]);
    }
}
