// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive pool sizes, known media kinds, parseable
//! filter dates, and distinct chat identifiers.

use std::collections::HashSet;
use std::str::FromStr;

use chatvault_core::types::MediaKind;

use crate::diagnostic::ConfigError;
use crate::model::ChatvaultConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ChatvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.archive.base_directory.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "archive.base_directory must not be empty".to_string(),
        });
    }

    if config.archive.history_directory.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "archive.history_directory must not be empty".to_string(),
        });
    }

    if !matches!(config.archive.format.as_str(), "html" | "text") {
        errors.push(ConfigError::Validation {
            message: format!(
                "archive.format must be `html` or `text`, got `{}`",
                config.archive.format
            ),
        });
    }

    if config.download.max_parallel == 0 {
        errors.push(ConfigError::Validation {
            message: "download.max_parallel must be at least 1".to_string(),
        });
    }

    if config.download.batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "download.batch_size must be at least 1".to_string(),
        });
    }

    if config.download.retry_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "download.retry_attempts must be at least 1".to_string(),
        });
    }

    for media_type in &config.download.media_types {
        if media_type != "all" && MediaKind::from_str(media_type).is_err() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "download.media_types contains unknown kind `{media_type}` \
                     (expected `all`, photo, video, video_note, audio, voice, document)"
                ),
            });
        }
    }

    for (field, value) in [
        ("filter.start_date", &config.filter.start_date),
        ("filter.end_date", &config.filter.end_date),
    ] {
        if let Some(raw) = value
            && parse_filter_date(raw).is_none()
        {
            errors.push(ConfigError::Validation {
                message: format!(
                    "{field} `{raw}` is not an RFC 3339 datetime or YYYY-MM-DD date"
                ),
            });
        }
    }

    let mut seen_ids = HashSet::new();
    for chat in &config.chats {
        if chat.id == 0 {
            errors.push(ConfigError::Validation {
                message: "chats entries must have a non-zero id".to_string(),
            });
        }
        if !seen_ids.insert(chat.id) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate chat id `{}` in [[chats]] array", chat.id),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Parse a filter date: full RFC 3339 datetime, or a bare date taken as
/// midnight UTC.
pub fn parse_filter_date(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatEntryConfig;

    #[test]
    fn default_config_validates() {
        let config = ChatvaultConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_max_parallel_fails_validation() {
        let mut config = ChatvaultConfig::default();
        config.download.max_parallel = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_parallel"))
        ));
    }

    #[test]
    fn unknown_media_kind_fails_validation() {
        let mut config = ChatvaultConfig::default();
        config.download.media_types = vec!["sticker".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("sticker"))
        ));
    }

    #[test]
    fn bad_format_fails_validation() {
        let mut config = ChatvaultConfig::default();
        config.archive.format = "pdf".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("archive.format"))
        ));
    }

    #[test]
    fn duplicate_chat_ids_fail_validation() {
        let mut config = ChatvaultConfig::default();
        config.chats = vec![
            ChatEntryConfig {
                id: 7,
                title: None,
                enabled: true,
            },
            ChatEntryConfig {
                id: 7,
                title: None,
                enabled: false,
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("duplicate chat id"))
        ));
    }

    #[test]
    fn filter_dates_accept_both_forms() {
        assert!(parse_filter_date("2025-06-01").is_some());
        assert!(parse_filter_date("2025-06-01T12:30:00Z").is_some());
        assert!(parse_filter_date("June 1st").is_none());

        let mut config = ChatvaultConfig::default();
        config.filter.start_date = Some("not-a-date".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("start_date"))
        ));
    }
}
