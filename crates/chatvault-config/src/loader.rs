// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chatvault.toml` > `~/.config/chatvault/chatvault.toml`
//! > `/etc/chatvault/chatvault.toml` with environment variable overrides via
//! the `CHATVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChatvaultConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatvault/chatvault.toml` (system-wide)
/// 3. `~/.config/chatvault/chatvault.toml` (user XDG config)
/// 4. `./chatvault.toml` (local directory)
/// 5. `CHATVAULT_*` environment variables
pub fn load_config() -> Result<ChatvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatvaultConfig::default()))
        .merge(Toml::file("/etc/chatvault/chatvault.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chatvault/chatvault.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chatvault.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ChatvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHATVAULT_ARCHIVE_BASE_DIRECTORY` must
/// map to `archive.base_directory`, not `archive.base.directory`.
fn env_provider() -> Env {
    Env::prefixed("CHATVAULT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CHATVAULT_DOWNLOAD_MAX_PARALLEL -> "download_max_parallel"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("archive_", "archive.", 1)
            .replacen("download_", "download.", 1)
            .replacen("source_", "source.", 1)
            .replacen("filter_", "filter.", 1);
        mapped.into()
    })
}
