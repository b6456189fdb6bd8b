// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatvault archiver.

use thiserror::Error;

/// The primary error type used across all Chatvault crates.
#[derive(Debug, Error)]
pub enum ChatvaultError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Message source errors (fetch failure, malformed payload, quota, rate limiting).
    #[error("source error: {message}")]
    Source {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local storage errors (log append, artifact write, rename failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Checkpoint persistence errors. Fatal for the chat being processed:
    /// resumption correctness depends on the checkpoint reaching disk.
    #[error("checkpoint error: {message}")]
    Checkpoint {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatvaultError {
    /// Wrap a local I/O error as a storage error.
    pub fn storage(source: std::io::Error) -> Self {
        ChatvaultError::Storage {
            source: Box::new(source),
        }
    }
}
