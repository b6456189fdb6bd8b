// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatvault archiver.
//!
//! This crate provides the message model, the shared error type, and the
//! trait seams the rest of the workspace builds on. The message source
//! adapter implements [`MessageSource`] defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChatvaultError;
pub use traits::{MessageSource, NoopProgress, ProgressObserver};
pub use types::{ChatId, MediaKind, MediaRef, MessageDescriptor, MessageKey};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        // Verify all 6 error variants exist and can be constructed.
        let _config = ChatvaultError::Config("test".into());
        let _source = ChatvaultError::Source {
            message: "test".into(),
            source: None,
        };
        let _storage = ChatvaultError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _checkpoint = ChatvaultError::Checkpoint {
            message: "test".into(),
            source: None,
        };
        let _timeout = ChatvaultError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = ChatvaultError::Internal("test".into());
    }

    #[test]
    fn storage_helper_wraps_io_error() {
        let err = ChatvaultError::storage(std::io::Error::other("disk gone"));
        assert!(matches!(err, ChatvaultError::Storage { .. }));
        assert!(err.to_string().contains("disk gone"));
    }

    #[test]
    fn source_trait_is_object_safe() {
        fn _assert(_: &dyn MessageSource) {}
    }
}
