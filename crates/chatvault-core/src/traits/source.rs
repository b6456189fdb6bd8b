// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message source trait for remote messaging platforms.
//!
//! The source is an external collaborator: it owns authentication,
//! pagination mechanics, and rate-limit backoff. The archiver only sees
//! ordered batches of [`MessageDescriptor`]s and opaque media bytes.

use async_trait::async_trait;

use crate::error::ChatvaultError;
use crate::types::{ChatId, MessageDescriptor};

/// Observer for byte-level progress of a single media transfer.
///
/// Implementations must be cheap: `on_bytes` is called once per received
/// chunk from inside the download worker.
pub trait ProgressObserver: Send + Sync {
    /// `transferred` bytes received so far; `total` when the source knows
    /// the full size up front.
    fn on_bytes(&self, transferred: u64, total: Option<u64>);
}

/// A [`ProgressObserver`] that discards all updates.
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_bytes(&self, _transferred: u64, _total: Option<u64>) {}
}

/// Adapter for a remote messaging source producing ordered message batches.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Returns the human-readable title of a chat, when the source knows one.
    async fn chat_title(&self, chat: ChatId) -> Result<Option<String>, ChatvaultError>;

    /// Fetches the next batch of messages with identifiers strictly greater
    /// than `after_id`, ordered ascending, at most `limit` messages.
    ///
    /// An empty batch signals end of history.
    async fn fetch_batch(
        &self,
        chat: ChatId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError>;

    /// Fetches specific messages by identifier (used to re-queue the
    /// pending-retry set). Identifiers unknown to the source are skipped.
    async fn fetch_by_ids(
        &self,
        chat: ChatId,
        ids: &[i64],
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError>;

    /// Fetches the media bytes referenced by `message`, reporting byte
    /// progress through `observer`.
    async fn fetch_media(
        &self,
        message: &MessageDescriptor,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, ChatvaultError>;
}
