// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency download scheduler.
//!
//! One batch at a time: every message with admissible media becomes a
//! download task, at most `max_parallel` tasks run concurrently, and the
//! batch completes only when every task has resolved to success or failure.
//! Task failures never escape the scheduler; they come back as failed
//! message ids for the retry tracker.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatvault_core::error::ChatvaultError;
use chatvault_core::traits::MessageSource;
use chatvault_core::types::{ChatId, MediaRef, MessageDescriptor};
use chatvault_progress::{DownloadHandle, ProgressFeed};
use futures::future::join_all;
use metrics::counter;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::dedup::resolve_duplicate;
use crate::filter::MediaFilter;
use crate::hash_cache::HashCache;
use crate::index::DownloadIndex;
use crate::paths::{media_target_path, next_available_path};

/// Result of one processed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Highest message id seen in the batch (media or not).
    pub max_processed_id: i64,
    /// Ids whose download failed and must be retried.
    pub failed: Vec<i64>,
}

/// Tunables for the scheduler, taken from `[download]` config.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Base directory media lands under (per-kind subdirectories).
    pub media_dir: PathBuf,
    pub max_parallel: usize,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub skip_duplicates: bool,
}

/// Dispatches bounded-concurrency download tasks for one chat at a time.
pub struct DownloadScheduler {
    source: Arc<dyn MessageSource>,
    index: Arc<DownloadIndex>,
    hashes: Arc<HashCache>,
    feed: Arc<ProgressFeed>,
    filter: MediaFilter,
    settings: SchedulerSettings,
}

enum TaskResult {
    /// No download needed (no media, filtered out, or kind disabled).
    Skipped,
    Downloaded(PathBuf),
    Failed(ChatvaultError),
}

impl DownloadScheduler {
    pub fn new(
        source: Arc<dyn MessageSource>,
        index: Arc<DownloadIndex>,
        hashes: Arc<HashCache>,
        feed: Arc<ProgressFeed>,
        filter: MediaFilter,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            source,
            index,
            hashes,
            feed,
            filter,
            settings,
        }
    }

    /// Process one batch of messages for `chat`.
    ///
    /// All workers complete (success or failure) before this returns; the
    /// caller can hand the batch to persistence knowing every outcome is
    /// resolved and recorded in the Download Index.
    pub async fn process_batch(
        &self,
        chat: ChatId,
        messages: &[MessageDescriptor],
    ) -> BatchOutcome {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_parallel));

        let tasks = messages.iter().map(|msg| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                // acquire only fails after close(), which never happens here.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (
                        msg.id,
                        TaskResult::Failed(ChatvaultError::Internal(
                            "download semaphore closed".into(),
                        )),
                    );
                };
                (msg.id, self.process_message(chat, msg).await)
            }
        });

        let mut failed = Vec::new();
        for (id, result) in join_all(tasks).await {
            match result {
                TaskResult::Skipped | TaskResult::Downloaded(_) => {}
                TaskResult::Failed(err) => {
                    warn!(chat = %chat, message_id = id, error = %err, "download failed");
                    failed.push(id);
                }
            }
        }
        failed.sort_unstable();

        let max_processed_id = messages.iter().map(|m| m.id).max().unwrap_or(0);
        info!(
            chat = %chat,
            messages = messages.len(),
            failed = failed.len(),
            max_processed_id,
            "batch processed"
        );

        BatchOutcome {
            max_processed_id,
            failed,
        }
    }

    async fn process_message(&self, chat: ChatId, msg: &MessageDescriptor) -> TaskResult {
        let Some(media) = &msg.media else {
            return TaskResult::Skipped;
        };
        if !self.filter.admits(msg, media) {
            debug!(chat = %chat, message_id = msg.id, kind = %media.kind, "media filtered out");
            return TaskResult::Skipped;
        }
        let Some(target) = media_target_path(&self.settings.media_dir, msg) else {
            return TaskResult::Skipped;
        };

        match self.download_one(msg, media, target).await {
            Ok(path) => {
                self.index.record(msg.key(), path.clone());
                self.feed.media_downloaded(chat);
                counter!("chatvault_downloads_completed_total").increment(1);
                debug!(chat = %chat, message_id = msg.id, path = %path.display(), "media stored");
                TaskResult::Downloaded(path)
            }
            Err(err) => {
                counter!("chatvault_downloads_failed_total").increment(1);
                TaskResult::Failed(err)
            }
        }
    }

    /// Fetch, store, and dedup one media object, with bounded retry.
    async fn download_one(
        &self,
        msg: &MessageDescriptor,
        media: &MediaRef,
        mut target: PathBuf,
    ) -> Result<PathBuf, ChatvaultError> {
        // A file already at the derived path with the expected size is the
        // artifact from an earlier run; reuse it instead of re-fetching.
        if let Some(existing) = reusable_artifact(&target, media) {
            debug!(path = %existing.display(), message_id = msg.id, "reusing existing artifact");
            counter!("chatvault_downloads_reused_total").increment(1);
            return Ok(existing);
        }
        if target.is_file() {
            target = next_available_path(&target);
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(ChatvaultError::storage)?;
        }

        let description = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| media.remote_id.clone());

        let mut last_err = None;
        for attempt in 1..=self.settings.retry_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.settings.retry_delay).await;
            }

            let handle =
                DownloadHandle::begin(Arc::clone(&self.feed), description.clone(), media.size);
            match self.source.fetch_media(msg, &handle).await {
                Ok(bytes) => {
                    drop(handle);
                    tokio::fs::write(&target, &bytes)
                        .await
                        .map_err(ChatvaultError::storage)?;
                    counter!("chatvault_download_bytes_total").increment(bytes.len() as u64);

                    if self.settings.skip_duplicates {
                        return resolve_duplicate(&target, &self.hashes);
                    }
                    return Ok(target);
                }
                Err(err) => {
                    warn!(
                        message_id = msg.id,
                        attempt,
                        attempts = self.settings.retry_attempts,
                        error = %err,
                        "media fetch attempt failed"
                    );
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ChatvaultError::Internal("media fetch failed with no recorded error".into())
        }))
    }
}

/// Existing artifact at the derived path, when its size matches the source's
/// expectation (any size passes when the source does not report one).
fn reusable_artifact(target: &std::path::Path, media: &MediaRef) -> Option<PathBuf> {
    let meta = std::fs::metadata(target).ok()?;
    if !meta.is_file() {
        return None;
    }
    match media.size {
        Some(expected) if meta.len() != expected => None,
        _ => Some(target.to_path_buf()),
    }
}
