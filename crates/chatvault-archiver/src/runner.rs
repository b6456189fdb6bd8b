// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The archiving run loop.
//!
//! Chats are processed sequentially; within a chat, the scheduler runs its
//! bounded worker pool per batch. The order per batch is fixed: download
//! (full barrier) -> append to the durable log and regenerate presentation
//! -> advance the checkpoint. The Download Index is evicted only after a
//! chat's final batch is persisted.
//!
//! Chat-level failures pause that chat (checkpoint intact, retry set
//! preserved) and the run moves on; they never corrupt other chats' logs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatvault_checkpoint::CheckpointStore;
use chatvault_config::ChatvaultConfig;
use chatvault_config::model::ChatEntryConfig;
use chatvault_core::error::ChatvaultError;
use chatvault_core::traits::MessageSource;
use chatvault_core::types::{ChatId, MessageDescriptor};
use chatvault_downloader::{
    DownloadIndex, DownloadScheduler, HashCache, MediaFilter, SchedulerSettings,
};
use chatvault_history::{HistoryEngine, renderer_for};
use chatvault_progress::{ChatPhase, ProgressFeed};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chats_completed: usize,
    pub chats_paused: usize,
    /// Message ids still pending retry across all chats after the run.
    pub pending_retry_total: usize,
}

enum ChatOutcome {
    Completed,
    Paused,
}

/// Owns every pipeline component for one archiving run.
pub struct ArchiveRunner {
    source: Arc<dyn MessageSource>,
    scheduler: DownloadScheduler,
    index: Arc<DownloadIndex>,
    engine: HistoryEngine,
    checkpoints: CheckpointStore,
    feed: Arc<ProgressFeed>,
    chats: Vec<ChatEntryConfig>,
    batch_size: usize,
    max_messages: Option<u64>,
    cancel: CancellationToken,
}

impl ArchiveRunner {
    /// Wire the pipeline from validated configuration.
    pub fn new(
        config: &ChatvaultConfig,
        source: Arc<dyn MessageSource>,
        feed: Arc<ProgressFeed>,
        cancel: CancellationToken,
    ) -> Result<Self, ChatvaultError> {
        let base_dir = PathBuf::from(&config.archive.base_directory);
        let history_dir = base_dir.join(&config.archive.history_directory);

        let engine = HistoryEngine::new(history_dir, renderer_for(&config.archive.format));
        let checkpoints = CheckpointStore::load(base_dir.join("checkpoints.json"))?;
        let index = Arc::new(DownloadIndex::new());
        let scheduler = DownloadScheduler::new(
            Arc::clone(&source),
            Arc::clone(&index),
            Arc::new(HashCache::new()),
            Arc::clone(&feed),
            MediaFilter::from_config(config),
            SchedulerSettings {
                media_dir: base_dir,
                max_parallel: config.download.max_parallel,
                retry_attempts: config.download.retry_attempts,
                retry_delay: Duration::from_secs(config.download.retry_delay_secs),
                skip_duplicates: config.download.skip_duplicates,
            },
        );

        Ok(Self {
            source,
            scheduler,
            index,
            engine,
            checkpoints,
            feed,
            chats: config.chats.clone(),
            batch_size: config.download.batch_size,
            max_messages: config.download.max_messages,
            cancel,
        })
    }

    /// Checkpoint state, for status reporting and tests.
    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    /// Download index, for inspecting eviction behavior in tests.
    pub fn download_index(&self) -> &DownloadIndex {
        &self.index
    }

    /// Archive every enabled chat, sequentially.
    pub async fn run(&mut self) -> Result<RunSummary, ChatvaultError> {
        for entry in &self.chats {
            self.checkpoints
                .ensure_chat(ChatId(entry.id), entry.title.as_deref(), entry.enabled)?;
        }

        let targets: Vec<(ChatId, Option<String>)> = self
            .chats
            .iter()
            .filter(|c| c.enabled)
            .map(|c| (ChatId(c.id), c.title.clone()))
            .collect();
        info!(chats = targets.len(), "archive run starting");
        self.feed.run_started(targets.len());

        let mut summary = RunSummary::default();
        for (chat, config_title) in targets {
            if self.cancel.is_cancelled() {
                info!("cancellation requested, stopping before next chat");
                break;
            }
            match self.archive_chat(chat, config_title.as_deref()).await {
                Ok(ChatOutcome::Completed) => summary.chats_completed += 1,
                Ok(ChatOutcome::Paused) => summary.chats_paused += 1,
                Err(err) => {
                    error!(chat = %chat, error = %err, "chat failed, pausing it and moving on");
                    if let Err(persist_err) = self.checkpoints.pause(chat) {
                        error!(chat = %chat, error = %persist_err, "could not persist paused state");
                    }
                    self.index.evict(chat);
                    self.feed.chat_phase(chat, ChatPhase::Paused);
                    summary.chats_paused += 1;
                }
            }
        }

        self.feed.run_finished();
        summary.pending_retry_total = self
            .checkpoints
            .checkpoints()
            .map(|c| c.pending_retry.len())
            .sum();
        info!(
            completed = summary.chats_completed,
            paused = summary.chats_paused,
            pending_retry = summary.pending_retry_total,
            "archive run finished"
        );
        Ok(summary)
    }

    async fn archive_chat(
        &mut self,
        chat: ChatId,
        config_title: Option<&str>,
    ) -> Result<ChatOutcome, ChatvaultError> {
        let title = self.resolve_title(chat, config_title).await?;
        self.checkpoints.begin(chat)?;
        self.feed.chat_registered(chat, &title);
        self.feed.chat_phase(chat, ChatPhase::Downloading);
        info!(chat = %chat, title = %title, "archiving chat");

        // Failed ids from earlier runs go first, before fresh pagination.
        let retry_ids = self.checkpoints.pending_retry(chat);
        if !retry_ids.is_empty() {
            info!(chat = %chat, count = retry_ids.len(), "re-queueing pending retries");
            let retry_batch = self.source.fetch_by_ids(chat, &retry_ids).await?;
            if !retry_batch.is_empty() {
                self.process_batch(chat, &title, &retry_batch).await?;
            }
        }

        loop {
            if self.cancel.is_cancelled() {
                info!(chat = %chat, "cancellation requested, pausing after last completed batch");
                self.checkpoints.pause(chat)?;
                self.index.evict(chat);
                self.feed.chat_phase(chat, ChatPhase::Paused);
                return Ok(ChatOutcome::Paused);
            }

            let after = self.checkpoints.resume_position(chat);
            let batch = self
                .source
                .fetch_batch(chat, after, self.batch_size)
                .await?;
            if batch.is_empty() {
                break;
            }
            self.process_batch(chat, &title, &batch).await?;

            if let Some(cap) = self.max_messages
                && self.index.snapshot(chat).len() as u64 >= cap
            {
                info!(chat = %chat, cap, "per-run download cap reached");
                break;
            }
        }

        let evicted = self.index.evict(chat);
        debug!(chat = %chat, evicted, "download index evicted");
        self.checkpoints.complete(chat)?;
        self.feed.chat_phase(chat, ChatPhase::Completed);
        Ok(ChatOutcome::Completed)
    }

    /// One batch through the whole pipeline, in the mandatory order:
    /// download barrier, durable append + regeneration, checkpoint advance.
    async fn process_batch(
        &mut self,
        chat: ChatId,
        title: &str,
        batch: &[MessageDescriptor],
    ) -> Result<(), ChatvaultError> {
        let outcome = self.scheduler.process_batch(chat, batch).await;
        let snapshot = self.index.snapshot(chat);
        self.engine
            .save_batch(chat, Some(title), batch, &snapshot)?;

        let attempted: Vec<i64> = batch.iter().map(|m| m.id).collect();
        self.checkpoints.record_batch_result(
            chat,
            outcome.max_processed_id,
            &attempted,
            &outcome.failed,
        )?;
        self.feed.batch_persisted(
            chat,
            batch.len() as u64,
            self.checkpoints.pending_retry(chat).len(),
        );
        Ok(())
    }

    /// Title precedence: source, then config, then checkpoint, then placeholder.
    async fn resolve_title(
        &mut self,
        chat: ChatId,
        config_title: Option<&str>,
    ) -> Result<String, ChatvaultError> {
        match self.source.chat_title(chat).await {
            Ok(Some(title)) => {
                self.checkpoints.set_title(chat, &title)?;
                return Ok(title);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(chat = %chat, error = %err, "could not fetch chat title");
            }
        }
        Ok(config_title
            .map(str::to_string)
            .or_else(|| self.checkpoints.get(chat).and_then(|c| c.title.clone()))
            .unwrap_or_else(|| format!("Chat {}", chat.archive_id())))
    }
}
