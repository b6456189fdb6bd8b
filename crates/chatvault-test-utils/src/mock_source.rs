// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted in-memory [`MessageSource`] for tests.
//!
//! Serves pre-loaded message batches and media payloads, injects failures
//! per remote id, and observes worker concurrency so scheduler tests can
//! assert the semaphore bound.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chatvault_core::error::ChatvaultError;
use chatvault_core::traits::{MessageSource, ProgressObserver};
use chatvault_core::types::{ChatId, MessageDescriptor};

/// In-memory message source with failure injection.
#[derive(Default)]
pub struct MockMessageSource {
    titles: Mutex<HashMap<i64, String>>,
    messages: Mutex<HashMap<i64, Vec<MessageDescriptor>>>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    failing_chats: Mutex<HashSet<i64>>,
    fetch_delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    media_fetches: AtomicUsize,
}

impl MockMessageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chat with its messages (kept sorted by id).
    pub fn with_chat(self, chat: ChatId, title: &str, mut messages: Vec<MessageDescriptor>) -> Self {
        messages.sort_by_key(|m| m.id);
        self.titles
            .lock()
            .expect("titles lock")
            .insert(chat.0, title.to_string());
        self.messages
            .lock()
            .expect("messages lock")
            .insert(chat.0, messages);
        self
    }

    /// Serve `bytes` for the given media remote id.
    pub fn with_media(self, remote_id: &str, bytes: &[u8]) -> Self {
        self.media
            .lock()
            .expect("media lock")
            .insert(remote_id.to_string(), bytes.to_vec());
        self
    }

    /// Make every fetch of this remote id fail.
    pub fn with_failing_media(self, remote_id: &str) -> Self {
        self.failing
            .lock()
            .expect("failing lock")
            .insert(remote_id.to_string());
        self
    }

    /// Make every message fetch for this chat fail (media is unaffected).
    pub fn with_failing_chat(self, chat: ChatId) -> Self {
        self.failing_chats
            .lock()
            .expect("failing chats lock")
            .insert(chat.0);
        self
    }

    /// Hold each media fetch open for `delay`, making concurrency observable.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Highest number of media fetches that were in flight at once.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Total media fetch attempts (retries included).
    pub fn media_fetch_count(&self) -> usize {
        self.media_fetches.load(Ordering::SeqCst)
    }

    fn fail_if_scripted(&self, chat: ChatId) -> Result<(), ChatvaultError> {
        if self
            .failing_chats
            .lock()
            .expect("failing chats lock")
            .contains(&chat.0)
        {
            return Err(ChatvaultError::Source {
                message: format!("injected fetch failure for chat {chat}"),
                source: None,
            });
        }
        Ok(())
    }

    /// Stop failing a remote id (used by retry-path tests).
    pub fn heal_media(&self, remote_id: &str, bytes: &[u8]) {
        self.failing.lock().expect("failing lock").remove(remote_id);
        self.media
            .lock()
            .expect("media lock")
            .insert(remote_id.to_string(), bytes.to_vec());
    }
}

#[async_trait]
impl MessageSource for MockMessageSource {
    async fn chat_title(&self, chat: ChatId) -> Result<Option<String>, ChatvaultError> {
        Ok(self.titles.lock().expect("titles lock").get(&chat.0).cloned())
    }

    async fn fetch_batch(
        &self,
        chat: ChatId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError> {
        self.fail_if_scripted(chat)?;
        let messages = self.messages.lock().expect("messages lock");
        let batch = messages
            .get(&chat.0)
            .map(|all| {
                all.iter()
                    .filter(|m| m.id > after_id)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(batch)
    }

    async fn fetch_by_ids(
        &self,
        chat: ChatId,
        ids: &[i64],
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError> {
        self.fail_if_scripted(chat)?;
        let messages = self.messages.lock().expect("messages lock");
        let batch = messages
            .get(&chat.0)
            .map(|all| {
                all.iter()
                    .filter(|m| ids.contains(&m.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(batch)
    }

    async fn fetch_media(
        &self,
        message: &MessageDescriptor,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, ChatvaultError> {
        self.media_fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        let result = (|| {
            let media = message.media.as_ref().ok_or_else(|| ChatvaultError::Source {
                message: format!("message {} has no media", message.id),
                source: None,
            })?;
            if self
                .failing
                .lock()
                .expect("failing lock")
                .contains(&media.remote_id)
            {
                return Err(ChatvaultError::Source {
                    message: format!("injected failure for {}", media.remote_id),
                    source: None,
                });
            }
            self.media
                .lock()
                .expect("media lock")
                .get(&media.remote_id)
                .cloned()
                .ok_or_else(|| ChatvaultError::Source {
                    message: format!("no media payload scripted for {}", media.remote_id),
                    source: None,
                })
        })();

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let bytes = result?;
        let total = bytes.len() as u64;
        observer.on_bytes(total / 2, Some(total));
        observer.on_bytes(total, Some(total));
        Ok(bytes)
    }
}
