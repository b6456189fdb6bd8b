// SPDX-FileCopyrightText: 2026 Chatvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of [`MessageSource`].
//!
//! Talks to a paginated JSON REST API:
//!
//! ```text
//! GET /chats/{id}                                  -> chat metadata
//! GET /chats/{id}/messages?after_id=N&limit=P      -> ordered message page
//! GET /chats/{id}/messages?ids=1,2,3               -> specific messages
//! GET /chats/{id}/messages/{mid}/media             -> media bytes (streamed)
//! ```
//!
//! Media bodies are streamed chunk by chunk so byte progress reaches the
//! observer while the transfer is in flight. Retry policy lives in the
//! download scheduler, not here.

use std::time::Duration;

use async_trait::async_trait;
use chatvault_config::model::SourceConfig;
use chatvault_core::error::ChatvaultError;
use chatvault_core::traits::{MessageSource, ProgressObserver};
use chatvault_core::types::{ChatId, MessageDescriptor};
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::wire::{WireChat, WireMessagesPage};

/// Reference [`MessageSource`] over a generic chat-archive HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMessageSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMessageSource {
    /// Build the client from `[source]` configuration.
    ///
    /// Fails when `base_url` is unset: a remote run needs a source.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ChatvaultError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| {
                ChatvaultError::Config("source.base_url is required for a remote run".to_string())
            })?
            .trim_end_matches('/')
            .to_string();

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ChatvaultError::Config(format!("invalid api_token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatvaultError::Source {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, base_url })
    }

    fn messages_url(&self, chat: ChatId) -> String {
        format!("{}/chats/{}/messages", self.base_url, chat.0)
    }

    async fn get_checked(&self, url: &str) -> Result<reqwest::Response, ChatvaultError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| ChatvaultError::Source {
                    message: format!("request to {url} failed: {e}"),
                    source: Some(Box::new(e)),
                })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatvaultError::Source {
                message: format!("{url} returned {status}"),
                source: None,
            });
        }
        Ok(response)
    }

    async fn fetch_page(
        &self,
        chat: ChatId,
        query: &[(&str, String)],
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError> {
        let url = self.messages_url(chat);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ChatvaultError::Source {
                message: format!("request to {url} failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChatvaultError::Source {
                message: format!("{url} returned {status}"),
                source: None,
            });
        }

        let page: WireMessagesPage =
            response.json().await.map_err(|e| ChatvaultError::Source {
                message: format!("malformed message page from {url}: {e}"),
                source: Some(Box::new(e)),
            })?;

        let mut messages: Vec<MessageDescriptor> = page
            .messages
            .into_iter()
            .map(|m| m.into_descriptor(chat))
            .collect();
        messages.sort_by_key(|m| m.id);
        Ok(messages)
    }
}

#[async_trait]
impl MessageSource for HttpMessageSource {
    async fn chat_title(&self, chat: ChatId) -> Result<Option<String>, ChatvaultError> {
        let url = format!("{}/chats/{}", self.base_url, chat.0);
        let response = self.get_checked(&url).await?;
        let wire: WireChat = response.json().await.map_err(|e| ChatvaultError::Source {
            message: format!("malformed chat metadata from {url}: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(wire.title)
    }

    async fn fetch_batch(
        &self,
        chat: ChatId,
        after_id: i64,
        limit: usize,
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError> {
        debug!(chat = %chat, after_id, limit, "fetching message page");
        self.fetch_page(
            chat,
            &[
                ("after_id", after_id.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn fetch_by_ids(
        &self,
        chat: ChatId,
        ids: &[i64],
    ) -> Result<Vec<MessageDescriptor>, ChatvaultError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        debug!(chat = %chat, ids = %joined, "fetching messages by id");
        self.fetch_page(chat, &[("ids", joined)]).await
    }

    async fn fetch_media(
        &self,
        message: &MessageDescriptor,
        observer: &dyn ProgressObserver,
    ) -> Result<Vec<u8>, ChatvaultError> {
        let url = format!(
            "{}/chats/{}/messages/{}/media",
            self.base_url, message.chat_id.0, message.id
        );
        let response = self.get_checked(&url).await?;

        let total = response
            .content_length()
            .or(message.media.as_ref().and_then(|m| m.size));
        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ChatvaultError::Source {
                message: format!("media stream from {url} broke: {e}"),
                source: Some(Box::new(e)),
            })?;
            bytes.extend_from_slice(&chunk);
            observer.on_bytes(bytes.len() as u64, total);
        }

        debug!(message_id = message.id, size = bytes.len(), "media transfer complete");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with_base(base: &str) -> HttpMessageSource {
        let config = SourceConfig {
            base_url: Some(base.to_string()),
            api_token: None,
            timeout_secs: 5,
        };
        HttpMessageSource::from_config(&config).unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let source = source_with_base("https://example.test/api/");
        assert_eq!(
            source.messages_url(ChatId(-7)),
            "https://example.test/api/chats/-7/messages"
        );
    }

    #[test]
    fn missing_base_url_is_a_config_error() {
        let result = HttpMessageSource::from_config(&SourceConfig::default());
        assert!(matches!(result, Err(ChatvaultError::Config(_))));
    }

    #[test]
    fn invalid_token_is_a_config_error() {
        let config = SourceConfig {
            base_url: Some("https://example.test".to_string()),
            api_token: Some("bad\ntoken".to_string()),
            timeout_secs: 5,
        };
        assert!(matches!(
            HttpMessageSource::from_config(&config),
            Err(ChatvaultError::Config(_))
        ));
    }
}
