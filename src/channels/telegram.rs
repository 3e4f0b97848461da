//! Telegram Bot API client: file resolution and text replies.
//!
//! Updates arrive through the webhook route, so this client only covers
//! the outbound half of the Bot API.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::channels::{Delivery, Messenger};
use crate::config::TelegramConfig;
use crate::error::ChannelError;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Bot API client.
pub struct TelegramClient {
    bot_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

/// Envelope of a `getFile` response.
#[derive(Debug, Deserialize)]
struct GetFileResponse {
    ok: bool,
    #[serde(default)]
    result: Option<TelegramFile>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    #[serde(default)]
    file_path: Option<String>,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{file_path}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    async fn get_file_path(&self, file_id: &str) -> Result<String, ChannelError> {
        let lookup_failed = |reason: String| ChannelError::FileLookup {
            file_id: file_id.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(self.api_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| lookup_failed(e.without_url().to_string()))?;

        let status = resp.status();
        let body: GetFileResponse = resp
            .json()
            .await
            .map_err(|e| lookup_failed(format!("HTTP {status}: {}", e.without_url())))?;

        if !body.ok {
            return Err(lookup_failed(
                body.description
                    .unwrap_or_else(|| format!("getFile returned ok=false (HTTP {status})")),
            ));
        }

        body.result
            .and_then(|f| f.file_path)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| lookup_failed("Failed to get file path".into()))
    }

    /// Send a text message, splitting anything over Telegram's limit.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);

        for chunk in &chunks {
            self.send_message_chunk(chat_id, chunk).await?;
        }
        Ok(())
    }

    async fn send_message_chunk(&self, chat_id: i64, text: &str) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.without_url().to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage failed ({status}): {err}"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, ChannelError> {
        let path = self.get_file_path(file_id).await?;
        debug!(file_id, "Resolved Telegram file path");
        Ok(self.file_url(&path))
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Delivery {
        match self.send_message(chat_id, text).await {
            Ok(()) => Delivery::delivered(),
            Err(e) => {
                warn!(chat_id, error = %e, "Error sending message");
                Delivery::failed(e.to_string())
            }
        }
    }
}

/// Split a message into chunks no longer than `max_len` bytes, preferring
/// newline and then space boundaries.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let mut boundary = max_len;
        while !remaining.is_char_boundary(boundary) {
            boundary -= 1;
        }

        let chunk = &remaining[..boundary];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(boundary);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { boundary } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────
