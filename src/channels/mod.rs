//! Messaging platform abstraction.
//!
//! The pipeline only needs two things from the platform: turn a file
//! identifier into a downloadable URL, and send a text reply.

pub mod telegram;
pub mod telegram_types;

use async_trait::async_trait;

use crate::error::ChannelError;

pub use telegram::TelegramClient;
pub use telegram_types::{InboundUpdate, PhotoSize, TelegramMessage, carries_photo};

/// Outcome of a best-effort outbound message.
///
/// Delivery failures never abort a webhook; callers get this value back
/// and decide whether to care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub error: Option<String>,
}

impl Delivery {
    pub fn delivered() -> Self {
        Self { error: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Messaging adapter used by the enrichment pipeline.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Resolve a platform file identifier to a time-limited download URL.
    async fn resolve_file_url(&self, file_id: &str) -> Result<String, ChannelError>;

    /// Send a text message to a chat. Never retried.
    async fn send_text(&self, chat_id: i64, text: &str) -> Delivery;
}
