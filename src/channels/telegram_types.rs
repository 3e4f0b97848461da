//! Telegram update types: the slice of the Bot API payload the webhook reads.

use serde::Deserialize;
use serde_json::Value;

/// Username recorded when the sender has none.
pub const ANONYMOUS_SENDER: &str = "anonymous";

/// One webhook delivery from the Bot API.
///
/// Only the fields the pipeline reads are modelled. Everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<User>,
    /// Size variants, smallest first by platform convention.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

/// Whether a raw payload carries `message.photo` at all.
///
/// Checked before typed decoding so that updates without a photo are
/// acknowledged whatever shape their other fields have.
pub fn carries_photo(raw: &Value) -> bool {
    raw.pointer("/message/photo").is_some_and(|p| !p.is_null())
}

impl InboundUpdate {
    /// The photo variants carried by this update, if any.
    pub fn photo(&self) -> Option<&[PhotoSize]> {
        self.message.as_ref()?.photo.as_deref()
    }
}

impl TelegramMessage {
    /// Sender handle, or the anonymous sentinel.
    pub fn sender_handle(&self) -> &str {
        self.from
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .filter(|u| !u.is_empty())
            .unwrap_or(ANONYMOUS_SENDER)
    }
}
