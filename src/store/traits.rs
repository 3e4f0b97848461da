//! `PhotoStore` trait and the persisted record type.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::DetectedObject;
use crate::error::DatabaseError;

/// One accepted photo with its enrichment results. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: Uuid,
    pub username: String,
    pub photo_url: String,
    pub chat_id: i64,
    pub timestamp: DateTime<Utc>,
    pub safe_score: Option<f64>,
    #[serde(default)]
    pub detected_objects: Vec<DetectedObject>,
    #[serde(default)]
    pub recognized_brands: Vec<String>,
}

impl PhotoRecord {
    /// Create a record stamped with the current time.
    ///
    /// The timestamp is truncated to microseconds, the precision the store
    /// keeps, so a record reads back equal to what was written.
    pub fn new(
        username: impl Into<String>,
        photo_url: impl Into<String>,
        chat_id: i64,
        safe_score: Option<f64>,
        detected_objects: Vec<DetectedObject>,
        recognized_brands: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            photo_url: photo_url.into(),
            chat_id,
            timestamp: Utc::now().trunc_subsecs(6),
            safe_score,
            detected_objects,
            recognized_brands,
        }
    }

    /// Override the creation time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(6);
        self
    }
}

/// Backend-agnostic photo store. Implementations must be safe to share
/// across concurrent webhook deliveries.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Append a record. Returns its id.
    async fn insert_photo(&self, record: &PhotoRecord) -> Result<Uuid, DatabaseError>;

    /// All records, newest first.
    async fn list_photos(&self) -> Result<Vec<PhotoRecord>, DatabaseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_with_null_score() {
        let record = PhotoRecord::new("alice", "https://x/y.jpg", 42, None, vec![], vec![]);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["username"], "alice");
        assert_eq!(json["photoUrl"], "https://x/y.jpg");
        assert_eq!(json["chatId"], 42);
        assert!(json["safeScore"].is_null());
        assert_eq!(json["detectedObjects"], serde_json::json!([]));
        assert_eq!(json["recognizedBrands"], serde_json::json!([]));
    }

    #[test]
    fn timestamp_truncated_to_micros() {
        let record = PhotoRecord::new("a", "u", 1, None, vec![], vec![]);
        assert_eq!(record.timestamp.timestamp_subsec_nanos() % 1_000, 0);
    }
}
