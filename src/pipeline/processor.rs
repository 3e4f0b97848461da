//! Photo processor: runs one webhook delivery through enrichment.
//!
//! Flow:
//! 1. Pick the largest photo variant and resolve its download URL
//! 2. Safety screen (blocking gate; explicit content stops here)
//! 3. Object detection and brand recognition, concurrently
//! 4. Persist the merged record, then reply to the sender

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::channels::{InboundUpdate, Messenger};
use crate::classify::{BrandRecognizer, ObjectDetector, SafetyScreen};
use crate::error::PipelineError;
use crate::pipeline::reply::{FAILURE_TEXT, REJECTED_TEXT, compose_reply};
use crate::pipeline::types::WebhookOutcome;
use crate::store::{PhotoRecord, PhotoStore};

/// Collaborators the processor drives. All shared, all read-only.
#[derive(Clone)]
pub struct ProcessorDeps {
    pub messenger: Arc<dyn Messenger>,
    pub store: Arc<dyn PhotoStore>,
    pub safety: Arc<dyn SafetyScreen>,
    pub detector: Arc<dyn ObjectDetector>,
    pub brands: Arc<dyn BrandRecognizer>,
}

/// Enrichment orchestrator for inbound photo messages.
pub struct PhotoProcessor {
    deps: ProcessorDeps,
}

impl PhotoProcessor {
    pub fn new(deps: ProcessorDeps) -> Self {
        Self { deps }
    }

    /// Process one inbound update.
    ///
    /// Returns `NoPhoto` without side effects when the update carries no
    /// photo. Only URL resolution and persistence failures abort; the sender
    /// is told about those with a generic failure notice.
    pub async fn process(&self, update: &InboundUpdate) -> Result<WebhookOutcome, PipelineError> {
        let Some(message) = update.message.as_ref() else {
            return Ok(WebhookOutcome::NoPhoto);
        };
        let Some(photos) = message.photo.as_deref() else {
            return Ok(WebhookOutcome::NoPhoto);
        };

        let chat_id = message
            .chat
            .as_ref()
            .map(|c| c.id)
            .ok_or_else(|| PipelineError::MalformedPayload("photo message without chat.id".into()))?;
        let username = message.sender_handle();

        // Platform orders variants smallest to largest; trust it.
        let largest = photos
            .last()
            .ok_or_else(|| PipelineError::MalformedPayload("empty photo array".into()))?;

        info!(
            chat_id,
            username,
            variants = photos.len(),
            file_id = %largest.file_id,
            "Processing photo"
        );

        let photo_url = match self.deps.messenger.resolve_file_url(&largest.file_id).await {
            Ok(url) => url,
            Err(e) => {
                error!(chat_id, error = %e, "Error getting photo URL");
                self.notify(chat_id, FAILURE_TEXT).await;
                return Err(PipelineError::UrlResolution(e));
            }
        };

        let verdict = self.deps.safety.screen(&photo_url).await;
        if verdict.is_explicit {
            info!(
                chat_id,
                explicit_score = ?verdict.explicit_score,
                screen_error = ?verdict.error,
                "Photo rejected by safety screen"
            );
            self.notify(chat_id, REJECTED_TEXT).await;
            return Ok(WebhookOutcome::Rejected);
        }
        let safe_score = verdict.effective_safe_score();

        let (detection, brands) = tokio::join!(
            self.deps.detector.detect(&photo_url),
            self.deps.brands.recognize(&photo_url),
        );
        if let Some(e) = &detection.error {
            warn!(chat_id, error = %e, "Object detection degraded to empty result");
        }
        if let Some(e) = &brands.error {
            warn!(chat_id, error = %e, "Brand recognition degraded to empty result");
        }

        let record = PhotoRecord::new(
            username,
            photo_url,
            chat_id,
            safe_score,
            detection.objects,
            brands.brands,
        );

        let record_id = match self.deps.store.insert_photo(&record).await {
            Ok(id) => id,
            Err(e) => {
                error!(chat_id, error = %e, "Error saving photo record");
                self.notify(chat_id, FAILURE_TEXT).await;
                return Err(PipelineError::Persistence(e));
            }
        };

        let reply = compose_reply(&record.detected_objects, &record.recognized_brands);
        self.notify(chat_id, &reply).await;

        info!(
            chat_id,
            record_id = %record_id,
            objects = record.detected_objects.len(),
            brands = record.recognized_brands.len(),
            "Photo stored"
        );

        Ok(WebhookOutcome::Accepted {
            record_id,
            objects_detected: record.detected_objects.len(),
            brands_recognized: record.recognized_brands.len(),
        })
    }

    /// Best-effort reply; failures are already logged by the messenger.
    async fn notify(&self, chat_id: i64, text: &str) {
        let delivery = self.deps.messenger.send_text(chat_id, text).await;
        if !delivery.is_delivered() {
            warn!(chat_id, "Reply not delivered");
        }
    }
}
