//! Explicit-content screen.
//!
//! Fail-closed: anything short of a clean upstream answer yields
//! `is_explicit = true`.

use async_trait::async_trait;
use tracing::{info, warn};

use super::upstream::{ApiResponse, UpstreamClient, invalid};
use super::{EXPLICIT_THRESHOLD, SafetyScreen, SafetyVerdict};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;

const SERVICE: &str = "nsfw";

/// Safety screen backed by an API4AI-style NSFW endpoint.
pub struct Api4AiSafety {
    upstream: UpstreamClient,
}

impl Api4AiSafety {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(SERVICE, config),
        }
    }
}

#[async_trait]
impl SafetyScreen for Api4AiSafety {
    async fn screen(&self, image_url: &str) -> SafetyVerdict {
        let verdict = self
            .upstream
            .submit(image_url)
            .await
            .and_then(|response| verdict_from(&response));

        match verdict {
            Ok(verdict) => {
                info!(
                    explicit = verdict.is_explicit,
                    explicit_score = ?verdict.explicit_score,
                    safe_score = ?verdict.safe_score,
                    "Safety screen result"
                );
                verdict
            }
            Err(e) => {
                warn!(error = %e, "Error checking image for explicit content");
                SafetyVerdict::fail_closed(e.to_string())
            }
        }
    }
}

/// Interpret the `classes` map of the first entity.
fn verdict_from(response: &ApiResponse) -> Result<SafetyVerdict, ClassifyError> {
    let classes = response
        .first_entity(SERVICE)?
        .classes
        .as_ref()
        .ok_or_else(|| invalid(SERVICE, "missing classes"))?;

    let explicit_score = classes.get("nsfw").copied().unwrap_or(0.0).clamp(0.0, 1.0);
    let safe_score = classes
        .get("sfw")
        .or_else(|| classes.get("neutral"))
        .map(|s| s.clamp(0.0, 1.0));

    Ok(SafetyVerdict {
        is_explicit: explicit_score > EXPLICIT_THRESHOLD,
        explicit_score: Some(explicit_score),
        safe_score,
        error: None,
    })
}
