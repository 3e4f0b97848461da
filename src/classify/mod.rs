//! Image classification clients.
//!
//! Three upstream services are consulted per photo: a content-safety
//! screen, a general object detector and a brand recognizer. None of the
//! clients ever fails outright. Every transport or parsing problem is
//! folded into the `error` field of the returned result, with a neutral
//! payload (or, for the safety screen, a fail-closed verdict).

pub mod brands;
pub mod detection;
pub mod safety;
pub mod upstream;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use brands::Api4AiBrands;
pub use detection::Api4AiDetector;
pub use safety::Api4AiSafety;
pub use upstream::UpstreamClient;

/// Explicit score above which a photo is rejected.
pub const EXPLICIT_THRESHOLD: f64 = 0.95;

/// Detector labels must score strictly above this to be kept.
pub const DETECTION_THRESHOLD: f64 = 0.5;

/// Result of the content-safety screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyVerdict {
    pub is_explicit: bool,
    pub explicit_score: Option<f64>,
    /// Safe score as reported by the upstream, if it reported one.
    pub safe_score: Option<f64>,
    pub error: Option<String>,
}

impl SafetyVerdict {
    /// Verdict used whenever the screen could not produce an answer.
    pub fn fail_closed(error: impl Into<String>) -> Self {
        Self {
            is_explicit: true,
            explicit_score: None,
            safe_score: None,
            error: Some(error.into()),
        }
    }

    /// Safe score, falling back to `1 - explicit_score` when the upstream
    /// did not report one.
    pub fn effective_safe_score(&self) -> Option<f64> {
        self.safe_score
            .or_else(|| self.explicit_score.map(|s| 1.0 - s))
    }
}

/// A label kept from the object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f64,
}

/// Result of the object detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub objects: Vec<DetectedObject>,
    pub error: Option<String>,
}

impl DetectionResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            objects: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Result of the brand recognizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrandResult {
    pub brands: Vec<String>,
    pub error: Option<String>,
}

impl BrandResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            brands: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Content-safety gate.
#[async_trait]
pub trait SafetyScreen: Send + Sync {
    async fn screen(&self, image_url: &str) -> SafetyVerdict;
}

/// General object detection.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image_url: &str) -> DetectionResult;
}

/// Brand/logo recognition.
#[async_trait]
pub trait BrandRecognizer: Send + Sync {
    async fn recognize(&self, image_url: &str) -> BrandResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_closed_is_explicit() {
        let verdict = SafetyVerdict::fail_closed("timeout");
        assert!(verdict.is_explicit);
        assert_eq!(verdict.error.as_deref(), Some("timeout"));
        assert_eq!(verdict.effective_safe_score(), None);
    }

    #[test]
    fn safe_score_prefers_reported_value() {
        let verdict = SafetyVerdict {
            is_explicit: false,
            explicit_score: Some(0.2),
            safe_score: Some(0.7),
            error: None,
        };
        assert_eq!(verdict.effective_safe_score(), Some(0.7));
    }

    #[test]
    fn safe_score_falls_back_to_complement() {
        let verdict = SafetyVerdict {
            is_explicit: false,
            explicit_score: Some(0.25),
            safe_score: None,
            error: None,
        };
        assert_eq!(verdict.effective_safe_score(), Some(0.75));
    }

    #[test]
    fn failed_results_are_empty() {
        let detection = DetectionResult::failed("boom");
        assert!(detection.objects.is_empty());
        assert!(detection.error.is_some());

        let brands = BrandResult::failed("boom");
        assert!(brands.brands.is_empty());
        assert!(brands.error.is_some());
    }
}
