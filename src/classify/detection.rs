//! General object detection.

use async_trait::async_trait;
use tracing::{info, warn};

use super::upstream::{ApiResponse, UpstreamClient};
use super::{DETECTION_THRESHOLD, DetectedObject, DetectionResult, ObjectDetector};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;

const SERVICE: &str = "general-det";

/// Object detector backed by an API4AI-style general detection endpoint.
pub struct Api4AiDetector {
    upstream: UpstreamClient,
}

impl Api4AiDetector {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(SERVICE, config),
        }
    }
}

#[async_trait]
impl ObjectDetector for Api4AiDetector {
    async fn detect(&self, image_url: &str) -> DetectionResult {
        let objects = self
            .upstream
            .submit(image_url)
            .await
            .and_then(|response| objects_from(&response));

        match objects {
            Ok(objects) => {
                info!(count = objects.len(), "Object detection result");
                DetectionResult {
                    objects,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Error detecting objects in image");
                DetectionResult::failed(e.to_string())
            }
        }
    }
}

/// Every class above the threshold, object by object.
fn objects_from(response: &ApiResponse) -> Result<Vec<DetectedObject>, ClassifyError> {
    let entity = response.first_entity(SERVICE)?;
    let mut detected = Vec::new();

    for object in entity.objects.iter().flatten() {
        let Some(classes) = object.entities.first().and_then(|e| e.classes.as_ref()) else {
            continue;
        };

        let mut kept: Vec<DetectedObject> = classes
            .iter()
            .filter(|(_, confidence)| **confidence > DETECTION_THRESHOLD)
            .map(|(label, confidence)| DetectedObject {
                label: label.clone(),
                confidence: confidence.min(1.0),
            })
            .collect();
        kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        detected.extend(kept);
    }

    Ok(detected)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::classify::upstream::test_support::start;
    use crate::config::UploadStrategy;

    fn response(objects: serde_json::Value) -> ApiResponse {
        serde_json::from_value(serde_json::json!({
            "results": [{
                "status": {"code": "ok"},
                "entities": [{"kind": "objects", "name": "general-detector", "objects": objects}]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn keeps_only_confidences_above_half() {
        let objects = objects_from(&response(serde_json::json!([
            {"box": [0.1, 0.1, 0.5, 0.5], "entities": [{"kind": "classes", "classes": {"cat": 0.92}}]},
            {"box": [0.2, 0.2, 0.3, 0.3], "entities": [{"kind": "classes", "classes": {"dog": 0.5}}]},
            {"box": [0.4, 0.4, 0.1, 0.1], "entities": [{"kind": "classes", "classes": {"cup": 0.31}}]}
        ])))
        .unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].label, "cat");
        assert!(objects.iter().all(|o| o.confidence > DETECTION_THRESHOLD));
    }

    #[test]
    fn classes_within_object_ordered_by_confidence() {
        let objects = objects_from(&response(serde_json::json!([
            {"entities": [{"classes": {"animal": 0.6, "cat": 0.9}}]},
            {"entities": [{"classes": {"car": 0.7}}]}
        ])))
        .unwrap();

        let labels: Vec<&str> = objects.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["cat", "animal", "car"]);
    }

    #[test]
    fn no_objects_is_empty_not_error() {
        let objects = objects_from(&response(serde_json::json!([]))).unwrap();
        assert!(objects.is_empty());

        let missing: ApiResponse = serde_json::from_value(serde_json::json!({
            "results": [{"entities": [{"kind": "objects"}]}]
        }))
        .unwrap();
        assert!(objects_from(&missing).unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_error_degrades_to_empty() {
        let stub = start(StatusCode::BAD_GATEWAY, serde_json::json!({})).await;
        let result = Api4AiDetector::new(stub.config(UploadStrategy::Url))
            .detect(&stub.image_url())
            .await;
        assert!(result.objects.is_empty());
        assert!(result.error.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn end_to_end_detection() {
        let stub = start(
            StatusCode::OK,
            serde_json::json!({
                "results": [{"status": {"code": "ok"}, "entities": [{"objects": [
                    {"entities": [{"classes": {"person": 0.88}}]}
                ]}]}]
            }),
        )
        .await;
        let result = Api4AiDetector::new(stub.config(UploadStrategy::Multipart))
            .detect(&stub.image_url())
            .await;
        assert!(result.error.is_none());
        assert_eq!(
            result.objects,
            vec![DetectedObject {
                label: "person".into(),
                confidence: 0.88
            }]
        );
    }
}
