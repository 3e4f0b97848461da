//! HTTP surface: webhook, read endpoint, gallery and health.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::gallery::render_gallery;
use crate::channels::{InboundUpdate, carries_photo};
use crate::error::PipelineError;
use crate::pipeline::{PhotoProcessor, WebhookOutcome};
use crate::store::PhotoStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<PhotoProcessor>,
    pub store: Arc<dyn PhotoStore>,
}

/// Build the full router.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(gallery))
        .route("/health", get(health))
        .route("/api/hello", get(hello).post(echo_hello))
        .route("/api/photos", get(list_photos))
        .route("/api/telegram/webhook", post(telegram_webhook))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "photo-ingest"
    }))
}

async fn hello() -> impl IntoResponse {
    Json(json!({
        "message": "Hello from photo-ingest",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn echo_hello(body: Bytes) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(data) => Json(json!({
            "message": "Received POST request",
            "data": data,
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Invalid JSON on /api/hello");
            error_response(StatusCode::BAD_REQUEST, "Invalid JSON body")
        }
    }
}

// ── Webhook ─────────────────────────────────────────────────────────────

/// POST /api/telegram/webhook
///
/// Updates without `message.photo` are acknowledged before typed decoding,
/// so only the body's JSON syntax and the photo message shape can yield 400.
async fn telegram_webhook(State(state): State<AppState>, body: Bytes) -> Response {
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Rejecting non-JSON webhook payload");
            return error_response(StatusCode::BAD_REQUEST, "Failed to process webhook");
        }
    };
    if !carries_photo(&raw) {
        info!(update_id = ?raw.get("update_id"), "Webhook received without photo");
        return outcome_response(WebhookOutcome::NoPhoto);
    }

    let update: InboundUpdate = match serde_json::from_value(raw) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Rejecting malformed photo payload");
            return error_response(StatusCode::BAD_REQUEST, "Failed to process webhook");
        }
    };
    info!("Webhook received with photo");

    match state.processor.process(&update).await {
        Ok(outcome) => {
            info!(outcome = outcome.label(), "Webhook handled");
            outcome_response(outcome)
        }
        Err(PipelineError::MalformedPayload(reason)) => {
            warn!(reason = %reason, "Rejecting malformed webhook payload");
            error_response(StatusCode::BAD_REQUEST, "Failed to process webhook")
        }
        Err(e) => {
            error!(error = %e, "Webhook processing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process photo")
        }
    }
}

fn outcome_response(outcome: WebhookOutcome) -> Response {
    let body = match outcome {
        WebhookOutcome::NoPhoto => json!({
            "status": "success",
            "message": "Update received, but no photo found"
        }),
        WebhookOutcome::Rejected => json!({
            "status": "rejected",
            "message": "Photo contains explicit content"
        }),
        WebhookOutcome::Accepted {
            objects_detected,
            brands_recognized,
            ..
        } => json!({
            "status": "success",
            "message": "Photo received and processed",
            "objectsDetected": objects_detected,
            "brandsRecognized": brands_recognized
        }),
    };
    Json(body).into_response()
}

// ── Read side ───────────────────────────────────────────────────────────

/// GET /api/photos
async fn list_photos(State(state): State<AppState>) -> Response {
    match state.store.list_photos().await {
        Ok(photos) => Json(photos).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list photos");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch photos")
        }
    }
}

/// GET /
async fn gallery(State(state): State<AppState>) -> Response {
    match state.store.list_photos().await {
        Ok(photos) => Html(render_gallery(&photos)).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load gallery");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Failed to load photos</h1>".to_string()),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::channels::{Delivery, Messenger};
    use crate::classify::{
        BrandRecognizer, BrandResult, DetectedObject, DetectionResult, ObjectDetector,
        SafetyScreen, SafetyVerdict,
    };
    use crate::error::{ChannelError, DatabaseError};
    use crate::pipeline::ProcessorDeps;
    use crate::store::{LibSqlBackend, PhotoRecord};

    struct OkMessenger {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Messenger for OkMessenger {
        async fn resolve_file_url(&self, file_id: &str) -> Result<String, ChannelError> {
            Ok(format!("https://files.test/{file_id}.jpg"))
        }
        async fn send_text(&self, _chat_id: i64, text: &str) -> Delivery {
            self.sent.lock().unwrap().push(text.to_string());
            Delivery::delivered()
        }
    }

    struct FixedSafety(bool);

    #[async_trait]
    impl SafetyScreen for FixedSafety {
        async fn screen(&self, _image_url: &str) -> SafetyVerdict {
            SafetyVerdict {
                is_explicit: self.0,
                explicit_score: Some(if self.0 { 0.99 } else { 0.01 }),
                safe_score: None,
                error: None,
            }
        }
    }

    struct OneObject;

    #[async_trait]
    impl ObjectDetector for OneObject {
        async fn detect(&self, _image_url: &str) -> DetectionResult {
            DetectionResult {
                objects: vec![DetectedObject {
                    label: "cat".into(),
                    confidence: 0.9,
                }],
                error: None,
            }
        }
    }

    struct NoBrands;

    #[async_trait]
    impl BrandRecognizer for NoBrands {
        async fn recognize(&self, _image_url: &str) -> BrandResult {
            BrandResult::default()
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl PhotoStore for BrokenStore {
        async fn insert_photo(&self, _record: &PhotoRecord) -> Result<Uuid, DatabaseError> {
            Err(DatabaseError::Query("disk full".into()))
        }
        async fn list_photos(&self) -> Result<Vec<PhotoRecord>, DatabaseError> {
            Err(DatabaseError::Query("disk full".into()))
        }
    }

    async fn app_with(explicit: bool, store: Arc<dyn PhotoStore>) -> Router {
        let processor = PhotoProcessor::new(ProcessorDeps {
            messenger: Arc::new(OkMessenger {
                sent: Mutex::new(Vec::new()),
            }),
            store: store.clone(),
            safety: Arc::new(FixedSafety(explicit)),
            detector: Arc::new(OneObject),
            brands: Arc::new(NoBrands),
        });
        app_routes(AppState {
            processor: Arc::new(processor),
            store,
        })
    }

    async fn memory_app(explicit: bool) -> Router {
        let store: Arc<dyn PhotoStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        app_with(explicit, store).await
    }

    async fn send(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    const PHOTO: &str =
        r#"{"message":{"chat":{"id":7},"from":{"username":"bob"},"photo":[{"file_id":"s"},{"file_id":"l"}]}}"#;

    #[tokio::test]
    async fn health_reports_service() {
        let (status, body) = send(memory_app(false).await, "GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body), json!({"status": "ok", "service": "photo-ingest"}));
    }

    #[tokio::test]
    async fn hello_get_and_echo() {
        let (status, body) = send(memory_app(false).await, "GET", "/api/hello", "").await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&body);
        assert!(v["message"].is_string());
        assert!(v["timestamp"].is_string());

        let (status, body) =
            send(memory_app(false).await, "POST", "/api/hello", r#"{"a":1}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["data"], json!({"a": 1}));

        let (status, body) = send(memory_app(false).await, "POST", "/api/hello", "{nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_of(&body)["error"].is_string());
    }

    #[tokio::test]
    async fn webhook_accepts_and_stores() {
        let store: Arc<dyn PhotoStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let app = app_with(false, store.clone()).await;

        let (status, body) = send(app.clone(), "POST", "/api/telegram/webhook", PHOTO).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_of(&body),
            json!({
                "status": "success",
                "message": "Photo received and processed",
                "objectsDetected": 1,
                "brandsRecognized": 0
            })
        );

        let (status, body) = send(app, "GET", "/api/photos", "").await;
        assert_eq!(status, StatusCode::OK);
        let photos = json_of(&body);
        assert_eq!(photos.as_array().unwrap().len(), 1);
        assert_eq!(photos[0]["username"], "bob");
        assert_eq!(photos[0]["photoUrl"], "https://files.test/l.jpg");
        assert_eq!(photos[0]["chatId"], 7);
        assert_eq!(photos[0]["detectedObjects"][0]["label"], "cat");
        assert_eq!(photos[0]["recognizedBrands"], json!([]));
    }

    #[tokio::test]
    async fn webhook_rejects_explicit() {
        let store: Arc<dyn PhotoStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let app = app_with(true, store.clone()).await;

        let (status, body) = send(app, "POST", "/api/telegram/webhook", PHOTO).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["status"], "rejected");
        assert!(store.list_photos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_without_photo_is_success() {
        let (status, body) = send(
            memory_app(false).await,
            "POST",
            "/api/telegram/webhook",
            r#"{"message":{"chat":{"id":1},"text":"hi"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["message"], "Update received, but no photo found");
    }

    #[tokio::test]
    async fn webhook_without_photo_ignores_other_field_shapes() {
        for body in [
            r#"{"message":{"chat":{"id":"abc"},"text":"hi"}}"#,
            r#"{"message":{"chat":{},"text":"hi"}}"#,
            r#"{"update_id":"ten","message":{"chat":{"id":1}}}"#,
            r#"{"message":{"chat":{"id":1},"from":{"username":42}}}"#,
            r#"{"message":{"message_id":"five","chat":{"id":1}}}"#,
            r#"{"message":{"chat":{"id":1},"photo":null}}"#,
            r#"{"message":"text only"}"#,
            "[]",
        ] {
            let (status, resp) =
                send(memory_app(false).await, "POST", "/api/telegram/webhook", body).await;
            assert_eq!(status, StatusCode::OK, "body: {body}");
            assert_eq!(
                json_of(&resp),
                json!({"status": "success", "message": "Update received, but no photo found"})
            );
        }
    }

    #[tokio::test]
    async fn photo_with_unrelated_extra_fields_is_processed() {
        let body = r#"{"update_id":"ten","message":{"message_id":"five","chat":{"id":3},
            "photo":[{"file_id":"x","file_unique_id":7,"width":"wide"}]}}"#;
        let (status, resp) =
            send(memory_app(false).await, "POST", "/api/telegram/webhook", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&resp)["message"], "Photo received and processed");
    }

    #[tokio::test]
    async fn webhook_malformed_is_400() {
        for body in [
            "not json",
            r#"{"message":{"chat":{"id":1},"photo":"x"}}"#,
            r#"{"message":{"chat":{"id":1},"photo":[{"width":1}]}}"#,
            r#"{"message":{"chat":{"id":1},"photo":[]}}"#,
            r#"{"message":{"photo":[{"file_id":"a"}]}}"#,
        ] {
            let (status, resp) =
                send(memory_app(false).await, "POST", "/api/telegram/webhook", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json_of(&resp), json!({"error": "Failed to process webhook"}));
        }
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let app = app_with(false, Arc::new(BrokenStore)).await;

        let (status, body) = send(app.clone(), "POST", "/api/telegram/webhook", PHOTO).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_of(&body), json!({"error": "Failed to process photo"}));

        let (status, body) = send(app.clone(), "GET", "/api/photos", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_of(&body), json!({"error": "Failed to fetch photos"}));

        let (status, _) = send(app, "GET", "/", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn gallery_renders_stored_photos() {
        let store: Arc<dyn PhotoStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let app = app_with(false, store).await;
        send(app.clone(), "POST", "/api/telegram/webhook", PHOTO).await;

        let (status, body) = send(app, "GET", "/", "").await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("@bob"));
        assert!(html.contains("https://files.test/l.jpg"));
        assert!(html.contains("99%"));
    }
}
