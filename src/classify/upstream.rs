//! Shared transport for API4AI-style classification endpoints.
//!
//! Submits an image either as uploaded bytes or as a URL, authenticates
//! with a configured header, and decodes the common
//! `{results: [{status, entities: [...]}]}` envelope.

use std::collections::BTreeMap;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::config::{ClassifierConfig, UploadStrategy};
use crate::error::ClassifyError;

/// Response envelope shared by all three services.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub results: Vec<ApiResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResult {
    #[serde(default)]
    pub status: Option<ApiStatus>,
    #[serde(default)]
    pub entities: Vec<ApiEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEntity {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub classes: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub objects: Option<Vec<ApiObject>>,
    #[serde(default)]
    pub strings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiObject {
    #[serde(default, rename = "box")]
    pub bounding_box: Option<Vec<f64>>,
    #[serde(default)]
    pub entities: Vec<ApiEntity>,
}

impl ApiResponse {
    /// The first entity of the first result, after checking the result's
    /// status.
    pub fn first_entity(&self, service: &str) -> Result<&ApiEntity, ClassifyError> {
        let result = self
            .results
            .first()
            .ok_or_else(|| invalid(service, "no results"))?;

        if let Some(status) = &result.status {
            if status.code.eq_ignore_ascii_case("failure") {
                return Err(ClassifyError::Upstream {
                    service: service.to_string(),
                    reason: status
                        .message
                        .clone()
                        .unwrap_or_else(|| "unspecified failure".into()),
                });
            }
        }

        result
            .entities
            .first()
            .ok_or_else(|| invalid(service, "no entities"))
    }
}

pub(crate) fn invalid(service: &str, reason: impl Into<String>) -> ClassifyError {
    ClassifyError::InvalidResponse {
        service: service.to_string(),
        reason: reason.into(),
    }
}

/// HTTP client bound to one classification endpoint.
pub struct UpstreamClient {
    service: &'static str,
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(service: &'static str, config: ClassifierConfig) -> Self {
        Self {
            service,
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Submit an image to the endpoint and decode the envelope.
    pub async fn submit(&self, image_url: &str) -> Result<ApiResponse, ClassifyError> {
        let form = match self.config.upload {
            UploadStrategy::Multipart => self.image_form(image_url).await?,
            UploadStrategy::Url => Form::new().text("url", image_url.to_string()),
        };

        let resp = self
            .client
            .post(&self.config.endpoint)
            .header(self.config.key_header.as_str(), self.config.credential())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::RequestFailed {
                service: self.service.to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClassifyError::Status {
                service: self.service.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ApiResponse = resp
            .json()
            .await
            .map_err(|e| invalid(self.service, e.without_url().to_string()))?;

        debug!(service = self.service, results = body.results.len(), "Upstream responded");
        Ok(body)
    }

    /// Download the image and wrap it as the `image` multipart part.
    async fn image_form(&self, image_url: &str) -> Result<Form, ClassifyError> {
        let resp = self
            .client
            .get(image_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ClassifyError::ImageFetch(e.without_url().to_string()))?;

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClassifyError::ImageFetch(e.without_url().to_string()))?;

        let part = Part::bytes(bytes.to_vec())
            .file_name("image")
            .mime_str(&content_type)
            .map_err(|e| ClassifyError::ImageFetch(format!("bad content type: {e}")))?;

        Ok(Form::new().part("image", part))
    }
}
