//! Brand recognition. Only labels are kept.

use async_trait::async_trait;
use tracing::{info, warn};

use super::upstream::{ApiResponse, UpstreamClient};
use super::{BrandRecognizer, BrandResult};
use crate::config::ClassifierConfig;
use crate::error::ClassifyError;

const SERVICE: &str = "brand-det";

/// Brand recognizer backed by an API4AI-style brand detection endpoint.
pub struct Api4AiBrands {
    upstream: UpstreamClient,
}

impl Api4AiBrands {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            upstream: UpstreamClient::new(SERVICE, config),
        }
    }
}

#[async_trait]
impl BrandRecognizer for Api4AiBrands {
    async fn recognize(&self, image_url: &str) -> BrandResult {
        let brands = self
            .upstream
            .submit(image_url)
            .await
            .and_then(|response| brands_from(&response));

        match brands {
            Ok(brands) => {
                info!(?brands, "Brand recognition result");
                BrandResult {
                    brands,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Error recognizing brands in image");
                BrandResult::failed(e.to_string())
            }
        }
    }
}

fn brands_from(response: &ApiResponse) -> Result<Vec<String>, ClassifyError> {
    let entity = response.first_entity(SERVICE)?;
    Ok(entity
        .strings
        .iter()
        .flatten()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
