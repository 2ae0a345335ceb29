//! Image generation through an external model, and upload encoding.
//!
//! Generation never fails from the caller's point of view: without a
//! backend, or when the backend errors, a 1x1 transparent PNG is returned.

use crate::config::ImageBackendChoice;
use crate::utils::data_uri;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PROMPT: &str = "transparent product mockup";
pub const DEFAULT_MODEL: &str = "stabilityai/stable-diffusion-xl-base-1.0";
const HF_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";

/// 1x1 transparent PNG served when no generated image is available
pub const PLACEHOLDER_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR4nGNgYAAAAAMAASsJTYQAAAAASUVORK5CYII=";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("image backend returned status {0}")]
    Status(u16),

    #[error("image backend returned no data")]
    Empty,
}

/// Where a generated image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSource {
    ExternalModel,
    FallbackDemo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime: String,
    /// base64 data URI
    pub data: String,
    pub source: ImageSource,
}

impl GeneratedImage {
    pub fn placeholder() -> Self {
        Self {
            mime: "image/png".to_string(),
            data: PLACEHOLDER_PNG.to_string(),
            source: ImageSource::FallbackDemo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub data: String,
}

/// Text-to-image generator
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Raw PNG bytes for `prompt`
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError>;
}

/// Hosted inference API backend
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HuggingFaceBackend {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(
            api_key,
            timeout,
            &format!("{}/{}", HF_INFERENCE_URL, DEFAULT_MODEL),
        )
    }

    /// Backend posting to a specific model URL
    pub fn with_endpoint(
        api_key: &str,
        timeout: Duration,
        endpoint: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ImageBackend for HuggingFaceBackend {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ImageError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "options": { "wait_for_model": true },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(bytes.to_vec())
    }
}

/// Builds the backend matching the resolved capability
pub fn backend_for(
    choice: &ImageBackendChoice,
    timeout: Duration,
) -> Result<Option<Arc<dyn ImageBackend>>, reqwest::Error> {
    Ok(match choice {
        ImageBackendChoice::External { api_key } => {
            Some(Arc::new(HuggingFaceBackend::new(api_key, timeout)?))
        }
        ImageBackendChoice::Fallback => None,
    })
}

/// Generates an image, falling back to the placeholder on any failure
pub async fn generate_image(backend: Option<&dyn ImageBackend>, prompt: &str) -> GeneratedImage {
    let prompt = match prompt.trim() {
        "" => DEFAULT_PROMPT,
        p => p,
    };

    let Some(backend) = backend else {
        return GeneratedImage::placeholder();
    };

    match backend.generate(prompt).await {
        Ok(bytes) => GeneratedImage {
            mime: "image/png".to_string(),
            data: data_uri("image/png", &bytes),
            source: ImageSource::ExternalModel,
        },
        Err(e) => {
            ::log::warn!("image generation failed, using placeholder: {}", e);
            GeneratedImage::placeholder()
        }
    }
}

/// Encodes uploaded bytes as a PNG data URI without inspecting them
pub fn encode_upload(bytes: &[u8]) -> UploadedImage {
    UploadedImage {
        data: data_uri("image/png", bytes),
    }
}
