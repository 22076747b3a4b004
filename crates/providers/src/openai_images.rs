//! OpenAI image generation backend.
//!
//! Calls `/images/generations` and returns whatever media the endpoint
//! produced, either as hosted URLs or inline base64 data URIs. Deciding
//! whether an empty result is fatal is the caller's job.

use std::time::Duration;

use async_trait::async_trait;
use plume_core::error::ProviderError;
use plume_core::provider::{ImageBackend, ImageRequest, MediaRef};
use serde::Deserialize;
use tracing::{debug, warn};

/// Default timeout for image generation requests.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default image model.
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";

pub struct OpenAiImageBackend {
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiImageBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: DEFAULT_IMAGE_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    /// Create a backend against the hosted OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("https://api.openai.com/v1", api_key)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ImageBackend for OpenAiImageBackend {
    async fn synthesize(&self, request: ImageRequest) -> Result<Vec<MediaRef>, ProviderError> {
        let url = format!("{}/images/generations", self.base_url);

        if !request.references.is_empty() {
            // The generations endpoint has no reference-image parameter.
            debug!(
                refs = request.references.len(),
                "Reference media not supported by this backend, ignoring"
            );
        }

        let body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "n": 1,
        });

        debug!(model = %self.model, "Sending image generation request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        match status {
            200 => {}
            429 => {
                return Err(ProviderError::RateLimited {
                    retry_after_secs: 5,
                });
            }
            401 | 403 => {
                return Err(ProviderError::AuthenticationFailed(
                    "Invalid API key or insufficient permissions".into(),
                ));
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                warn!(status, body = %body, "Image backend returned error");
                return Err(ProviderError::ApiError {
                    status_code: status,
                    message: body,
                });
            }
        }

        let api_response: ImagesApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse image response: {e}"),
            })?;

        Ok(api_response
            .data
            .into_iter()
            .filter_map(|item| match (item.url, item.b64_json) {
                (Some(url), _) => Some(MediaRef::url(url)),
                (None, Some(b64)) => Some(MediaRef::url(format!("data:image/png;base64,{b64}"))),
                (None, None) => None,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ImagesApiResponse {
    #[serde(default)]
    data: Vec<ImageItem>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}
