//! Gemini `generateContent` client
//!
//! One POST per image. Credentials are read from the config on every request so a
//! key supplied after construction is picked up.

use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use pandu_core::{GenerateImageParams, GenerationError, ImageGenerator, StudioConfig};
use reqwest::StatusCode;
use std::time::Duration;

/// Connection settings for the Gemini backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    /// API key; `None` fails every request with `MissingApiKey`
    pub api_key: Option<String>,
    /// API root, without trailing slash
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Output resolution hint
    pub image_size: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Derive from studio configuration, resolving the key from the environment
    #[must_use]
    pub fn from_studio(config: &StudioConfig) -> Self {
        Self {
            api_key: config.resolve_api_key(),
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            model: config.api.model.clone(),
            image_size: config.api.image_size.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Endpoint for the configured model
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        let studio = StudioConfig::default();
        Self {
            api_key: None,
            base_url: studio.api.base_url,
            model: studio.api.model,
            image_size: studio.api.image_size,
            timeout: Duration::from_secs(studio.request_timeout_secs),
        }
    }
}

/// `ImageGenerator` over the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// Create a client
    ///
    /// # Errors
    /// `GenerationError::Transport` if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { config, http })
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, params: GenerateImageParams) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let body = GenerateContentRequest::new(
            &params.prompt,
            &params.reference_images,
            params.aspect_ratio.to_api(),
            &self.config.image_size,
        );

        tracing::debug!(
            model = %self.config.model,
            references = params.reference_images.len(),
            aspect_ratio = %params.aspect_ratio.to_api(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = classify_failure(status, &text);
            tracing::warn!(status = status.as_u16(), error = %err, "generateContent rejected");
            return Err(err);
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| GenerationError::Parse(e.to_string()))?;

        let blob = parsed.first_image().ok_or(GenerationError::NoImageData)?;
        let mime = if blob.mime_type.is_empty() {
            "image/png"
        } else {
            blob.mime_type.as_str()
        };
        Ok(format!("data:{mime};base64,{}", blob.data))
    }
}

/// Map a non-success response onto a `GenerationError`
#[must_use]
pub fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let error = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let denied = error
        .as_ref()
        .is_some_and(|e| e.status == "PERMISSION_DENIED");

    if status == StatusCode::FORBIDDEN || denied {
        GenerationError::PermissionDenied(message)
    } else {
        GenerationError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

fn transport_error(err: reqwest::Error) -> GenerationError {
    GenerationError::Transport(err.to_string())
}
