//! Image generator seam
//!
//! The generation API is an external collaborator. Backends implement
//! `ImageGenerator`; the queue only ever talks to this trait.

use crate::error::GenerationError;
use crate::types::{ReferenceImage, UiAspectRatio};
use async_trait::async_trait;

/// Inputs for one generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateImageParams {
    /// Scene description
    pub prompt: String,
    /// Character references, sent ahead of the prompt
    pub reference_images: Vec<ReferenceImage>,
    /// Requested framing
    pub aspect_ratio: UiAspectRatio,
}

impl GenerateImageParams {
    /// Create params for a prompt with no references
    #[inline]
    #[must_use]
    pub fn new(prompt: impl Into<String>, aspect_ratio: UiAspectRatio) -> Self {
        Self {
            prompt: prompt.into(),
            reference_images: Vec::new(),
            aspect_ratio,
        }
    }

    /// With reference images
    #[inline]
    #[must_use]
    pub fn with_references(mut self, references: Vec<ReferenceImage>) -> Self {
        self.reference_images = references;
        self
    }
}

/// A backend that turns a prompt plus references into an image
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Generate one image
    ///
    /// Returns a `data:image/...;base64,` URL.
    ///
    /// # Errors
    /// Any `GenerationError`; `is_authorization()` failures stop the batch.
    async fn generate(&self, params: GenerateImageParams) -> Result<String, GenerationError>;
}
