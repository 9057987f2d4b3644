//! Error types for Studio Pandu
//!
//! Two layers:
//! - `GenerationError` is what an `ImageGenerator` backend reports for one request
//! - `StudioError` covers everything the session, roster, prompt list and export can reject

use crate::types::{ImageId, ImageStatus};
use std::path::PathBuf;

/// Message surfaced when a batch stops on an authorization failure
pub const AUTHORIZATION_ABORT_MESSAGE: &str =
    "Authorization Error: Please check your API Key configuration.";

/// Main Studio error type
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// No prompt with visible text was entered
    #[error("Please enter at least one prompt.")]
    NoPrompts,

    /// A batch is already running for this session
    #[error("a generation batch is already running")]
    AlreadyGenerating,

    /// Prompt list is at capacity
    #[error("prompt limit reached (max: {0})")]
    TooManyPrompts(usize),

    /// Prompt index out of range
    #[error("no prompt at index {index} (have {len})")]
    PromptIndex { index: usize, len: usize },

    /// Character slot does not exist
    #[error("unknown character slot: {0}")]
    UnknownCharacter(String),

    /// Roster is full
    #[error("all {0} character slots are in use")]
    RosterFull(usize),

    /// Reference file cannot be used as an image
    #[error("unsupported reference image {path}: {reason}")]
    UnsupportedImage { path: PathBuf, reason: String },

    /// Illegal status transition
    #[error("invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: ImageId,
        from: ImageStatus,
        to: ImageStatus,
    },

    /// Result has no image to write
    #[error("image {0} is not downloadable (no successful result)")]
    NotDownloadable(ImageId),

    /// Image URL is not a base64 data URL
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Unknown aspect ratio text
    #[error("unknown aspect ratio: {0}")]
    InvalidAspectRatio(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Backend failure
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Filesystem failure
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StudioError {
    /// Wrap an IO error with the path it happened at
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if error is an authorization failure
    #[inline]
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Generation(e) if e.is_authorization())
    }

    /// Check if error was caused by user input rather than the backend or filesystem
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NoPrompts
                | Self::TooManyPrompts(_)
                | Self::PromptIndex { .. }
                | Self::UnknownCharacter(_)
                | Self::RosterFull(_)
                | Self::UnsupportedImage { .. }
                | Self::InvalidAspectRatio(_)
        )
    }
}

/// Errors reported by an image generation backend for a single request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// No API key configured
    #[error("API Key not available")]
    MissingApiKey,

    /// Backend refused the credentials
    #[error("permission denied (403): {0}")]
    PermissionDenied(String),

    /// Non-success HTTP status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request could not be delivered
    #[error("transport error: {0}")]
    Transport(String),

    /// Response carried no inline image
    #[error("No image data found in response")]
    NoImageData,

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    Parse(String),
}

impl GenerationError {
    /// Check if this failure should stop the rest of a batch
    ///
    /// A missing key counts: every later request would fail the same way.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        match self {
            Self::MissingApiKey | Self::PermissionDenied(_) => true,
            Self::Api { status: 403, .. } => true,
            Self::Api { message, .. } | Self::Transport(message) | Self::Parse(message) => {
                message.contains("403") || message.contains("PERMISSION_DENIED")
            }
            Self::NoImageData => false,
        }
    }
}
