//! Reference image loading
//!
//! Reads an image file and encodes it for inline transport. The MIME type comes from
//! the file extension.

use crate::error::StudioError;
use crate::types::ReferenceImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::Path;

/// MIME type for a supported image extension
#[must_use]
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => return None,
    };
    Some(mime)
}

/// Encode raw image bytes as a reference
#[must_use]
pub fn encode_reference(bytes: &[u8], mime_type: &str) -> ReferenceImage {
    ReferenceImage::new(STANDARD.encode(bytes), mime_type)
}

/// Load a reference image from disk
///
/// # Errors
/// - `StudioError::UnsupportedImage` for unknown extensions or empty files
/// - `StudioError::Io` if the file cannot be read
pub async fn load_reference(path: impl AsRef<Path>) -> Result<ReferenceImage, StudioError> {
    let path = path.as_ref();
    let mime = mime_type_for(path).ok_or_else(|| StudioError::UnsupportedImage {
        path: path.to_path_buf(),
        reason: "unrecognised image extension".to_string(),
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| StudioError::io(path, e))?;
    if bytes.is_empty() {
        return Err(StudioError::UnsupportedImage {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), mime, "loaded reference image");
    Ok(encode_reference(&bytes, mime))
}
