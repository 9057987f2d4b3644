//! Export of generated images
//!
//! Filenames follow `{sequence:03}_{DD}{Mon}{YYYY}.png`, where the sequence is the
//! 1-based position of the result in the list.

use crate::error::StudioError;
use crate::types::GeneratedImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Datelike, Local, NaiveDate};
use std::path::{Path, PathBuf};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Filename for the result at `index` (0-based) on `date`
#[must_use]
pub fn generate_filename(index: usize, date: NaiveDate) -> String {
    format!(
        "{:03}_{:02}{}{}.png",
        index + 1,
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Filename for the result at `index` using today's local date
#[must_use]
pub fn filename_for_today(index: usize) -> String {
    generate_filename(index, Local::now().date_naive())
}

/// Decoded `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Declared MIME type
    pub mime_type: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

/// Decode a `data:<mime>;base64,<payload>` URL
///
/// # Errors
/// `StudioError::InvalidDataUrl` if the URL is not base64 data
pub fn decode_data_url(url: &str) -> Result<DataUrl, StudioError> {
    let invalid = |reason: &str| StudioError::InvalidDataUrl(reason.to_string());

    let rest = url.strip_prefix("data:").ok_or_else(|| invalid("missing data: scheme"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing payload"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("payload is not base64"))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| StudioError::InvalidDataUrl(e.to_string()))?;

    Ok(DataUrl {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

/// Write one successful result into `dir`
///
/// # Errors
/// - `StudioError::NotDownloadable` unless the result succeeded
/// - `StudioError::InvalidDataUrl` for a malformed image URL
/// - `StudioError::Io` on filesystem failures
pub async fn download(
    image: &GeneratedImage,
    index: usize,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, StudioError> {
    let url = match (&image.image_url, image.is_downloadable()) {
        (Some(url), true) => url,
        _ => return Err(StudioError::NotDownloadable(image.id)),
    };
    let decoded = decode_data_url(url)?;

    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StudioError::io(dir, e))?;

    let path = dir.join(filename_for_today(index));
    tokio::fs::write(&path, &decoded.bytes)
        .await
        .map_err(|e| StudioError::io(&path, e))?;

    tracing::info!(id = %image.id, path = %path.display(), bytes = decoded.bytes.len(), "image saved");
    Ok(path)
}

/// Write every successful result into `dir`
///
/// Each file is named after its result's position, so failed prompts leave gaps in
/// the sequence. Individual write failures are logged and skipped.
pub async fn download_all(results: &[GeneratedImage], dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let dir = dir.as_ref();
    let mut written = Vec::new();

    for (index, image) in results.iter().enumerate() {
        if !image.is_downloadable() {
            continue;
        }
        match download(image, index, dir).await {
            Ok(path) => written.push(path),
            Err(e) => tracing::error!(id = %image.id, error = %e, "download failed"),
        }
    }

    written
}
