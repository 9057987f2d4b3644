//! Core types for Studio Pandu
//!
//! Defines the fundamental types shared by every layer:
//! - Character slots and their reference images
//! - Aspect ratios (UI choices and the API subset)
//! - Generation results and their status machine
//! - Batch reports

use crate::error::StudioError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Character slot identifier (`char1`..`char4`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharacterId(u8);

impl CharacterId {
    /// Slot identifier for a 1-based slot number
    #[inline]
    #[must_use]
    pub const fn slot(number: u8) -> Self {
        Self(number)
    }

    /// 1-based slot number
    #[inline]
    #[must_use]
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "char{}", self.0)
    }
}

impl FromStr for CharacterId {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("char").unwrap_or(s);
        digits
            .parse::<u8>()
            .ok()
            .filter(|n| *n >= 1)
            .map(Self)
            .ok_or_else(|| StudioError::UnknownCharacter(s.to_string()))
    }
}

/// Encoded reference image sent to the backend as multimodal context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// Base64 payload without any `data:` prefix
    pub data: String,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
}

impl ReferenceImage {
    /// Create new reference image
    #[inline]
    #[must_use]
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// A reusable visual identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Slot identifier
    pub id: CharacterId,
    /// Display name
    pub name: String,
    /// Uploaded reference, if any
    pub reference: Option<ReferenceImage>,
    /// Whether the reference is sent with requests
    pub selected: bool,
}

impl Character {
    /// Create an empty slot
    #[inline]
    #[must_use]
    pub fn empty(id: CharacterId) -> Self {
        Self {
            id,
            name: format!("Character {}", id.number()),
            reference: None,
            selected: false,
        }
    }

    /// Check if the slot contributes a reference to requests
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.selected && self.reference.is_some()
    }
}

/// Aspect ratios accepted by the generation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16
    #[serde(rename = "9:16")]
    Portrait,
    /// 1:1
    #[serde(rename = "1:1")]
    Square,
    /// 4:3
    #[serde(rename = "4:3")]
    Standard,
    /// 3:4
    #[serde(rename = "3:4")]
    StandardPortrait,
}

impl AspectRatio {
    /// Wire form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Standard => "4:3",
            AspectRatio::StandardPortrait => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            "1:1" => Ok(Self::Square),
            "4:3" => Ok(Self::Standard),
            "3:4" => Ok(Self::StandardPortrait),
            other => Err(StudioError::InvalidAspectRatio(other.to_string())),
        }
    }
}

/// Aspect ratio as chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UiAspectRatio {
    /// One of the API ratios
    Fixed(AspectRatio),
    /// Free-form choice, approximated for the API
    Custom,
}

impl UiAspectRatio {
    /// Ratio actually sent to the API (`Custom` falls back to 1:1)
    #[inline]
    #[must_use]
    pub fn to_api(&self) -> AspectRatio {
        match self {
            UiAspectRatio::Fixed(ratio) => *ratio,
            UiAspectRatio::Custom => AspectRatio::Square,
        }
    }

    /// Check if the API ratio differs from what the user picked
    #[inline]
    #[must_use]
    pub fn is_approximated(&self) -> bool {
        matches!(self, UiAspectRatio::Custom)
    }
}

impl Default for UiAspectRatio {
    fn default() -> Self {
        UiAspectRatio::Fixed(AspectRatio::Landscape)
    }
}

impl fmt::Display for UiAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiAspectRatio::Fixed(ratio) => ratio.fmt(f),
            UiAspectRatio::Custom => f.pad("Custom"),
        }
    }
}

impl FromStr for UiAspectRatio {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("custom") {
            return Ok(UiAspectRatio::Custom);
        }
        s.parse().map(UiAspectRatio::Fixed)
    }
}

impl TryFrom<String> for UiAspectRatio {
    type Error = StudioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UiAspectRatio> for String {
    fn from(value: UiAspectRatio) -> Self {
        value.to_string()
    }
}

/// A selectable aspect ratio with its label
#[derive(Debug, Clone, Copy)]
pub struct AspectRatioChoice {
    /// Human-readable label
    pub label: &'static str,
    /// Value
    pub value: UiAspectRatio,
}

/// Ratios offered to the user, in display order
pub const ASPECT_RATIO_CHOICES: [AspectRatioChoice; 5] = [
    AspectRatioChoice {
        label: "16:9 (Landscape)",
        value: UiAspectRatio::Fixed(AspectRatio::Landscape),
    },
    AspectRatioChoice {
        label: "9:16 (Portrait)",
        value: UiAspectRatio::Fixed(AspectRatio::Portrait),
    },
    AspectRatioChoice {
        label: "1:1 (Square)",
        value: UiAspectRatio::Fixed(AspectRatio::Square),
    },
    AspectRatioChoice {
        label: "4:3 (Standard)",
        value: UiAspectRatio::Fixed(AspectRatio::Standard),
    },
    AspectRatioChoice {
        label: "Custom",
        value: UiAspectRatio::Custom,
    },
];

/// Unique generation result identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Ulid);

impl ImageId {
    /// Generate new image ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// Status of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    /// Queued, not yet sent
    Pending,
    /// Request in flight
    Loading,
    /// Image received
    Success,
    /// Request failed
    Error,
}

impl ImageStatus {
    /// Check if `next` is a legal move from this status
    #[inline]
    #[must_use]
    pub fn can_transition_to(&self, next: ImageStatus) -> bool {
        matches!(
            (self, next),
            (ImageStatus::Pending, ImageStatus::Loading)
                | (ImageStatus::Loading, ImageStatus::Success | ImageStatus::Error)
        )
    }

    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImageStatus::Success | ImageStatus::Error)
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImageStatus::Pending => "pending",
            ImageStatus::Loading => "loading",
            ImageStatus::Success => "success",
            ImageStatus::Error => "error",
        };
        f.pad(s)
    }
}

/// One entry of the result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Result identifier
    pub id: ImageId,
    /// Originating prompt
    pub prompt: String,
    /// `data:` URL of the image, set only on success
    pub image_url: Option<String>,
    /// Current status
    pub status: ImageStatus,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Failure message, set only on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GeneratedImage {
    /// Create a pending result for a prompt
    #[inline]
    #[must_use]
    pub fn pending(prompt: impl Into<String>) -> Self {
        Self {
            id: ImageId::new(),
            prompt: prompt.into(),
            image_url: None,
            status: ImageStatus::Pending,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Move to `Loading`
    ///
    /// # Errors
    /// `StudioError::InvalidTransition` unless currently `Pending`
    pub fn start(&mut self) -> Result<(), StudioError> {
        self.transition(ImageStatus::Loading)
    }

    /// Move to `Success` with the received image
    ///
    /// # Errors
    /// `StudioError::InvalidTransition` unless currently `Loading`
    pub fn succeed(&mut self, image_url: String) -> Result<(), StudioError> {
        self.transition(ImageStatus::Success)?;
        self.image_url = Some(image_url);
        Ok(())
    }

    /// Move to `Error` with a failure message
    ///
    /// # Errors
    /// `StudioError::InvalidTransition` unless currently `Loading`
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), StudioError> {
        self.transition(ImageStatus::Error)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Check if the result carries a downloadable image
    #[inline]
    #[must_use]
    pub fn is_downloadable(&self) -> bool {
        self.status == ImageStatus::Success && self.image_url.is_some()
    }

    fn transition(&mut self, next: ImageStatus) -> Result<(), StudioError> {
        if !self.status.can_transition_to(next) {
            return Err(StudioError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Results in the batch
    pub total: usize,
    /// Results in `Success`
    pub succeeded: usize,
    /// Results in `Error`
    pub failed: usize,
    /// Results never sent (left `Pending` by an abort)
    pub not_attempted: usize,
    /// Abort reason, when the batch stopped early
    pub aborted: Option<String>,
}

impl BatchReport {
    /// Tally a result list
    #[must_use]
    pub fn from_results(results: &[GeneratedImage], aborted: Option<String>) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            succeeded: count(ImageStatus::Success),
            failed: count(ImageStatus::Error),
            not_attempted: count(ImageStatus::Pending),
            aborted,
        }
    }

    /// Check if every result succeeded
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.succeeded == self.total
    }
}
