//! Studio configuration
//!
//! Layered: defaults, then an optional TOML file, then environment overrides.
//! Front ends apply their own flags last.

use crate::error::StudioError;
use crate::types::UiAspectRatio;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "pandu.toml";

/// Fallback API key variable
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Explicit API key (takes precedence over the environment)
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API root
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Output resolution hint (`1K`, `2K`, `4K`)
    pub image_size: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-pro-image-preview".to_string(),
            image_size: "4K".to_string(),
        }
    }
}

/// Studio configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Backend settings
    pub api: ApiConfig,
    /// Where downloads go
    pub output_dir: PathBuf,
    /// Aspect ratio when none is requested
    pub default_aspect_ratio: UiAspectRatio,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            output_dir: PathBuf::from("pandu-output"),
            default_aspect_ratio: UiAspectRatio::default(),
            request_timeout_secs: 300,
        }
    }
}

impl StudioConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With output directory
    #[inline]
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// With explicit API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api.api_key = Some(key.into());
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `StudioError::Config` on invalid TOML or unknown values
    pub fn from_toml_str(text: &str) -> Result<Self, StudioError> {
        toml::from_str(text).map_err(|e| StudioError::Config(e.to_string()))
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// `StudioError::Io` if unreadable, `StudioError::Config` if invalid
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StudioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StudioError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Load defaults + file + process environment
    ///
    /// With no explicit path, `pandu.toml` in the working directory is used if present.
    ///
    /// # Errors
    /// Propagates file and parse errors
    pub fn load(path: Option<&Path>) -> Result<Self, StudioError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        tracing::debug!(model = %config.api.model, output_dir = %config.output_dir.display(), "configuration loaded");
        Ok(config)
    }

    /// Apply `PANDU_*` overrides from a variable lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PANDU_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(model) = lookup("PANDU_MODEL") {
            self.api.model = model;
        }
        if let Some(url) = lookup("PANDU_BASE_URL") {
            self.api.base_url = url;
        }
    }

    /// Resolve the API key from the process environment
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|key| std::env::var(key).ok())
    }

    /// Resolve the API key: explicit value, then `api_key_env`, then `API_KEY`
    ///
    /// Blank values at any step fall through to the next one.
    #[must_use]
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |k: &String| !k.trim().is_empty();
        self.api
            .api_key
            .clone()
            .filter(present)
            .or_else(|| lookup(&self.api.api_key_env).filter(present))
            .or_else(|| lookup(LEGACY_API_KEY_ENV).filter(present))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AspectRatio;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = StudioConfig::new();
        assert_eq!(config.api.model, "gemini-3-pro-image-preview");
        assert_eq!(config.api.image_size, "4K");
        assert_eq!(config.default_aspect_ratio.to_string(), "16:9");
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StudioConfig::from_toml_str(
            r#"
            output_dir = "renders"
            default_aspect_ratio = "9:16"

            [api]
            image_size = "2K"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("renders"));
        assert_eq!(
            config.default_aspect_ratio,
            UiAspectRatio::Fixed(AspectRatio::Portrait)
        );
        assert_eq!(config.api.image_size, "2K");
        assert_eq!(config.api.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn bad_ratio_in_toml_is_config_error() {
        let err = StudioConfig::from_toml_str("default_aspect_ratio = \"5:4\"").unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn output_dir_builder() {
        let config = StudioConfig::new().with_output_dir("shots");
        assert_eq!(config.output_dir, PathBuf::from("shots"));
    }

    #[test]
    fn env_overrides() {
        let mut config = StudioConfig::new();
        config.apply_env(env(&[("PANDU_MODEL", "m2"), ("PANDU_OUTPUT_DIR", "/tmp/x")]));
        assert_eq!(config.api.model, "m2");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/x"));
    }

    #[test]
    fn api_key_resolution_order() {
        let config = StudioConfig::new();
        assert_eq!(config.resolve_api_key_with(env(&[])), None);
        assert_eq!(
            config.resolve_api_key_with(env(&[("API_KEY", "legacy")])),
            Some("legacy".to_string())
        );
        assert_eq!(
            config.resolve_api_key_with(env(&[("API_KEY", "legacy"), ("GEMINI_API_KEY", "g")])),
            Some("g".to_string())
        );
        let explicit = StudioConfig::new().with_api_key("k");
        assert_eq!(
            explicit.resolve_api_key_with(env(&[("GEMINI_API_KEY", "g")])),
            Some("k".to_string())
        );
    }

    #[test]
    fn blank_key_is_no_key() {
        let config = StudioConfig::new().with_api_key("  ");
        assert_eq!(config.resolve_api_key_with(env(&[])), None);
    }

    #[test]
    fn blank_env_key_falls_through_to_legacy() {
        let config = StudioConfig::new();
        assert_eq!(
            config.resolve_api_key_with(env(&[("GEMINI_API_KEY", ""), ("API_KEY", "real")])),
            Some("real".to_string())
        );
    }

    #[test]
    fn blank_explicit_key_falls_through_to_env() {
        let config = StudioConfig::from_toml_str("[api]\napi_key = \"\"").unwrap();
        assert_eq!(
            config.resolve_api_key_with(env(&[("GEMINI_API_KEY", "g")])),
            Some("g".to_string())
        );
    }
}
