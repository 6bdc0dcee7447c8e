//! Gallery configuration
//!
//! Settings are read once at startup from a JSON file in the user's
//! config directory, then patched from the environment:
//! - Linux: ~/.config/infinite-gallery/config.json
//! - macOS: ~/Library/Application Support/infinite-gallery/config.json
//! - Windows: %APPDATA%\infinite-gallery\config.json
//!
//! The configuration is immutable once the controller has been built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable that overrides `api_key`
pub const API_KEY_ENV: &str = "FLICKR_API_KEY";
/// Environment variable that overrides `api_url`
pub const API_URL_ENV: &str = "GALLERY_API_URL";

const DEFAULT_API_URL: &str = "https://api.flickr.com/services/rest/";

/// All tunables of the gallery
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GalleryConfig {
    // ========== Remote API ==========

    /// Base REST endpoint of the photo API
    pub api_url: String,

    /// API key sent with every page request
    pub api_key: String,

    /// Seconds before an outstanding page fetch is abandoned
    pub fetch_timeout_secs: u64,

    // ========== Layout ==========

    /// Height of one photo tile in pixels
    pub img_height: u32,

    /// Vertical space between rows in pixels
    pub row_margin: u32,

    /// Number of tiles per grid row
    pub columns_per_row: usize,

    // ========== Paging ==========

    /// Links requested per API page, also the rendered window size
    pub page_size: usize,

    /// Already-fetched links kept back when paging forward
    pub offset_margin: usize,

    // ========== Input & animation ==========

    /// Delay before a wheel event turns into a move; further wheel
    /// events are dropped until then
    pub wheel_delay_ms: u64,

    /// Discrete steps of one scroll animation
    pub scroll_steps: u32,

    /// Milliseconds between animation steps
    pub scroll_interval_ms: u64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            fetch_timeout_secs: 20,
            img_height: 180,
            row_margin: 44,
            columns_per_row: 5,
            page_size: 50,
            offset_margin: 15,
            wheel_delay_ms: 150,
            scroll_steps: 6,
            scroll_interval_ms: 30,
        }
    }
}

impl GalleryConfig {
    /// Load the configuration from the default location plus environment.
    ///
    /// A missing config file is not an error: defaults are used and the
    /// API key is expected from `FLICKR_API_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without applying environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parse from a JSON string; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Where the config file lives, if the platform has a config directory
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("infinite-gallery");
        path.push("config.json");
        Some(path)
    }

    /// Patch values from the environment. The lookup is injected so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = key.trim().to_string();
        }
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    /// Check the invariants the paging arithmetic relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".into()));
        }
        if self.columns_per_row == 0 || self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "columns_per_row and page_size must be positive".into(),
            ));
        }
        if self.offset_margin >= self.page_size {
            return Err(ConfigError::Invalid(format!(
                "offset_margin ({}) must be smaller than page_size ({})",
                self.offset_margin, self.page_size
            )));
        }
        if self.page_size % self.columns_per_row != 0 {
            return Err(ConfigError::Invalid(format!(
                "page_size ({}) must be a multiple of columns_per_row ({})",
                self.page_size, self.columns_per_row
            )));
        }
        if self.advance() % self.columns_per_row != 0 {
            return Err(ConfigError::Invalid(format!(
                "page_size - offset_margin ({}) must be a multiple of columns_per_row ({})",
                self.advance(),
                self.columns_per_row
            )));
        }
        // Paging needs a first row, a trigger row and a last row
        if self.rows_per_page() < 3 {
            return Err(ConfigError::Invalid(format!(
                "a page must hold at least 3 rows, got {}",
                self.rows_per_page()
            )));
        }
        if self.scroll_steps == 0 {
            return Err(ConfigError::Invalid("scroll_steps must be positive".into()));
        }
        Ok(())
    }

    /// Links shown anew (and evicted) per paging operation
    pub fn advance(&self) -> usize {
        self.page_size - self.offset_margin
    }

    /// Rows in one rendered window
    pub fn rows_per_page(&self) -> usize {
        self.page_size / self.columns_per_row
    }

    /// Height of one grid row including its margin
    pub fn row_height(&self) -> f32 {
        (self.img_height + self.row_margin) as f32
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn wheel_delay(&self) -> Duration {
        Duration::from_millis(self.wheel_delay_ms)
    }

    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> GalleryConfig {
        GalleryConfig {
            api_key: "test-key".to_string(),
            ..GalleryConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = GalleryConfig::default();
        assert_eq!(config.img_height, 180);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.offset_margin, 15);
        assert_eq!(config.columns_per_row, 5);
        assert_eq!(config.advance(), 35);
        assert_eq!(config.rows_per_page(), 10);
        assert_eq!(config.row_height(), 224.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GalleryConfig::from_json(r#"{ "api_key": "abc", "img_height": 120 }"#).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.img_height, 120);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = GalleryConfig::from_json("{ page_size: 50 ");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GalleryConfig::default();
        config.apply_env(|name| match name {
            API_KEY_ENV => Some(" env-key ".to_string()),
            API_URL_ENV => Some("http://localhost:9000/rest".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.api_url, "http://localhost:9000/rest");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = keyed();
        config.apply_env(|_| Some("   ".to_string()));
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_missing_key_fails_validation() {
        assert!(matches!(
            GalleryConfig::default().validate(),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(keyed().validate().is_ok());
    }

    #[test]
    fn test_offset_margin_must_be_smaller_than_page() {
        let config = GalleryConfig { offset_margin: 50, ..keyed() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rows_must_stay_aligned() {
        let config = GalleryConfig { page_size: 52, ..keyed() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = GalleryConfig { offset_margin: 12, ..keyed() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_tiny_pages_are_rejected() {
        let config = GalleryConfig {
            page_size: 10,
            offset_margin: 5,
            ..keyed()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
