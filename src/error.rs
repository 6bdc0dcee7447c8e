//! Error types shared across the gallery
//!
//! Fetch failures travel inside UI messages, so `SourceError` is `Clone`
//! and carries plain strings instead of the underlying library errors.

use std::time::Duration;
use thiserror::Error;

/// Why a page of photo links could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The request never produced a usable HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the JSON shape we expect
    #[error("invalid response: {0}")]
    Parse(String),

    /// The API answered with `stat != "ok"`
    #[error("photo API rejected the request ({code}): {message}")]
    Api { code: i64, message: String },

    /// No answer within the configured fetch timeout
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The fetch was cancelled before it completed
    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

/// Configuration could not be loaded or is inconsistent
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no API key configured (set api_key in config.json or FLICKR_API_KEY)")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors the controller reports to the host application
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalleryError {
    /// The very first page failed; the gallery stays empty
    #[error("could not load the first page: {0}")]
    InitialLoad(SourceError),

    /// Paging forward failed; the user can retry by moving again
    #[error("could not load page {page}: {source}")]
    MorePhotos { page: u32, source: SourceError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = SourceError::Api {
            code: 100,
            message: "Invalid API Key (Key has invalid format)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "photo API rejected the request (100): Invalid API Key (Key has invalid format)"
        );
    }

    #[test]
    fn test_gallery_error_wraps_source() {
        let err = GalleryError::MorePhotos {
            page: 3,
            source: SourceError::Timeout(Duration::from_secs(20)),
        };
        assert_eq!(err.to_string(), "could not load page 3: request timed out after 20s");
    }
}
