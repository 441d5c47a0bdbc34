//! Error types for tubedrop

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tubedrop operations
#[derive(Debug, Error)]
pub enum TubeError {
    #[error("{0}")]
    Extraction(String),

    #[error("{0}")]
    Download(String),

    #[error("Downloaded file not found at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("Cookie retrieval failed: {0}")]
    Cookies(String),

    #[error("Extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl TubeError {
    /// Check if the error is downgraded to a warning instead of failing the caller
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TubeError::Cookies(_))
    }

    /// Check if the error originated in the external extractor
    pub fn is_extractor_error(&self) -> bool {
        matches!(
            self,
            TubeError::Extraction(_) | TubeError::Download(_) | TubeError::ExtractorUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_messages_pass_through() {
        let err = TubeError::Extraction("ERROR: [youtube] abc: Video unavailable".to_string());
        assert_eq!(err.to_string(), "ERROR: [youtube] abc: Video unavailable");
        assert!(err.is_extractor_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_missing_output_message() {
        let err = TubeError::MissingOutput(PathBuf::from("static/videos/abc123.mp4"));
        assert_eq!(
            err.to_string(),
            "Downloaded file not found at static/videos/abc123.mp4"
        );
        assert!(!err.is_extractor_error());
    }

    #[test]
    fn test_cookie_errors_are_recoverable() {
        assert!(TubeError::Cookies("no profile".to_string()).is_recoverable());
        assert!(!TubeError::Generic("boom".to_string()).is_recoverable());
    }
}
