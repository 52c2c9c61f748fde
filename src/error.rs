//! Hoard error types

use std::time::Duration;

/// Hoard error types
#[derive(Debug, thiserror::Error)]
pub enum HoardError {
    // Network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("network fetch timed out after {0:?}")]
    Timeout(Duration),

    // Store errors
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("no active cache generation")]
    NoActiveGeneration,

    // Lifecycle errors
    /// A blocking manifest entry could not be fetched during install.
    /// The generation being installed is discarded.
    #[error("manifest fetch failed for {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid policy pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HoardError {
    /// Whether this error is a network failure that strategies recover from
    /// by falling back to a stored entry.
    pub fn is_network(&self) -> bool {
        matches!(self, HoardError::Http(_) | HoardError::Timeout(_))
    }

    /// Whether this error means the current generation could not be used.
    pub fn is_store(&self) -> bool {
        matches!(
            self,
            HoardError::StoreUnavailable(_) | HoardError::NoActiveGeneration
        )
    }
}

impl From<reqwest::Error> for HoardError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest reports its own timeout separately from ours; both are network failures
        HoardError::Http(err.to_string())
    }
}

/// Result type alias for Hoard operations
pub type Result<T> = std::result::Result<T, HoardError>;
