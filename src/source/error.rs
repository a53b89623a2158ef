//! Error types for data sources

use thiserror::Error;

/// Errors that can occur while opening a data source
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// Local file could not be opened
    #[error("Cannot open source {location}: {reason}")]
    Open { location: String, reason: String },

    /// URL is malformed or uses an unsupported scheme
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Remote fetch failed (connect, timeout, or non-success status)
    #[error("Cannot fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}

impl SourceError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            SourceError::Open { location, reason } => format!(
                "Cannot open source: {location}\nReason: {reason}\n\n\
                Hint: Check that the file exists and is readable."
            ),
            SourceError::InvalidUrl { url, reason } => format!(
                "Invalid URL: {url}\nReason: {reason}\n\n\
                Hint: Only http:// and https:// URLs are supported."
            ),
            SourceError::Fetch { url, reason } => format!(
                "Cannot fetch: {url}\nReason: {reason}\n\n\
                Hint: Check network connectivity and that the URL is reachable."
            ),
        }
    }
}
