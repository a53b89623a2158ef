//! Error types for schema inference

use thiserror::Error;

use crate::source::SourceError;

/// Errors that can occur during schema inference
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    /// The source could not be opened or fetched
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Reading the sample failed part way through
    #[error("Failed reading source at row {row}: {reason}")]
    Read { row: u64, reason: String },

    /// The sample contained no parsable data rows
    #[error("Source contains no parsable rows")]
    EmptySource,

    /// Invalid inference configuration
    #[error("Invalid inference configuration: {0}")]
    InvalidConfig(String),
}

impl InferenceError {
    /// Whether this error means the source itself could not be read
    pub fn is_unreadable(&self) -> bool {
        matches!(self, InferenceError::Source(_) | InferenceError::Read { .. })
    }
}
