//! Error types for pipeline operations
//!
//! Every coordinator operation returns a [`PipelineError`] on failure. Errors map
//! onto a small set of [`ErrorKind`]s that callers can turn into a structured
//! [`ErrorResponse`] or an HTTP status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;
use crate::import::ImportError;
use crate::inference::InferenceError;
use crate::schema::SchemaError;
use crate::source::SourceError;
use crate::store::RowStoreError;

/// Errors that can occur in the upload, confirm and import pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No upload or schema under the requested key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Source could not be opened, fetched or read
    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    /// Source contains no parsable rows
    #[error("Source contains no parsable rows")]
    EmptySource,

    /// Upload exceeds the configured size limit
    #[error("Source is {size} bytes, over the {limit} byte limit")]
    SourceTooLarge { size: u64, limit: u64 },

    /// Confirmed schema is malformed or inconsistent
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// An import is running; retry once it has finished
    #[error("An import is already in progress (job {job_id})")]
    ImportAlreadyInProgress { job_id: String },

    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Row store error
    #[error("Row store error: {0}")]
    RowStore(#[from] RowStoreError),

    /// Schema storage failed
    #[error("Schema storage error: {0}")]
    SchemaStorage(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Background task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error classes exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    Validation,
    InvalidSchema,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Suggested HTTP status code
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::InvalidSchema => 422,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }
}

/// Structured error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::SourceUnreadable(_)
            | PipelineError::EmptySource
            | PipelineError::SourceTooLarge { .. } => ErrorKind::Validation,
            PipelineError::InvalidSchema(_) => ErrorKind::InvalidSchema,
            PipelineError::ImportAlreadyInProgress { .. } => ErrorKind::Conflict,
            PipelineError::ConfigError(_)
            | PipelineError::RowStore(_)
            | PipelineError::SchemaStorage(_)
            | PipelineError::IoError(_)
            | PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if retrying the same request later can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::ImportAlreadyInProgress { .. })
    }

    /// Structured payload for API callers
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::NotFound(what) => {
                format!("Not found: {what}\n\nHint: Upload or fetch the source again.")
            }
            PipelineError::SourceUnreadable(reason) => format!(
                "Cannot read source: {reason}\n\n\
                Hint: Check the file path or URL and try again."
            ),
            PipelineError::EmptySource => "Source contains no parsable rows.\n\n\
                Hint: Check the delimiter and that the file has data below the header."
                .to_string(),
            PipelineError::SourceTooLarge { size, limit } => format!(
                "Source is {size} bytes, over the {limit} byte limit.\n\n\
                Hint: Split the file or raise maxUploadBytes."
            ),
            PipelineError::InvalidSchema(reason) => format!(
                "Invalid schema: {reason}\n\n\
                Hint: Each column needs a unique non-blank name and one of the types \
                string, number, boolean, date."
            ),
            PipelineError::ImportAlreadyInProgress { job_id } => format!(
                "An import is already running (job {job_id}).\n\n\
                Hint: Poll the import status and retry once it has finished."
            ),
            PipelineError::ConfigError(msg) => {
                format!("Configuration error: {msg}\n\nHint: Check your configuration file.")
            }
            _ => self.to_string(),
        }
    }
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        err.to_response()
    }
}

impl From<CacheError> for PipelineError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound(key) => PipelineError::NotFound(format!("no such upload '{key}'")),
        }
    }
}

impl From<SourceError> for PipelineError {
    fn from(err: SourceError) -> Self {
        PipelineError::SourceUnreadable(err.to_string())
    }
}

impl From<InferenceError> for PipelineError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::EmptySource => PipelineError::EmptySource,
            InferenceError::InvalidConfig(msg) => PipelineError::ConfigError(msg),
            other => PipelineError::SourceUnreadable(other.to_string()),
        }
    }
}

impl From<SchemaError> for PipelineError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::InvalidSchema(reason) => PipelineError::InvalidSchema(reason),
            SchemaError::NotFound => {
                PipelineError::NotFound("no confirmed schema has been saved".to_string())
            }
            io @ SchemaError::Io { .. } => PipelineError::SchemaStorage(io.to_string()),
        }
    }
}

impl From<ImportError> for PipelineError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::AlreadyInProgress { job_id } => {
                PipelineError::ImportAlreadyInProgress { job_id }
            }
            ImportError::InvalidConfig(msg) => PipelineError::ConfigError(msg),
        }
    }
}
