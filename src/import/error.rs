//! Error types for import operations

use thiserror::Error;

/// Errors returned when starting an import
///
/// Failures while the import runs are recorded on the job, not returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Another import is still running
    #[error("An import is already in progress (job {job_id})")]
    AlreadyInProgress { job_id: String },

    /// Invalid import configuration
    #[error("Invalid import configuration: {0}")]
    InvalidConfig(String),
}
