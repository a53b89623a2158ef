//! Import job tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the import job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    /// No import has run yet
    #[default]
    Idle,
    /// Import is streaming rows
    Running,
    /// Import reached the end of the source
    Completed,
    /// Import stopped on an unrecoverable error
    Failed,
}

impl ImportState {
    /// Whether the job has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportState::Completed | ImportState::Failed)
    }
}

impl std::fmt::Display for ImportState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportState::Idle => write!(f, "idle"),
            ImportState::Running => write!(f, "running"),
            ImportState::Completed => write!(f, "completed"),
            ImportState::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ImportState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(ImportState::Idle),
            "running" => Ok(ImportState::Running),
            "completed" => Ok(ImportState::Completed),
            "failed" => Ok(ImportState::Failed),
            _ => Err(format!("Invalid import state: {}", s)),
        }
    }
}

/// Where and why an import failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// 1-based data row (header excluded) being read or written, when known
    pub row: Option<u64>,
    pub cause: String,
}

impl ErrorInfo {
    pub fn at_row(row: u64, cause: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            cause: cause.into(),
        }
    }

    pub fn unpositioned(cause: impl Into<String>) -> Self {
        Self {
            row: None,
            cause: cause.into(),
        }
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {}: {}", row, self.cause),
            None => f.write_str(&self.cause),
        }
    }
}

/// Snapshot of the import job
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    /// Identifier of the current or last run
    pub job_id: Option<String>,
    /// Upload the run is reading
    pub upload_id: Option<String>,
    pub state: ImportState,
    /// Rows written to the row store so far
    pub rows_processed: u64,
    /// Malformed rows skipped so far
    pub rows_skipped: u64,
    /// Cells that failed to parse under their column type and were stored as null
    pub cells_coerced: u64,
    /// Rows read from the source, known once the run completes
    pub rows_total: Option<u64>,
    pub error: Option<ErrorInfo>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    /// Generate a new job ID
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn is_running(&self) -> bool {
        self.state == ImportState::Running
    }

    /// Reset counters and enter `Running`
    pub fn begin(&mut self, upload_id: &str) {
        *self = Self {
            job_id: Some(Self::generate_id()),
            upload_id: Some(upload_id.to_string()),
            state: ImportState::Running,
            started_at: Some(Utc::now()),
            ..Self::default()
        };
    }

    /// Add the counts of one written batch
    pub fn record_batch(&mut self, processed: u64, skipped: u64, coerced: u64) {
        self.rows_processed += processed;
        self.rows_skipped += skipped;
        self.cells_coerced += coerced;
    }

    /// Mark the job as completed
    pub fn complete(&mut self) {
        self.state = ImportState::Completed;
        self.rows_total = Some(self.rows_processed + self.rows_skipped);
        self.finished_at = Some(Utc::now());
    }

    /// Mark the job as failed
    pub fn fail(&mut self, error: ErrorInfo) {
        self.state = ImportState::Failed;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    /// Get duration in milliseconds (if started)
    pub fn duration_ms(&self) -> Option<i64> {
        let started = self.started_at?;
        let ended = self.finished_at.unwrap_or_else(Utc::now);
        Some((ended - started).num_milliseconds())
    }

    /// Get rows per second throughput
    pub fn throughput(&self) -> Option<f64> {
        let duration = self.duration_ms()?;
        if duration == 0 {
            return None;
        }
        Some(self.rows_processed as f64 * 1000.0 / duration as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_state_display_and_parse() {
        assert_eq!(ImportState::Running.to_string(), "running");
        assert_eq!("Completed".parse::<ImportState>().unwrap(), ImportState::Completed);
        assert!("paused".parse::<ImportState>().is_err());
        assert!(ImportState::Failed.is_terminal());
        assert!(!ImportState::Idle.is_terminal());
    }

    #[test]
    fn test_job_lifecycle() {
        let mut job = ImportJob::default();
        assert_eq!(job.state, ImportState::Idle);
        assert!(job.job_id.is_none());

        job.begin("upload-1");
        assert!(job.is_running());
        assert!(job.job_id.is_some());
        assert_eq!(job.upload_id.as_deref(), Some("upload-1"));

        job.record_batch(500, 2, 1);
        job.record_batch(10, 0, 0);
        job.complete();
        assert_eq!(job.state, ImportState::Completed);
        assert_eq!(job.rows_processed, 510);
        assert_eq!(job.rows_total, Some(512));
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn test_begin_resets_previous_run() {
        let mut job = ImportJob::default();
        job.begin("first");
        job.record_batch(5, 1, 1);
        job.fail(ErrorInfo::at_row(6, "write timed out"));
        let first_id = job.job_id.clone();

        job.begin("second");
        assert_ne!(job.job_id, first_id);
        assert_eq!(job.rows_processed, 0);
        assert!(job.error.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_job_wire_format() {
        let mut job = ImportJob::default();
        job.begin("u");
        job.fail(ErrorInfo::at_row(3, "boom"));

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["rowsProcessed"], 0);
        assert_eq!(json["error"]["row"], 3);
        assert_eq!(json["error"]["cause"], "boom");
    }
}
