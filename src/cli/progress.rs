//! Progress reporting for imports
//!
//! Spinners for long-running operations using the `indicatif` crate.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use sheet_onboard::import::ImportJob;

/// Progress reporter for a running import
pub struct ImportProgress {
    bar: ProgressBar,
}

impl ImportProgress {
    /// Create a spinner; the total row count is unknown until the import completes
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Rows: 0");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Show the counters of a job snapshot
    pub fn update(&self, job: &ImportJob) {
        let mut msg = format!("Rows: {}", format_number(job.rows_processed));
        if job.rows_skipped > 0 {
            msg.push_str(&format!(", skipped: {}", format_number(job.rows_skipped)));
        }
        if job.cells_coerced > 0 {
            msg.push_str(&format!(", nulled cells: {}", format_number(job.cells_coerced)));
        }
        self.bar.set_message(msg);
    }

    /// Finish with success message
    pub fn finish_success(&self, msg: &str) {
        self.bar.finish_with_message(format!("✓ {}", msg));
    }

    /// Finish with error message
    pub fn finish_error(&self, msg: &str) {
        self.bar.abandon_with_message(format!("✗ {}", msg));
    }
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }
}
