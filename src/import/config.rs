//! Configuration for the import executor

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the import executor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConfig {
    /// Rows per row-store insert
    pub batch_size: usize,

    /// Upper bound on a single batch insert, in milliseconds
    pub write_timeout_ms: u64,

    /// Parsed batches buffered between the reader and the writer
    pub channel_capacity: usize,

    /// Empty the row store before writing a new import
    pub replace_existing: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            write_timeout_ms: 30_000,
            channel_capacity: 4,
            replace_existing: true,
        }
    }
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batchSize must be at least 1".to_string());
        }
        if self.write_timeout_ms == 0 {
            return Err("writeTimeoutMs must be greater than zero".to_string());
        }
        if self.channel_capacity == 0 {
            return Err("channelCapacity must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.write_timeout(), Duration::from_secs(30));
        assert!(config.replace_existing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(ImportConfig::new().with_batch_size(0).validate().is_err());
        assert!(
            ImportConfig::new()
                .with_write_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
