//! Configuration for schema inference

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for schema inference
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InferenceConfig {
    /// Maximum number of data rows to sample (header excluded)
    pub sample_size: usize,

    /// Treat the first row as column names
    pub has_headers: bool,

    /// Field delimiter; sniffed from the first line when unset
    pub delimiter: Option<char>,

    /// Maximum number of distinct sample values kept per column
    pub max_examples: usize,

    /// Minimum fraction of non-empty cells that must match a specific type (0.0 - 1.0)
    ///
    /// The default of 1.0 means every sampled value must match.
    pub type_confidence_threshold: f64,

    /// Timeout for fetching URL sources, in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_size: 100,
            has_headers: true,
            delimiter: None,
            max_examples: 5,
            type_confidence_threshold: 1.0,
            fetch_timeout_secs: 30,
        }
    }
}

impl InferenceConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for custom configuration
    pub fn builder() -> InferenceConfigBuilder {
        InferenceConfigBuilder::default()
    }

    /// Fetch timeout as a duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Delimiter as a byte, if one is configured
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.map(|c| c as u8)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_size == 0 {
            return Err("sampleSize must be at least 1".to_string());
        }
        if let Some(d) = self.delimiter
            && (!d.is_ascii() || d == '\n' || d == '\r' || d == '"')
        {
            return Err(format!("delimiter {d:?} must be a single ASCII character"));
        }
        if !(0.0..=1.0).contains(&self.type_confidence_threshold)
            || self.type_confidence_threshold == 0.0
        {
            return Err("typeConfidenceThreshold must be in (0.0, 1.0]".to_string());
        }
        Ok(())
    }
}

/// Builder for InferenceConfig
#[derive(Debug, Default)]
pub struct InferenceConfigBuilder {
    config: InferenceConfig,
}

impl InferenceConfigBuilder {
    /// Set the sample size
    pub fn sample_size(mut self, size: usize) -> Self {
        self.config.sample_size = size;
        self
    }

    /// Set whether the first row holds column names
    pub fn has_headers(mut self, has_headers: bool) -> Self {
        self.config.has_headers = has_headers;
        self
    }

    /// Fix the delimiter instead of sniffing it
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = Some(delimiter);
        self
    }

    /// Set the maximum number of sample values per column
    pub fn max_examples(mut self, max: usize) -> Self {
        self.config.max_examples = max;
        self
    }

    /// Set the type confidence threshold
    pub fn type_confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.type_confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the URL fetch timeout in seconds
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> InferenceConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InferenceConfig::default();
        assert_eq!(config.sample_size, 100);
        assert!(config.has_headers);
        assert!(config.delimiter.is_none());
        assert_eq!(config.type_confidence_threshold, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = InferenceConfig::builder()
            .sample_size(10)
            .has_headers(false)
            .delimiter(';')
            .max_examples(2)
            .type_confidence_threshold(0.8)
            .build();

        assert_eq!(config.sample_size, 10);
        assert!(!config.has_headers);
        assert_eq!(config.delimiter_byte(), Some(b';'));
        assert_eq!(config.max_examples, 2);
        assert_eq!(config.type_confidence_threshold, 0.8);
    }

    #[test]
    fn test_threshold_clamping() {
        let config = InferenceConfig::builder()
            .type_confidence_threshold(1.5)
            .build();
        assert_eq!(config.type_confidence_threshold, 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(InferenceConfig::builder().sample_size(0).build().validate().is_err());
        assert!(InferenceConfig::builder().delimiter('é').build().validate().is_err());
        assert!(
            InferenceConfig::builder()
                .type_confidence_threshold(0.0)
                .build()
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: InferenceConfig = toml::from_str("sampleSize = 25").unwrap();
        assert_eq!(config.sample_size, 25);
        assert_eq!(config.max_examples, 5);
    }
}
