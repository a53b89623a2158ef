//! Pipeline configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use crate::import::ImportConfig;
use crate::inference::InferenceConfig;

/// Default upload limit: 100 MB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Directory holding the confirmed schema and imported rows
    pub state_dir: PathBuf,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: u64,
    /// Inference settings
    pub inference: InferenceConfig,
    /// Import settings
    pub import: ImportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from(".sheet-onboard"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            inference: InferenceConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| PipelineError::ConfigError(e.to_string()))?;
        config.validate().map_err(PipelineError::ConfigError)?;
        Ok(config)
    }

    /// Set the state directory
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Set the upload size limit
    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Set the inference configuration
    pub fn with_inference(mut self, inference: InferenceConfig) -> Self {
        self.inference = inference;
        self
    }

    /// Set the import configuration
    pub fn with_import(mut self, import: ImportConfig) -> Self {
        self.import = import;
        self
    }

    /// Path of the persisted confirmed schema
    pub fn schema_path(&self) -> PathBuf {
        self.state_dir.join("schema.json")
    }

    /// Path of the imported rows
    pub fn rows_path(&self) -> PathBuf {
        self.state_dir.join("rows.jsonl")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_upload_bytes == 0 {
            return Err("maxUploadBytes must be greater than zero".to_string());
        }
        self.inference.validate()?;
        self.import.validate()?;
        Ok(())
    }
}
