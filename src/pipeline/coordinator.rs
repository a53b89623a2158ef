//! Pipeline coordinator
//!
//! [`Pipeline`] owns every stage of the onboarding flow and is the single entry
//! point callers use. It holds no global state; create one per process (or per
//! tenant) and share it behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use crate::cache::{CacheInvalidation, CacheStore};
use crate::import::{ImportExecutor, ImportJob};
use crate::inference::{InferredSchema, SchemaInferrer};
use crate::schema::{ConfirmedSchema, FileSchemaStore, MemorySchemaStore, SchemaStore};
use crate::source::SourceReference;
use crate::store::{JsonLinesRowStore, MemoryRowStore, Row, RowStore};

/// Result of receiving an upload or fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Key to pass back when confirming the import
    pub upload_id: String,
    #[serde(flatten)]
    pub schema: InferredSchema,
}

/// Upload, confirm and import coordinator
pub struct Pipeline {
    config: PipelineConfig,
    uploads: Arc<CacheStore<String, SourceReference>>,
    previews: Arc<CacheStore<usize, Vec<Row>>>,
    schemas: Arc<dyn SchemaStore>,
    rows: Arc<dyn RowStore>,
    executor: ImportExecutor,
    inferrer: SchemaInferrer,
    /// Serializes cache replacement, import confirmation and clearing
    session: tokio::sync::Mutex<()>,
}

impl Pipeline {
    /// Create a pipeline over the given stores
    pub fn new(
        config: PipelineConfig,
        schemas: Arc<dyn SchemaStore>,
        rows: Arc<dyn RowStore>,
    ) -> PipelineResult<Self> {
        config.validate().map_err(PipelineError::ConfigError)?;

        let uploads = Arc::new(CacheStore::new("uploads"));
        let previews = Arc::new(CacheStore::new("row-previews"));
        let executor = ImportExecutor::new(Arc::clone(&rows), config.import.clone(), &config.inference)?
            .with_cache(Arc::clone(&uploads) as Arc<dyn CacheInvalidation>)
            .with_read_cache(Arc::clone(&previews) as Arc<dyn CacheInvalidation>);

        Ok(Self {
            inferrer: SchemaInferrer::with_config(config.inference.clone()),
            config,
            uploads,
            previews,
            schemas,
            rows,
            executor,
            session: tokio::sync::Mutex::new(()),
        })
    }

    /// Create a pipeline persisting to files under the configured state directory
    pub fn open(config: PipelineConfig) -> PipelineResult<Self> {
        let schemas = Arc::new(FileSchemaStore::new(config.schema_path()));
        let rows = Arc::new(JsonLinesRowStore::new(config.rows_path()));
        Self::new(config, schemas, rows)
    }

    /// Create a pipeline that keeps everything in memory
    pub fn in_memory(config: PipelineConfig) -> PipelineResult<Self> {
        Self::new(
            config,
            Arc::new(MemorySchemaStore::new()),
            Arc::new(MemoryRowStore::new()),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn ensure_no_running_import(&self) -> PipelineResult<()> {
        let job = self.executor.status();
        if job.is_running() {
            return Err(PipelineError::ImportAlreadyInProgress {
                job_id: job.job_id.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Receive an uploaded source and infer its schema
    ///
    /// Replaces whatever upload was cached before. A source that cannot be inferred
    /// is dropped from the cache again. Rejected while an import is running.
    pub async fn receive_upload(
        &self,
        key: &str,
        source: SourceReference,
    ) -> PipelineResult<UploadResponse> {
        if let Some(size) = source.size_bytes
            && size > self.config.max_upload_bytes
        {
            return Err(PipelineError::SourceTooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }

        self.replace_upload(key, source.clone()).await?;
        let schema = self.infer_cached(key, source).await?;

        info!(
            upload_id = %key,
            columns = schema.columns.len(),
            sampled_rows = schema.sampled_rows,
            "Received upload"
        );
        Ok(UploadResponse {
            upload_id: key.to_string(),
            schema,
        })
    }

    /// Register a remote URL and infer its schema
    ///
    /// Only `http` and `https` URLs are accepted.
    pub async fn receive_fetch(&self, key: &str, url: &str) -> PipelineResult<UploadResponse> {
        let source = SourceReference::url(url)?;
        self.replace_upload(key, source.clone()).await?;
        let schema = self.infer_cached(key, source).await?;

        info!(
            upload_id = %key,
            url = %url,
            columns = schema.columns.len(),
            "Fetched source"
        );
        Ok(UploadResponse {
            upload_id: key.to_string(),
            schema,
        })
    }

    async fn replace_upload(&self, key: &str, source: SourceReference) -> PipelineResult<()> {
        let _session = self.session.lock().await;
        self.ensure_no_running_import()?;
        self.uploads.replace_all(key.to_string(), source);
        Ok(())
    }

    /// Infer a just-cached upload, evicting it if inference fails
    async fn infer_cached(
        &self,
        key: &str,
        source: SourceReference,
    ) -> PipelineResult<InferredSchema> {
        match self.infer(source.clone()).await {
            Ok(schema) => Ok(schema),
            Err(e) => {
                let _session = self.session.lock().await;
                // A newer upload may have replaced ours meanwhile
                if self.uploads.get(&key.to_string()).ok().as_ref() == Some(&source) {
                    self.uploads.remove(&key.to_string());
                }
                warn!(upload_id = %key, error = %e, "Dropped upload that could not be inferred");
                Err(e)
            }
        }
    }

    async fn infer(&self, source: SourceReference) -> PipelineResult<InferredSchema> {
        let inferrer = self.inferrer.clone();
        tokio::task::spawn_blocking(move || inferrer.infer(&source))
            .await
            .map_err(|e| PipelineError::Internal(format!("Inference task failed: {e}")))?
            .map_err(PipelineError::from)
    }

    /// Confirm a schema for a cached upload and start importing it
    ///
    /// `schema_json` is a list of `{name, type}` columns (bare or under
    /// `"columns"`). Returns as soon as the import is running; poll
    /// [`Pipeline::import_status`] for progress.
    pub async fn confirm_import(&self, key: &str, schema_json: &str) -> PipelineResult<ImportJob> {
        let _session = self.session.lock().await;
        let source = self.uploads.get(&key.to_string())?;
        let schema = ConfirmedSchema::from_json(schema_json)?;
        self.start_import(key, source, schema)
    }

    /// Confirm an already-parsed schema for a cached upload and start importing it
    pub async fn confirm_import_schema(
        &self,
        key: &str,
        schema: ConfirmedSchema,
    ) -> PipelineResult<ImportJob> {
        let _session = self.session.lock().await;
        let source = self.uploads.get(&key.to_string())?;
        self.start_import(key, source, schema)
    }

    /// Save the schema and start the import; caller holds the session lock
    fn start_import(
        &self,
        key: &str,
        source: SourceReference,
        schema: ConfirmedSchema,
    ) -> PipelineResult<ImportJob> {
        let _span = info_span!("confirm_import", upload_id = %key).entered();

        // The running import reads the saved schema's types; never replace it mid-run
        self.ensure_no_running_import()?;
        self.schemas.save(&schema)?;
        let job = self.executor.start(key, source, schema)?;
        Ok(job)
    }

    /// Snapshot of the import job
    pub fn import_status(&self) -> ImportJob {
        self.executor.status()
    }

    /// Wait until the current import leaves `Running`
    pub async fn wait_for_import(&self, poll_interval: Duration) -> ImportJob {
        self.executor.wait(poll_interval).await
    }

    /// Drop cached uploads, previews, imported rows and the confirmed schema
    pub async fn clear_everything(&self) -> PipelineResult<()> {
        let _session = self.session.lock().await;
        self.ensure_no_running_import()?;

        self.uploads.clear_all();
        self.previews.clear_all();
        self.rows.delete_and_create().await?;
        if let Err(e) = self.schemas.clear() {
            warn!(error = %e, "Failed to clear confirmed schema");
            return Err(e.into());
        }

        info!("Cleared all pipeline state");
        Ok(())
    }

    /// First `limit` imported rows, served through the preview cache
    pub async fn preview(&self, limit: usize) -> PipelineResult<Vec<Row>> {
        if let Ok(rows) = self.previews.get(&limit) {
            return Ok(rows);
        }
        let generation = self.previews.generation();
        let rows = self.rows.preview(limit).await?;
        self.previews.put_if_generation(limit, rows.clone(), generation);
        Ok(rows)
    }

    /// The persisted confirmed schema
    pub fn schema(&self) -> PipelineResult<ConfirmedSchema> {
        Ok(self.schemas.load()?)
    }

    /// Number of rows in the row store
    pub async fn row_count(&self) -> PipelineResult<u64> {
        Ok(self.rows.count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_upload_returns_upload_id_and_schema() {
        let pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
        let file = csv_file("name,amount\nA,10\n");

        let response = pipeline
            .receive_upload("data.csv", SourceReference::file(file.path(), "data.csv"))
            .await
            .unwrap();
        assert_eq!(response.upload_id, "data.csv");
        assert_eq!(response.schema.columns.len(), 2);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["uploadId"], "data.csv");
        assert_eq!(json["columns"][1]["type"], "number");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let config = PipelineConfig::default().with_max_upload_bytes(4);
        let pipeline = Pipeline::in_memory(config).unwrap();
        let file = csv_file("name,amount\nA,10\n");

        let err = pipeline
            .receive_upload("big.csv", SourceReference::file(file.path(), "big.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
        let err = pipeline
            .receive_fetch("remote", "file:///etc/passwd")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnreadable(_)));
    }

    #[tokio::test]
    async fn test_schema_not_found_before_confirm() {
        let pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
        assert!(matches!(pipeline.schema(), Err(PipelineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_schema_json_does_not_start_import() {
        let pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
        let file = csv_file("name,amount\nA,10\n");
        pipeline
            .receive_upload("data.csv", SourceReference::file(file.path(), "data.csv"))
            .await
            .unwrap();

        let err = pipeline
            .confirm_import("data.csv", r#"[{"name": "a", "type": "money"}]"#)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSchema);
        assert_eq!(pipeline.import_status(), ImportJob::default());
    }
}
