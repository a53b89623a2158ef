//! sheet-onboard - upload, infer, confirm and import tabular data
//!
//! Provides:
//! - Upload caching (`cache`)
//! - Source access for files and http(s) URLs (`source`)
//! - Column type inference from a bounded sample (`inference`)
//! - Confirmed schema validation and persistence (`schema`)
//! - Background import with a single tracked job (`import`)
//! - Row store backends (`store`)
//! - The coordinator tying the stages together (`pipeline`)

pub mod cache;
pub mod import;
pub mod inference;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use cache::{CacheError, CacheInvalidation, CacheStore};
pub use import::{ErrorInfo, ImportConfig, ImportError, ImportExecutor, ImportJob, ImportState};
pub use inference::{
    ColumnGuess, ColumnType, InferenceConfig, InferenceError, InferredSchema, SchemaInferrer,
};
pub use pipeline::{
    ErrorKind, ErrorResponse, Pipeline, PipelineConfig, PipelineError, PipelineResult,
    UploadResponse,
};
pub use schema::{
    ConfirmedColumn, ConfirmedSchema, FileSchemaStore, MemorySchemaStore, SchemaError,
    SchemaStore,
};
pub use source::{SourceError, SourceKind, SourceReference};
pub use store::{JsonLinesRowStore, MemoryRowStore, Row, RowStore, RowStoreError};
