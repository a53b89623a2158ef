//! Upload, infer, confirm and import pipeline
//!
//! ## Flow
//!
//! 1. **Upload / fetch** - the source is cached under a caller key and a schema is
//!    inferred from a sample
//! 2. **Confirm** - the caller sends back the (possibly edited) schema; it is saved
//!    and the import starts in the background
//! 3. **Status** - the caller polls the import job until it completes or fails
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheet_onboard::pipeline::{Pipeline, PipelineConfig};
//! use sheet_onboard::source::SourceReference;
//!
//! let pipeline = Pipeline::open(PipelineConfig::default())?;
//! let upload = pipeline
//!     .receive_upload("sales.csv", SourceReference::file("sales.csv", "sales.csv"))
//!     .await?;
//! let schema = serde_json::to_string(&upload.schema.columns)?;
//! pipeline.confirm_import(&upload.upload_id, &schema).await?;
//! ```

mod config;
mod coordinator;
mod error;

pub use config::{DEFAULT_MAX_UPLOAD_BYTES, PipelineConfig};
pub use coordinator::{Pipeline, UploadResponse};
pub use error::{ErrorKind, ErrorResponse, PipelineError, PipelineResult};
