//! Schema inference for delimited text sources
//!
//! Reads a bounded sample of a CSV-like source and guesses a type for each
//! column, so a caller can review and confirm the schema before importing.
//!
//! ## Type rules
//!
//! - **number** - integer or decimal literals (`10`, `-3.5`, `1e3`)
//! - **boolean** - `true`, `false`, `yes`, `no` in any case
//! - **date** - ISO dates, slash and dot separated dates, RFC 3339 date-times
//! - **string** - anything else
//!
//! Empty cells never disqualify a type.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheet_onboard::inference::{InferenceConfig, SchemaInferrer};
//!
//! let inferrer = SchemaInferrer::with_config(InferenceConfig::builder().sample_size(50).build());
//! let schema = inferrer.infer_reader("name,amount\nA,10\n".as_bytes())?;
//! println!("{}", serde_json::to_string_pretty(&schema)?);
//! ```

pub mod classify;
mod config;
mod error;
mod inferrer;
mod types;

pub use config::{InferenceConfig, InferenceConfigBuilder};
pub use error::InferenceError;
pub use inferrer::SchemaInferrer;
pub use types::{ColumnGuess, ColumnType, InferredSchema};
