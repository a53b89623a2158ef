//! Import of a confirmed source into the row store
//!
//! Only one import runs at a time. [`ImportExecutor::start`] flips the single
//! job to `Running` atomically and returns; progress is read back with
//! [`ImportExecutor::status`].
//!
//! ```text
//! Idle -> Running -> Completed
//!                 \-> Failed
//! Completed | Failed -> Running (next start)
//! ```

mod config;
mod error;
mod executor;
mod job;

pub use config::ImportConfig;
pub use error::ImportError;
pub use executor::ImportExecutor;
pub use job::{ErrorInfo, ImportJob, ImportState};
