//! CLI command implementations

mod import;
mod infer;
mod state;

pub use import::{ImportArgs, handle_import};
pub use infer::{InferArgs, handle_infer};
pub use state::{PreviewArgs, handle_clear, handle_preview, handle_schema};

use std::path::{Path, PathBuf};

use clap::Args;
use sheet_onboard::pipeline::{Pipeline, PipelineConfig, PipelineResult, UploadResponse};
use sheet_onboard::source::SourceReference;

/// Options shared by commands that read a source
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// File path or http(s) URL
    pub source: String,

    /// Rows to sample for inference
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Field delimiter (sniffed when omitted)
    #[arg(long)]
    pub delimiter: Option<char>,

    /// The first row is data, not column names
    #[arg(long)]
    pub no_headers: bool,
}

impl SourceArgs {
    /// Apply command line overrides to the inference settings
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(size) = self.sample_size {
            config.inference.sample_size = size;
        }
        if self.delimiter.is_some() {
            config.inference.delimiter = self.delimiter;
        }
        if self.no_headers {
            config.inference.has_headers = false;
        }
        config
    }

    fn is_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// Hand the source to the pipeline as an upload or a fetch
pub async fn receive(pipeline: &Pipeline, args: &SourceArgs) -> PipelineResult<UploadResponse> {
    if args.is_url() {
        return pipeline.receive_fetch(&args.source, &args.source).await;
    }

    let path = PathBuf::from(&args.source);
    let name = file_name(&path);
    pipeline
        .receive_upload(&name, SourceReference::file(&path, name.clone()))
        .await
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
