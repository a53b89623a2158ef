//! CLI command for schema inference

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sheet_onboard::pipeline::{Pipeline, PipelineConfig};

use super::{SourceArgs, receive};

/// Arguments for the `infer` command
#[derive(Args, Debug)]
pub struct InferArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file path (stdout if not provided)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Handle the `infer` command
pub async fn handle_infer(config: PipelineConfig, args: &InferArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(args.source.apply(config))?;
    let upload = receive(&pipeline, &args.source).await?;

    eprintln!("Inferred schema for {}:", upload.upload_id);
    eprintln!("  Rows sampled: {}", upload.schema.sampled_rows);
    if upload.schema.skipped_rows > 0 {
        eprintln!("  Rows skipped: {}", upload.schema.skipped_rows);
    }
    for column in &upload.schema.columns {
        eprintln!(
            "  {:<24} {:<8} ({:.0}%)",
            column.name,
            column.column_type.as_str(),
            column.confidence * 100.0
        );
    }

    let output = serde_json::to_string_pretty(&upload)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            eprintln!();
            eprintln!("Schema written to: {}", path.display());
        }
        None => println!("{}", output),
    }
    Ok(())
}
