//! CLI commands for inspecting and clearing pipeline state

use clap::Args;
use sheet_onboard::pipeline::{Pipeline, PipelineConfig};

/// Arguments for the `preview` command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Number of rows to print
    #[arg(long, short, default_value_t = 10)]
    pub limit: usize,
}

/// Handle the `preview` command
pub async fn handle_preview(config: PipelineConfig, args: &PreviewArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(config)?;
    let rows = pipeline.preview(args.limit).await?;
    let total = pipeline.row_count().await?;

    for row in &rows {
        println!("{}", serde_json::to_string(row)?);
    }
    eprintln!("Showing {} of {} rows", rows.len(), total);
    Ok(())
}

/// Handle the `schema` command
pub fn handle_schema(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(config)?;
    let schema = pipeline.schema()?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Handle the `clear` command
pub async fn handle_clear(config: PipelineConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(config)?;
    pipeline.clear_everything().await?;
    eprintln!(
        "Cleared imported rows and confirmed schema in {}",
        pipeline.config().state_dir.display()
    );
    Ok(())
}
