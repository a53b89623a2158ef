//! CLI command for importing a source

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use sheet_onboard::import::ImportState;
use sheet_onboard::pipeline::{Pipeline, PipelineConfig, PipelineError};
use sheet_onboard::schema::ConfirmedSchema;

use super::{SourceArgs, receive};
use crate::progress::{ImportProgress, format_number};

/// Arguments for the `import` command
#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Confirmed schema JSON; the inferred schema is accepted as-is when omitted
    #[arg(long, short)]
    pub schema: Option<PathBuf>,

    /// Print the final job as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Handle the `import` command
pub async fn handle_import(config: PipelineConfig, args: &ImportArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::open(args.source.apply(config))?;
    let upload = receive(&pipeline, &args.source).await?;

    match &args.schema {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read schema {}", path.display()))?;
            pipeline.confirm_import(&upload.upload_id, &json).await?;
        }
        None => {
            let schema =
                ConfirmedSchema::from_inferred(&upload.schema).map_err(PipelineError::from)?;
            pipeline
                .confirm_import_schema(&upload.upload_id, schema)
                .await?;
        }
    }

    let progress = ImportProgress::new();
    let job = loop {
        let job = pipeline.import_status();
        progress.update(&job);
        if !job.is_running() {
            break job;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    }

    match (job.state, &job.error) {
        (ImportState::Failed, Some(error)) => {
            progress.finish_error(&format!("Import failed at {error}"));
            anyhow::bail!("Import failed at {error}")
        }
        (ImportState::Failed, None) => {
            progress.finish_error("Import failed");
            anyhow::bail!("Import failed")
        }
        _ => {
            progress.finish_success(&format!(
                "Imported {} rows ({} skipped) into {}",
                format_number(job.rows_processed),
                format_number(job.rows_skipped),
                pipeline.config().rows_path().display()
            ));
            Ok(())
        }
    }
}
