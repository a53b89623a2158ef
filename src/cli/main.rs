//! sheet-onboard command line

mod commands;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sheet_onboard::pipeline::{PipelineConfig, PipelineError};
use tracing_subscriber::EnvFilter;

use commands::{ImportArgs, InferArgs, PreviewArgs};

/// Upload, infer, confirm and import tabular data
#[derive(Parser)]
#[command(name = "sheet-onboard", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Directory for the confirmed schema and imported rows
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Infer a schema from a file or URL and print it
    Infer(InferArgs),
    /// Infer, confirm and import a file or URL
    Import(ImportArgs),
    /// Print the first imported rows
    Preview(PreviewArgs),
    /// Print the confirmed schema
    Schema,
    /// Delete imported rows and the confirmed schema
    Clear,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.state_dir {
        config.state_dir = dir.clone();
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Infer(args) => commands::handle_infer(config, &args).await,
        Command::Import(args) => commands::handle_import(config, &args).await,
        Command::Preview(args) => commands::handle_preview(config, &args).await,
        Command::Schema => commands::handle_schema(config),
        Command::Clear => commands::handle_clear(config).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<PipelineError>() {
                Some(pipeline_err) => eprintln!("Error: {}", pipeline_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
