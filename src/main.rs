//! jobtrail - Entry point for the command-line extractor

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use jobtrail::config::Settings;
use jobtrail::domain::DateWindow;
use jobtrail::services::PipelineError;
use jobtrail::Runtime;

/// Export job-application acknowledgments from Gmail to CSV and XLSX.
#[derive(Debug, Parser)]
#[command(name = "jobtrail", version, about)]
struct Cli {
    /// First day of the window, YYYY/MM/DD (inclusive).
    #[arg(long)]
    start: Option<String>,

    /// Day after the last day of the window, YYYY/MM/DD (exclusive); the same
    /// date as --start covers that one day.
    #[arg(long)]
    end: Option<String>,

    /// Settings file; defaults to settings.json in the user config directory.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// CSV file to write.
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// XLSX workbook to write alongside the CSV file.
    #[arg(long, value_name = "PATH", conflicts_with = "no_xlsx")]
    xlsx: Option<PathBuf>,

    /// Skip the XLSX workbook.
    #[arg(long)]
    no_xlsx: bool,

    /// Messages processed at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Leave fields the models cannot resolve as "Unknown".
    #[arg(long)]
    no_fallback: bool,

    /// Save credentials read from the credentials file to the OS keychain.
    #[arg(long)]
    remember_credentials: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Run failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    settings.apply_env();

    if let Some(output) = cli.output {
        settings.output.csv_path = output;
    }
    if let Some(xlsx) = cli.xlsx {
        settings.output.xlsx_path = Some(xlsx);
    }
    if cli.no_xlsx {
        settings.output.xlsx_path = None;
    }
    if let Some(concurrency) = cli.concurrency {
        settings.pipeline.concurrency = concurrency;
    }
    if cli.no_fallback {
        settings.pipeline.use_fallback_extraction = false;
    }
    if cli.remember_credentials {
        settings.gmail.remember_credentials = true;
    }

    let start = cli
        .start
        .or_else(|| settings.search.start_date.clone())
        .context("no window start; pass --start YYYY/MM/DD")?;
    let end = cli
        .end
        .or_else(|| settings.search.end_date.clone())
        .context("no window end; pass --end YYYY/MM/DD")?;
    let window = DateWindow::parse(&start, &end).map_err(PipelineError::from)?;

    tracing::info!(window = %window, "Starting jobtrail");

    let runtime = Runtime::new(settings);
    let report = runtime.run(&window).await?;

    let output = &runtime.settings().output;
    println!(
        "Saved {} job applications to {}",
        report.records.len(),
        output.csv_path.display()
    );
    if let Some(xlsx) = &output.xlsx_path {
        println!("Also saved to {}", xlsx.display());
    }
    if !report.is_complete() {
        println!("Skipped {} messages; see the log for details", report.skipped.len());
    }

    Ok(())
}
