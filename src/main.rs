//! CLI entry point for the drive downloader.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use drive_downloader::{
    BulkDownloader, DriveClient, FileConfig, ProgressBars, collect_links, filter_by_host,
};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = match &args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => FileConfig::load_default()?,
    };
    let settings = args.resolve(file_config.as_ref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?settings, loaded_config = file_config.is_some(), "settings resolved");

    let links = collect_links(&settings.input)
        .with_context(|| format!("cannot collect links from '{}'", settings.input.display()))?;
    let found = links.len();
    let links = filter_by_host(links, &settings.host_filter);

    info!(
        found,
        matching = links.len(),
        host = %settings.host_filter,
        "collected links"
    );

    if links.is_empty() {
        info!("no matching links found, nothing to download");
        return Ok(ExitCode::SUCCESS);
    }

    let client = DriveClient::with_endpoint(&settings.endpoint)?;
    let progress = if settings.quiet {
        ProgressBars::hidden()
    } else {
        ProgressBars::new()
    };
    let engine = BulkDownloader::new(Arc::new(client), settings.concurrency, settings.chunk_size)?
        .with_progress(Arc::new(progress));

    let report = engine.bulk_download(&links, &settings.output_dir).await?;

    let stats = report.stats();
    info!(
        completed = stats.completed(),
        skipped = stats.skipped(),
        failed = stats.failed(),
        total = stats.total(),
        output_dir = %settings.output_dir.display(),
        "Download complete"
    );

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
