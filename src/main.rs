//! CLI entry point for the confetch tool.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use confetch_core::{BatchResult, BatchSettings, DownloadOrchestrator, HttpClient, requests_from_urls};
use tracing::{debug, error, info, warn};

mod app_config;
mod cli;
mod exit_handler;

use app_config::resolve_config;
use cli::Args;
use exit_handler::determine_exit_outcome;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let config = resolve_config(&args)?;
    match &config.source {
        Some(path) => debug!(path = %path.display(), "Loaded config file"),
        None => debug!("No config file found, using defaults and CLI flags"),
    }

    if config.urls.is_empty() {
        warn!("No URLs configured; nothing to download");
    }

    let requests = requests_from_urls(&config.urls, Some(&config.credentials))
        .context("Invalid credentials")?;

    let client = HttpClient::with_timeouts(
        config.connect_timeout.as_secs(),
        config.read_timeout.as_secs(),
    )
    .context("Failed to build HTTP client")?;

    let settings = BatchSettings::new(&config.target_dir, config.batch_timeout)
        .with_prefix_marker(config.prefix_marker.as_str());

    info!(
        urls = requests.len(),
        target_dir = %config.target_dir.display(),
        timeout_secs = config.batch_timeout.as_secs(),
        "Confetch starting"
    );

    let result = DownloadOrchestrator::new(client, settings)
        .run_batch(requests)
        .await;

    log_summary(&result);

    Ok(determine_exit_outcome(result.status()).into())
}

fn log_summary(result: &BatchResult) {
    for (url, err) in result.failures() {
        error!(url = %url, error = %err, "Download failed");
    }
    for url in result.pending() {
        warn!(url = %url, "Download still pending at deadline");
    }

    info!(
        status = %result.status(),
        succeeded = result.succeeded(),
        failed = result.failed(),
        pending = result.pending().len(),
        elapsed_ms = u64::try_from(result.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Download complete"
    );
}
