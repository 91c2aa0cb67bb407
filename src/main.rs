//! Trend Finder: runs one trend discovery job
//!
//! This is the main entry point for the application.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trend_finder::{config, network::HttpClient, TrendRun};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if std::env::args().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return Ok(());
    }

    info!("Starting Trend Finder v{}", trend_finder::VERSION);

    // Load configuration
    let settings = config::load()?;
    settings.validate()?;
    info!(
        "Loaded configuration: {} {} {}",
        settings.general.mode.as_str(),
        settings.general.service,
        settings.general.language
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the batch in flight");
            signal.cancel();
        }
    });

    let started_at = chrono::Local::now().naive_local();
    let run = TrendRun::from_settings(settings, client, started_at);
    let report = run.execute(&cancel).await;

    if report.is_success() {
        Ok(())
    } else {
        anyhow::bail!("run {} did not succeed", report.job_id)
    }
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Trend Finder v{}
Discovers trending search-box completions

USAGE:
    trend-finder

ENVIRONMENT VARIABLES:
    TREND_FINDER_SETTINGS_PATH     Path to settings.yml
    TREND_FINDER_LANGUAGE          Target language (ko, ja, en)
    TREND_FINDER_SERVICE           Suggestion source (google, youtube)
    TREND_FINDER_MODE              Run mode (basic, target)
    TREND_FINDER_SUGGEST_ENDPOINT  Suggestion API endpoint
    TREND_FINDER_CONCURRENCY       Concurrent suggestion requests
    TREND_FINDER_OUTPUT_DIR        Directory receiving run results
    TREND_FINDER_WEBHOOK_URL       Chat webhook receiving run reports
    RUST_LOG                       Log filter (default: info)
"#,
        trend_finder::VERSION
    );
}
