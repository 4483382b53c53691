//! Shared entry points for the pipeline binaries.

use anyhow::{Context, Result};
use collector::run_collector;
use correlator::{run_correlator, YahooPriceClient};
use reddit_client::{RedditClient, RedditOAuth2Config};
use sentiment_core::{
    ErrorReporter, PipelineConfig, RedditCredentials, StageOutcome, StageReport, DEFAULT_CONFIG_FILE,
};
use sentiment_scorer::run_scorer;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use visualizer::run_visualizer;

const DEFAULT_LOG_FILTER: &str = "stock_sentiment=info,sentiment_core=info,reddit_client=info,\
collector=info,sentiment_scorer=info,correlator=info,visualizer=info";

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// `pipeline.toml` from the working directory, or the built-in settings.
pub fn load_config() -> Result<PipelineConfig> {
    PipelineConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
        .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))
}

pub async fn run_collect(config: &PipelineConfig) -> Result<StageReport> {
    let credentials = RedditCredentials::from_env().context("Reddit credentials are not set")?;
    let mut client = RedditClient::new(RedditOAuth2Config::from_credentials(
        credentials,
        &config.reddit.user_agent,
    ))?;

    let report = run_collector(config, &mut client)
        .await
        .map_err(|e| stage_failed(e, "collect"))?;
    Ok(finish(report))
}

pub fn run_score(config: &PipelineConfig) -> Result<StageReport> {
    let report = run_scorer(config).map_err(|e| stage_failed(e, "score"))?;
    Ok(finish(report))
}

pub async fn run_correlate(config: &PipelineConfig) -> Result<StageReport> {
    let prices = YahooPriceClient::new()?;
    let report = run_correlator(config, &prices)
        .await
        .map_err(|e| stage_failed(e, "correlate"))?;
    Ok(finish(report))
}

pub fn run_visualize(config: &PipelineConfig) -> Result<StageReport> {
    let report = run_visualizer(config).map_err(|e| stage_failed(e, "visualize"))?;
    Ok(finish(report))
}

/// All four stages in order; stops at the first stage that fails outright.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<Vec<StageReport>> {
    let mut reports = Vec::with_capacity(4);
    reports.push(run_collect(config).await?);
    reports.push(run_score(config)?);
    reports.push(run_correlate(config).await?);
    reports.push(run_visualize(config)?);
    Ok(reports)
}

fn stage_failed(e: sentiment_core::CoreError, stage: &str) -> anyhow::Error {
    ErrorReporter::for_stage(stage).report_error(&e);
    anyhow::Error::new(e).context(format!("{} stage failed", stage))
}

fn finish(report: StageReport) -> StageReport {
    report.log_summary();
    match report.outcome() {
        StageOutcome::Complete => info!("[{}] complete", report.stage),
        StageOutcome::Partial => warn!(
            "[{}] completed with {} skipped item(s)",
            report.stage,
            report.skipped_count()
        ),
        StageOutcome::Empty => warn!("[{}] produced no output", report.stage),
    }
    report
}
