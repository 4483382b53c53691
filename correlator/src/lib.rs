//! Correlation stage: joins weekly sentiment with daily closes and measures
//! how they move together.

pub mod align;
pub mod prices;
pub mod stats;

use chrono::NaiveDate;
use sentiment_core::sheets::{merged_sheet_name, read_weekly, write_correlations, write_merged};
use sentiment_core::workbook::{WorkbookReader, WorkbookWriter};
use sentiment_core::{
    CoreError, CorrelationResult, PipelineConfig, PriceApiError, SentimentFeature, Stage,
    StageReport,
};
use std::path::PathBuf;
use tracing::{info, warn};

pub use align::{adjust_date, merge_with_prices};
pub use prices::{PriceHistory, PriceSource, YahooPriceClient};
pub use stats::{correlate_ticker, pearson, Pearson};

/// What one correlation run works on.
#[derive(Debug, Clone)]
pub struct CorrelationJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub features: Vec<SentimentFeature>,
}

impl CorrelationJob {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            input: config.sentiment_path(),
            output: config.merged_path(),
            symbols: config.symbols(),
            start: config.prices.start_date,
            end: config.prices.end_date,
            features: config.correlation.sentiment_features.clone(),
        }
    }
}

pub async fn correlate_workbook<P: PriceSource + ?Sized>(
    job: &CorrelationJob,
    source: &P,
) -> Result<StageReport, CoreError> {
    let mut report = StageReport::new(Stage::Correlate);
    let mut reader = WorkbookReader::open(&job.input)?;

    info!(
        "Fetching daily closes for {} symbols, {} to {}",
        job.symbols.len(),
        job.start,
        job.end
    );
    let mut history = source.daily_closes(&job.symbols, job.start, job.end).await?;

    let mut writer = WorkbookWriter::new();
    let mut correlations: Vec<CorrelationResult> = Vec::new();

    for symbol in &job.symbols {
        info!("Processing {}", symbol);

        let weeks = match reader
            .sheet(symbol)
            .map_err(CoreError::from)
            .and_then(|table| read_weekly(&table).map_err(CoreError::from))
        {
            Ok(weeks) => weeks,
            Err(e) => {
                report.skip_or_fail(symbol.as_str(), e)?;
                continue;
            }
        };

        let prices = match history.remove(symbol) {
            Some(Ok(prices)) => prices,
            Some(Err(e)) => {
                report.skip_or_fail(symbol.as_str(), e)?;
                continue;
            }
            None => {
                report.record_skipped(
                    symbol.as_str(),
                    &PriceApiError::EmptyHistory {
                        symbol: symbol.clone(),
                    }
                    .into(),
                );
                continue;
            }
        };

        let merged = merge_with_prices(&weeks, &prices);
        info!(
            "{}: {} of {} weeks matched a trading day",
            symbol,
            merged.len(),
            weeks.len()
        );
        if merged.is_empty() {
            warn!("{}: no week lines up with a close", symbol);
        }
        write_merged(&mut writer, &merged_sheet_name(symbol), &merged)?;

        let results = correlate_ticker(symbol, &merged, &job.features);
        for result in &results {
            info!(
                "{}: {} vs {} r={:.4} p={:.4}",
                symbol,
                result.sentiment_component,
                result.stock_price_metric,
                result.correlation,
                result.p_value
            );
        }
        correlations.extend(results);
        report.record_written(symbol.as_str());
    }

    if writer.sheet_count() == 0 {
        warn!("No ticker could be merged, {} not written", job.output.display());
        return Ok(report);
    }

    write_correlations(&mut writer, &correlations)?;
    writer.save(&job.output)?;
    report.record_output(job.output.clone());
    Ok(report)
}

pub async fn run_correlator<P: PriceSource + ?Sized>(
    config: &PipelineConfig,
    source: &P,
) -> Result<StageReport, CoreError> {
    let job = CorrelationJob::from_config(config);
    correlate_workbook(&job, source).await
}
