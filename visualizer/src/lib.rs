//! Dashboard stage: one PNG per ticker from the merged correlation data.

pub mod dashboard;
pub mod matrix;
pub mod palette;

use sentiment_core::sheets::{merged_sheet_name, read_merged};
use sentiment_core::workbook::WorkbookReader;
use sentiment_core::{CoreError, PipelineConfig, Stage, StageReport, TickerConfig};
use std::path::{Path, PathBuf};
use tracing::info;

pub use dashboard::{dashboard_title, render_dashboard, DASHBOARD_SIZE};
pub use matrix::{correlation_matrix, mentions_axis_limit, CorrelationMatrix, HEATMAP_COLUMNS};

/// Renders a dashboard for each ticker from its merged sheet in `input`.
/// `output_for` maps a ticker symbol to its image path.
pub fn visualize_workbook(
    input: &Path,
    tickers: &[TickerConfig],
    output_for: impl Fn(&str) -> PathBuf,
) -> Result<StageReport, CoreError> {
    let mut report = StageReport::new(Stage::Visualize);
    let mut reader = WorkbookReader::open(input)?;

    for ticker in tickers {
        let symbol = ticker.symbol.as_str();
        let company = if ticker.company.trim().is_empty() {
            symbol
        } else {
            ticker.company.as_str()
        };
        info!("Creating dashboard for {}", company);

        let records = match reader
            .sheet(&merged_sheet_name(symbol))
            .map_err(CoreError::from)
            .and_then(|table| read_merged(&table).map_err(CoreError::from))
        {
            Ok(records) => records,
            Err(e) => {
                report.skip_or_fail(symbol, e)?;
                continue;
            }
        };

        let path = output_for(symbol);
        if let Err(e) = render_dashboard(&path, symbol, company, &records) {
            report.skip_or_fail(symbol, e.into())?;
            continue;
        }

        report.record_written(symbol);
        report.record_output(path);
    }

    Ok(report)
}

pub fn run_visualizer(config: &PipelineConfig) -> Result<StageReport, CoreError> {
    visualize_workbook(&config.merged_path(), &config.tickers, |symbol| {
        config.dashboard_path(symbol)
    })
}
