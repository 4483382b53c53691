//! Sentiment scoring stage: raw posts in, weekly sentiment per ticker out.

pub mod analyzer;
pub mod weekly;

use sentiment_core::sheets::{read_raw_posts, write_weekly};
use sentiment_core::workbook::{WorkbookReader, WorkbookWriter};
use sentiment_core::{CoreError, PipelineConfig, ScoredPost, Stage, StageReport};
use std::path::Path;
use tracing::{info, warn};

pub use analyzer::SentimentScorer;
pub use weekly::{aggregate_weekly, week_ending, CategoryCounts};

/// Scores every ticker sheet of `input` and writes weekly aggregates to
/// `output`, one sheet per ticker under the same name.
///
/// An unreadable `input` fails the stage. A sheet that cannot be read or does
/// not match the raw post layout is skipped.
pub fn score_workbook(
    input: &Path,
    output: &Path,
    scorer: &SentimentScorer,
) -> Result<StageReport, CoreError> {
    let mut report = StageReport::new(Stage::Score);
    let mut reader = WorkbookReader::open(input)?;
    let mut writer = WorkbookWriter::new();

    for sheet in reader.sheet_names() {
        let table = match reader.sheet(&sheet) {
            Ok(table) => table,
            Err(e) => {
                report.skip_or_fail(sheet.as_str(), e.into())?;
                continue;
            }
        };
        let posts = match read_raw_posts(&table) {
            Ok(posts) => posts,
            Err(e) => {
                report.skip_or_fail(sheet.as_str(), e.into())?;
                continue;
            }
        };
        if posts.is_empty() {
            report.record_skipped(
                sheet.as_str(),
                &CoreError::InvalidInput {
                    message: format!("sheet {} has no posts", sheet),
                },
            );
            continue;
        }

        let scored: Vec<ScoredPost> = posts.into_iter().map(|p| scorer.score_post(p)).collect();
        let counts = CategoryCounts::tally(&scored);
        info!(
            "{}: {} posts ({} positive, {} negative, {} neutral)",
            sheet,
            scored.len(),
            counts.positive,
            counts.negative,
            counts.neutral
        );

        let weeks = aggregate_weekly(&scored);
        info!("{}: {} weeks with mentions", sheet, weeks.len());
        write_weekly(&mut writer, &sheet, &weeks)?;
        report.record_written(sheet);
    }

    if writer.sheet_count() == 0 {
        warn!("No sheet could be scored, {} not written", output.display());
        return Ok(report);
    }

    writer.save(output)?;
    report.record_output(output.to_path_buf());
    Ok(report)
}

pub fn run_scorer(config: &PipelineConfig) -> Result<StageReport, CoreError> {
    let scorer = SentimentScorer::new();
    score_workbook(&config.raw_posts_path(), &config.sentiment_path(), &scorer)
}
