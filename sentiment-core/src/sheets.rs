//! Sheet layouts exchanged between stages.
//!
//! Each layout has its writer and its reader side by side so whatever one
//! stage saves, the next one can load back through the same column list.

use crate::error::{DataShapeError, WorkbookError};
use crate::types::columns::*;
use crate::types::{
    CorrelationResult, MergedRecord, PriceMetric, RawPost, SentimentFeature, WeeklySentiment,
};
use crate::workbook::{Cell, SheetTable, WorkbookWriter};

pub const RAW_POST_COLUMNS: [&str; 6] = [TITLE, SCORE, DATE, COMMENTS, BODY, SUBREDDIT];

pub const WEEKLY_COLUMNS: [&str; 5] = [
    DATE,
    COMPOUND_SENTIMENT,
    WEIGHTED_SENTIMENT,
    MENTIONS,
    ENGAGEMENT_METRICS,
];

pub const MERGED_COLUMNS: [&str; 8] = [
    DATE,
    ADJUSTED_DATE,
    COMPOUND_SENTIMENT,
    WEIGHTED_SENTIMENT,
    MENTIONS,
    ENGAGEMENT_METRICS,
    CLOSE,
    RETURNS,
];

pub const CORRELATION_COLUMNS: [&str; 5] = [
    STOCK,
    SENTIMENT_COMPONENT,
    STOCK_PRICE_METRIC,
    CORRELATION,
    P_VALUE,
];

pub const CORRELATION_SHEET: &str = "Correlation_Results";

pub fn merged_sheet_name(symbol: &str) -> String {
    format!("{}_Merged_Data", symbol)
}

pub fn write_raw_posts(
    writer: &mut WorkbookWriter,
    sheet: &str,
    posts: &[RawPost],
) -> Result<(), WorkbookError> {
    let mut sheet = writer.add_sheet(sheet, &RAW_POST_COLUMNS)?;
    for post in posts {
        sheet.write_row(&[
            Cell::Text(&post.title),
            Cell::Integer(post.score),
            Cell::DateTime(post.date),
            Cell::Integer(post.comments),
            Cell::Text(&post.body),
            Cell::Text(&post.subreddit),
        ])?;
    }
    Ok(())
}

pub fn read_raw_posts(table: &SheetTable) -> Result<Vec<RawPost>, DataShapeError> {
    let [title, score, date, comments, body, subreddit] =
        table.require_columns(RAW_POST_COLUMNS)?;

    (0..table.len())
        .map(|row| {
            Ok(RawPost {
                title: table.text(row, title),
                score: table.integer(row, score)?,
                date: table.datetime(row, date)?,
                comments: table.integer(row, comments)?,
                body: table.text(row, body),
                subreddit: table.text(row, subreddit),
            })
        })
        .collect()
}

pub fn write_weekly(
    writer: &mut WorkbookWriter,
    sheet: &str,
    weeks: &[WeeklySentiment],
) -> Result<(), WorkbookError> {
    let mut sheet = writer.add_sheet(sheet, &WEEKLY_COLUMNS)?;
    for week in weeks {
        sheet.write_row(&[
            Cell::Date(week.date),
            Cell::Number(week.compound_sentiment),
            Cell::Number(week.weighted_sentiment),
            Cell::Integer(i64::from(week.mentions)),
            Cell::Number(week.engagement_metrics),
        ])?;
    }
    Ok(())
}

pub fn read_weekly(table: &SheetTable) -> Result<Vec<WeeklySentiment>, DataShapeError> {
    let [date, compound, weighted, mentions, engagement] =
        table.require_columns(WEEKLY_COLUMNS)?;

    (0..table.len())
        .map(|row| {
            Ok(WeeklySentiment {
                date: table.date(row, date)?,
                compound_sentiment: table.float(row, compound)?,
                weighted_sentiment: table.float(row, weighted)?,
                mentions: read_count(table, row, mentions)?,
                engagement_metrics: table.float(row, engagement)?,
            })
        })
        .collect()
}

pub fn write_merged(
    writer: &mut WorkbookWriter,
    sheet: &str,
    records: &[MergedRecord],
) -> Result<(), WorkbookError> {
    let mut sheet = writer.add_sheet(sheet, &MERGED_COLUMNS)?;
    for record in records {
        sheet.write_row(&[
            Cell::Date(record.date),
            Cell::Date(record.adjusted_date),
            Cell::Number(record.compound_sentiment),
            Cell::Number(record.weighted_sentiment),
            Cell::Integer(i64::from(record.mentions)),
            Cell::Number(record.engagement_metrics),
            Cell::Number(record.close),
            record.returns.map_or(Cell::Empty, Cell::Number),
        ])?;
    }
    Ok(())
}

pub fn read_merged(table: &SheetTable) -> Result<Vec<MergedRecord>, DataShapeError> {
    let [date, adjusted, compound, weighted, mentions, engagement, close, returns] =
        table.require_columns(MERGED_COLUMNS)?;

    (0..table.len())
        .map(|row| {
            Ok(MergedRecord {
                date: table.date(row, date)?,
                adjusted_date: table.date(row, adjusted)?,
                compound_sentiment: table.float(row, compound)?,
                weighted_sentiment: table.float(row, weighted)?,
                mentions: read_count(table, row, mentions)?,
                engagement_metrics: table.float(row, engagement)?,
                close: table.float(row, close)?,
                returns: table.optional_float(row, returns)?,
            })
        })
        .collect()
}

pub fn write_correlations(
    writer: &mut WorkbookWriter,
    results: &[CorrelationResult],
) -> Result<(), WorkbookError> {
    let mut sheet = writer.add_sheet(CORRELATION_SHEET, &CORRELATION_COLUMNS)?;
    for result in results {
        sheet.write_row(&[
            Cell::Text(&result.stock),
            Cell::Text(result.sentiment_component.column_name()),
            Cell::Text(result.stock_price_metric.column_name()),
            Cell::Number(result.correlation),
            Cell::Number(result.p_value),
        ])?;
    }
    Ok(())
}

pub fn read_correlations(table: &SheetTable) -> Result<Vec<CorrelationResult>, DataShapeError> {
    let [stock, component, metric, correlation, p_value] =
        table.require_columns(CORRELATION_COLUMNS)?;

    (0..table.len())
        .map(|row| {
            let component_name = table.text(row, component);
            let metric_name = table.text(row, metric);
            Ok(CorrelationResult {
                stock: table.text(row, stock),
                sentiment_component: SentimentFeature::from_column_name(&component_name)
                    .ok_or_else(|| invalid_name(table, row, SENTIMENT_COMPONENT, component_name))?,
                stock_price_metric: PriceMetric::from_column_name(&metric_name)
                    .ok_or_else(|| invalid_name(table, row, STOCK_PRICE_METRIC, metric_name))?,
                correlation: table.float(row, correlation)?,
                p_value: table.float(row, p_value)?,
            })
        })
        .collect()
}

fn read_count(table: &SheetTable, row: usize, col: usize) -> Result<u32, DataShapeError> {
    let value = table.integer(row, col)?;
    u32::try_from(value).map_err(|_| DataShapeError::InvalidCell {
        sheet: table.name().to_string(),
        row: row + 2,
        column: table.headers()[col].clone(),
        expected: "non-negative count".to_string(),
        found: value.to_string(),
    })
}

fn invalid_name(table: &SheetTable, row: usize, column: &str, found: String) -> DataShapeError {
    DataShapeError::InvalidCell {
        sheet: table.name().to_string(),
        row: row + 2,
        column: column.to_string(),
        expected: "known column name".to_string(),
        found,
    }
}
