//! Four-panel PNG dashboard per ticker.

use crate::matrix::{
    annotation, correlation_matrix, mentions_axis_limit, CorrelationMatrix, HEATMAP_COLUMNS,
};
use crate::palette;
use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use sentiment_core::{MergedRecord, RenderError};
use std::error::Error;
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// 16 x 14 inches at 300 dpi.
pub const DASHBOARD_SIZE: (u32, u32) = (16 * DPI, 14 * DPI);

const DPI: u32 = 300;
/// Layout sizes below are written for 100 dpi.
const SCALE: u32 = DPI / 100;

const FONT: &str = "sans-serif";
const BAR_HALF_WIDTH_DAYS: f64 = 2.5;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

pub fn dashboard_title(company: &str) -> String {
    format!("{} - Sentiment and Stock Analysis", company)
}

/// Renders `records` to `path`.
pub fn render_dashboard(
    path: &Path,
    symbol: &str,
    company: &str,
    records: &[MergedRecord],
) -> Result<(), RenderError> {
    if records.is_empty() {
        return Err(RenderError::EmptySeries {
            ticker: symbol.to_string(),
        });
    }

    draw_dashboard(path, company, records).map_err(|e| RenderError::DrawingFailed {
        ticker: symbol.to_string(),
        reason: e.to_string(),
    })?;
    debug!("Rendered {} weeks for {} to {}", records.len(), symbol, path.display());
    Ok(())
}

fn draw_dashboard(path: &Path, company: &str, records: &[MergedRecord]) -> DrawResult {
    let root = BitMapBackend::new(path, DASHBOARD_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(
        &dashboard_title(company),
        (FONT, px(36)).into_font().style(FontStyle::Bold),
    )?;

    let panels = root.split_evenly((2, 2));
    draw_price_panel(
        &panels[0],
        records,
        "Price vs Compound Sentiment",
        "Compound Sentiment",
        |r| r.compound_sentiment,
        palette::sample(2, 10),
    )?;
    draw_mentions_panel(&panels[1], records)?;
    draw_heatmap_panel(&panels[2], &correlation_matrix(records))?;
    draw_price_panel(
        &panels[3],
        records,
        "Price vs Weighted Sentiment",
        "Weighted Sentiment",
        |r| r.weighted_sentiment,
        palette::sample(1, 10),
    )?;

    root.present()?;
    Ok(())
}

/// Close on the left axis, a dashed sentiment series on the right.
fn draw_price_panel(
    area: &Panel<'_>,
    records: &[MergedRecord],
    title: &str,
    sentiment_label: &str,
    sentiment: fn(&MergedRecord) -> f64,
    sentiment_color: RGBColor,
) -> DrawResult {
    let close_color = palette::sample(9, 10);
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let values: Vec<f64> = records.iter().map(sentiment).collect();
    let days = day_range(records);

    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, px(22)))
        .margin(px(15))
        .x_label_area_size(px(50))
        .y_label_area_size(px(70))
        .right_y_label_area_size(px(70))
        .build_cartesian_2d(days.clone(), padded_range(&closes))?
        .set_secondary_coord(days, padded_range(&values));

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Close Price")
        .x_labels(6)
        .x_label_formatter(&format_day)
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc(sentiment_label)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            records.iter().map(|r| (day_number(r.adjusted_date), r.close)),
            close_color.stroke_width(line_px(2)),
        ))?
        .label("Close Price")
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + px(20), y)], close_color)
        });
    chart
        .draw_secondary_series(DashedLineSeries::new(
            records
                .iter()
                .map(|r| (day_number(r.adjusted_date), sentiment(r))),
            line_px(6),
            line_px(4),
            sentiment_color.stroke_width(line_px(2)),
        ))?
        .label(sentiment_label)
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + px(20), y)], sentiment_color)
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_mentions_panel(area: &Panel<'_>, records: &[MergedRecord]) -> DrawResult {
    let bar_color = palette::sample(3, 10);

    let mut chart = ChartBuilder::on(area)
        .caption("Stock Mentions Over Time", (FONT, px(22)))
        .margin(px(15))
        .x_label_area_size(px(50))
        .y_label_area_size(px(70))
        .build_cartesian_2d(day_range(records), 0.0..mentions_axis_limit(records))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Mentions")
        .x_labels(6)
        .x_label_formatter(&format_day)
        .draw()?;

    chart.draw_series(records.iter().map(|r| {
        let x = day_number(r.adjusted_date);
        Rectangle::new(
            [
                (x - BAR_HALF_WIDTH_DAYS, 0.0),
                (x + BAR_HALF_WIDTH_DAYS, f64::from(r.mentions)),
            ],
            bar_color.filled(),
        )
    }))?;
    Ok(())
}

/// Grid of annotated cells. Row 0 is drawn at the top; the space left of and
/// below the grid holds the column names.
fn draw_heatmap_panel(area: &Panel<'_>, matrix: &CorrelationMatrix) -> DrawResult {
    let n = HEATMAP_COLUMNS.len() as f64;
    let mut chart = ChartBuilder::on(area)
        .caption("Correlation Heatmap", (FONT, px(22)))
        .margin(px(15))
        .build_cartesian_2d(-2.2..n, -0.8..n)?;

    let cells = || {
        matrix.iter().enumerate().flat_map(|(row, values)| {
            values
                .iter()
                .enumerate()
                .map(move |(col, value)| (col as f64, n - 1.0 - row as f64, *value))
        })
    };

    chart.draw_series(cells().map(|(x, y, value)| {
        Rectangle::new(
            [(x, y), (x + 1.0, y + 1.0)],
            palette::correlation_color(value).filled(),
        )
    }))?;
    chart.draw_series(cells().map(|(x, y, value)| {
        Text::new(
            annotation(value),
            (x + 0.5, y + 0.5),
            (FONT, px(16))
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        )
    }))?;

    chart.draw_series(HEATMAP_COLUMNS.iter().enumerate().map(|(i, column)| {
        Text::new(
            column.label(),
            (-0.1, n - 0.5 - i as f64),
            (FONT, px(14))
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Right, VPos::Center)),
        )
    }))?;
    chart.draw_series(HEATMAP_COLUMNS.iter().enumerate().map(|(i, column)| {
        Text::new(
            short_label(column.label()),
            (i as f64 + 0.5, -0.15),
            (FONT, px(14))
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        )
    }))?;
    Ok(())
}

fn px(size: i32) -> i32 {
    size * SCALE as i32
}

fn line_px(width: u32) -> u32 {
    width * SCALE
}

fn short_label(label: &str) -> &str {
    label.split('_').next().unwrap_or(label)
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn format_day(day: &f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(day.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Adjusted dates of `records` with a week of room on both sides.
fn day_range(records: &[MergedRecord]) -> Range<f64> {
    let days = records.iter().map(|r| day_number(r.adjusted_date));
    let min = days.clone().fold(f64::INFINITY, f64::min);
    let max = days.fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        (min - 7.0)..(max + 7.0)
    } else {
        0.0..1.0
    }
}

/// Value range with 5% headroom; a flat series gets a unit band around it.
fn padded_range(values: &[f64]) -> Range<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    if !(min.is_finite() && max.is_finite()) {
        return 0.0..1.0;
    }
    let span = max - min;
    if span == 0.0 {
        (min - 1.0)..(max + 1.0)
    } else {
        (min - span * 0.05)..(max + span * 0.05)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, mentions: u32, close: f64, returns: Option<f64>) -> MergedRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        MergedRecord {
            date,
            adjusted_date: date,
            compound_sentiment: 0.05 * f64::from(mentions),
            weighted_sentiment: f64::from(mentions),
            mentions,
            engagement_metrics: 2.0,
            close,
            returns,
        }
    }

    #[test]
    fn test_title() {
        assert_eq!(
            dashboard_title("GameStop Corp."),
            "GameStop Corp. - Sentiment and Stock Analysis"
        );
    }

    #[test]
    fn test_size_is_print_resolution() {
        assert_eq!(DASHBOARD_SIZE, (4800, 4200));
        assert_eq!(px(22), 66);
        assert_eq!(line_px(2), 6);
    }

    #[test]
    fn test_day_axis_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(format_day(&day_number(date)), "2024-03-01");
    }

    #[test]
    fn test_ranges() {
        assert_eq!(padded_range(&[5.0, 5.0]), 4.0..6.0);
        assert_eq!(padded_range(&[]), 0.0..1.0);
        let range = padded_range(&[0.0, 10.0]);
        assert!((range.start + 0.5).abs() < 1e-9 && (range.end - 10.5).abs() < 1e-9);

        let records = vec![record(1, 2, 10.0, None), record(8, 3, 11.0, Some(10.0))];
        let days = day_range(&records);
        assert_eq!(days.end - days.start, 21.0);
    }

    #[test]
    fn test_empty_records_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GME_dashboard.png");
        let error = render_dashboard(&path, "GME", "GameStop Corp.", &[]).unwrap_err();
        assert!(matches!(error, RenderError::EmptySeries { ticker } if ticker == "GME"));
        assert!(!path.exists());
    }

    #[test]
    #[ignore = "needs system fonts"]
    fn test_renders_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GME_dashboard.png");
        let records = vec![
            record(1, 2, 10.0, None),
            record(8, 5, 11.0, Some(10.0)),
            record(15, 3, 10.5, Some(-4.5)),
        ];

        render_dashboard(&path, "GME", "GameStop Corp.", &records).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
