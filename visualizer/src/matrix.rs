//! Pairwise correlations shown in the dashboard heatmap.

use correlator::pearson;
use sentiment_core::{MergedRecord, PriceMetric, SentimentFeature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatmapColumn {
    Sentiment(SentimentFeature),
    Price(PriceMetric),
}

impl HeatmapColumn {
    pub fn value(&self, record: &MergedRecord) -> Option<f64> {
        let value = match *self {
            HeatmapColumn::Sentiment(feature) => Some(record.feature(feature)),
            HeatmapColumn::Price(metric) => record.price_metric(metric),
        };
        value.filter(|v| v.is_finite())
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeatmapColumn::Sentiment(feature) => feature.column_name(),
            HeatmapColumn::Price(metric) => metric.column_name(),
        }
    }
}

pub const HEATMAP_COLUMNS: [HeatmapColumn; 5] = [
    HeatmapColumn::Sentiment(SentimentFeature::CompoundSentiment),
    HeatmapColumn::Sentiment(SentimentFeature::WeightedSentiment),
    HeatmapColumn::Sentiment(SentimentFeature::Mentions),
    HeatmapColumn::Price(PriceMetric::Close),
    HeatmapColumn::Price(PriceMetric::Returns),
];

/// `None` where a pair has no defined correlation.
pub type CorrelationMatrix = [[Option<f64>; HEATMAP_COLUMNS.len()]; HEATMAP_COLUMNS.len()];

/// Pearson r for every pair of heatmap columns, each pair using the rows
/// where both values exist.
pub fn correlation_matrix(records: &[MergedRecord]) -> CorrelationMatrix {
    let mut matrix = [[None; HEATMAP_COLUMNS.len()]; HEATMAP_COLUMNS.len()];

    for (i, row) in HEATMAP_COLUMNS.iter().enumerate() {
        for (j, col) in HEATMAP_COLUMNS.iter().enumerate() {
            let (xs, ys): (Vec<f64>, Vec<f64>) = records
                .iter()
                .filter_map(|record| Some((row.value(record)?, col.value(record)?)))
                .unzip();
            matrix[i][j] = pearson(&xs, &ys).map(|p| p.r);
        }
    }
    matrix
}

/// Upper y limit of the mentions chart: 20% above the busiest week.
pub fn mentions_axis_limit(records: &[MergedRecord]) -> f64 {
    let max = records.iter().map(|r| r.mentions).max().unwrap_or(0);
    if max == 0 {
        1.0
    } else {
        f64::from(max) * 1.2
    }
}

pub fn annotation(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "nan".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, compound: f64, mentions: u32, close: f64, returns: Option<f64>) -> MergedRecord {
        let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        MergedRecord {
            date,
            adjusted_date: date,
            compound_sentiment: compound,
            weighted_sentiment: -compound,
            mentions,
            engagement_metrics: 1.0,
            close,
            returns,
        }
    }

    #[test]
    fn test_matrix_is_symmetric_with_unit_diagonal() {
        let records = vec![
            record(2, 0.1, 4, 10.0, None),
            record(9, 0.4, 2, 11.0, Some(10.0)),
            record(16, 0.2, 7, 10.5, Some(-4.5)),
            record(23, 0.6, 3, 12.0, Some(14.3)),
        ];

        let matrix = correlation_matrix(&records);

        for i in 0..HEATMAP_COLUMNS.len() {
            assert!((matrix[i][i].unwrap() - 1.0).abs() < 1e-9);
            for j in 0..HEATMAP_COLUMNS.len() {
                let (a, b) = (matrix[i][j].unwrap(), matrix[j][i].unwrap());
                assert!((a - b).abs() < 1e-9);
            }
        }
        // Weighted is the mirror image of Compound here
        assert!((matrix[0][1].unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_pairs_are_none() {
        // constant mentions, and returns has a single value
        let records = vec![
            record(2, 0.1, 5, 10.0, None),
            record(9, 0.3, 5, 12.0, Some(20.0)),
        ];

        let matrix = correlation_matrix(&records);

        assert_eq!(matrix[2][2], None);
        assert_eq!(matrix[2][3], None);
        assert_eq!(matrix[4][0], None);
        assert_eq!(matrix[4][4], None);
        assert!(matrix[0][3].is_some());
        assert_eq!(annotation(matrix[4][4]), "nan");
    }

    #[test]
    fn test_mentions_axis_limit() {
        let records = vec![record(2, 0.1, 5, 10.0, None), record(9, 0.3, 10, 12.0, None)];
        assert!((mentions_axis_limit(&records) - 12.0).abs() < 1e-9);
        assert_eq!(mentions_axis_limit(&[]), 1.0);
    }

    #[test]
    fn test_annotation_format() {
        assert_eq!(annotation(Some(0.123456)), "0.12");
        assert_eq!(annotation(Some(-1.0)), "-1.00");
    }

    #[test]
    fn test_labels_use_column_names() {
        let labels: Vec<_> = HEATMAP_COLUMNS.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Compound_Sentiment",
                "Weighted_Sentiment",
                "Mentions",
                "Close",
                "Returns"
            ]
        );
    }
}
