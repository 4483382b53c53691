//! Pearson correlation with a two-tailed p-value.

use sentiment_core::{CorrelationResult, MergedRecord, PriceMetric, SentimentFeature};
use statrs::function::beta::checked_beta_reg;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pearson {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson's r over paired samples.
///
/// `None` with fewer than two pairs or when either side is constant. The
/// p-value is the two-tailed Student-t probability with `n - 2` degrees of
/// freedom, written as the regularized incomplete beta `I_{1-r²}((n-2)/2, 1/2)`.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<Pearson> {
    let n = xs.len();
    if n != ys.len() || n < 2 {
        return None;
    }

    let sx = xs.std_dev();
    let sy = ys.std_dev();
    if !(sx > 0.0 && sy > 0.0) {
        return None;
    }
    let r = (xs.covariance(ys) / (sx * sy)).clamp(-1.0, 1.0);
    if !r.is_finite() {
        return None;
    }

    let p_value = if n == 2 {
        1.0
    } else {
        let df = (n - 2) as f64;
        let x = (1.0 - r * r).max(0.0);
        checked_beta_reg(df / 2.0, 0.5, x).ok()?.clamp(0.0, 1.0)
    };

    Some(Pearson { r, p_value, n })
}

/// Values of `feature` and `metric` from rows where both are present.
pub fn paired_values(
    records: &[MergedRecord],
    feature: SentimentFeature,
    metric: PriceMetric,
) -> (Vec<f64>, Vec<f64>) {
    records
        .iter()
        .filter_map(|record| {
            let x = record.feature(feature);
            let y = record.price_metric(metric)?;
            (x.is_finite() && y.is_finite()).then_some((x, y))
        })
        .unzip()
}

/// Every configured feature against Close, then Mentions against Returns.
/// Pairs without a defined correlation produce no row.
pub fn correlate_ticker(
    symbol: &str,
    records: &[MergedRecord],
    features: &[SentimentFeature],
) -> Vec<CorrelationResult> {
    features
        .iter()
        .map(|&feature| (feature, PriceMetric::Close))
        .chain(std::iter::once((
            SentimentFeature::Mentions,
            PriceMetric::Returns,
        )))
        .filter_map(|(feature, metric)| {
            let (xs, ys) = paired_values(records, feature, metric);
            let result = pearson(&xs, &ys)?;
            Some(CorrelationResult {
                stock: symbol.to_string(),
                sentiment_component: feature,
                stock_price_metric: metric,
                correlation: result.r,
                p_value: result.p_value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, compound: f64, mentions: u32, close: f64, returns: Option<f64>) -> MergedRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        MergedRecord {
            date,
            adjusted_date: date,
            compound_sentiment: compound,
            weighted_sentiment: compound * 10.0,
            mentions,
            engagement_metrics: 3.0,
            close,
            returns,
        }
    }

    #[test]
    fn test_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 6.0, 8.0, 10.0];
        let result = pearson(&xs, &ys).unwrap();
        assert!((result.r - 1.0).abs() < 1e-12);
        assert!(result.p_value < 1e-6);
        assert_eq!(result.n, 5);

        let inverse: Vec<f64> = ys.iter().map(|y| -y).collect();
        assert!((pearson(&xs, &inverse).unwrap().r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_known_p_value() {
        // r = 0.8, n = 5: t = 2.3094, two-tailed p = 0.1041
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [1.0, 3.0, 2.0, 5.0, 4.0];
        let result = pearson(&xs, &ys).unwrap();
        assert!((result.r - 0.8).abs() < 1e-12);
        assert!((result.p_value - 0.1041).abs() < 1e-3);
    }

    #[test]
    fn test_two_points_have_p_one() {
        let result = pearson(&[1.0, 2.0], &[5.0, 3.0]).unwrap();
        assert!((result.r + 1.0).abs() < 1e-12);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_undefined_cases() {
        assert!(pearson(&[], &[]).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_correlate_ticker_rows() {
        let records = vec![
            record(5, 0.1, 3, 10.0, None),
            record(12, 0.3, 5, 11.0, Some(10.0)),
            record(19, 0.2, 4, 12.1, Some(10.0)),
            record(26, 0.5, 9, 9.0, Some(-25.6)),
        ];
        let features = [
            SentimentFeature::CompoundSentiment,
            SentimentFeature::WeightedSentiment,
            SentimentFeature::Mentions,
        ];

        let results = correlate_ticker("GME", &records, &features);

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.stock == "GME"));
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.correlation)));
        let last = results.last().unwrap();
        assert_eq!(last.sentiment_component, SentimentFeature::Mentions);
        assert_eq!(last.stock_price_metric, PriceMetric::Returns);
    }

    #[test]
    fn test_returns_pairs_skip_first_row() {
        let records = vec![
            record(5, 0.1, 3, 10.0, None),
            record(12, 0.3, 5, 11.0, Some(10.0)),
        ];

        let (xs, ys) = paired_values(&records, SentimentFeature::Mentions, PriceMetric::Returns);
        assert_eq!(xs, vec![5.0]);
        assert_eq!(ys, vec![10.0]);

        let results = correlate_ticker("AMC", &records, &[SentimentFeature::Mentions]);
        // Mentions vs Close has two pairs, Mentions vs Returns only one
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].stock_price_metric, PriceMetric::Close);
    }

    #[test]
    fn test_too_few_rows_gives_no_results() {
        let records = vec![record(5, 0.1, 3, 10.0, None)];
        assert!(correlate_ticker("TSLA", &records, &SentimentFeature::ALL).is_empty());
    }
}
