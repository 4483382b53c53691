//! Lining weekly sentiment up with trading days.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sentiment_core::{DailyPrice, MergedRecord, WeeklySentiment};
use std::collections::HashMap;

/// Moves weekend dates back to the preceding Friday.
pub fn adjust_date(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}

/// Inner join of `weeks` (on their adjusted date) with `prices`, in week
/// order, followed by percent returns between consecutive joined rows.
///
/// Weeks whose adjusted date has no close are dropped; nothing is
/// interpolated.
pub fn merge_with_prices(weeks: &[WeeklySentiment], prices: &[DailyPrice]) -> Vec<MergedRecord> {
    let closes: HashMap<NaiveDate, f64> = prices.iter().map(|p| (p.date, p.close)).collect();

    let mut merged: Vec<MergedRecord> = weeks
        .iter()
        .filter_map(|week| {
            let adjusted_date = adjust_date(week.date);
            closes.get(&adjusted_date).map(|&close| MergedRecord {
                date: week.date,
                adjusted_date,
                compound_sentiment: week.compound_sentiment,
                weighted_sentiment: week.weighted_sentiment,
                mentions: week.mentions,
                engagement_metrics: week.engagement_metrics,
                close,
                returns: None,
            })
        })
        .collect();

    for i in 1..merged.len() {
        merged[i].returns = percent_change(merged[i - 1].close, merged[i].close);
    }
    merged
}

fn percent_change(previous: f64, current: f64) -> Option<f64> {
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week(date: NaiveDate, mentions: u32) -> WeeklySentiment {
        WeeklySentiment {
            date,
            compound_sentiment: 0.1,
            weighted_sentiment: 2.0,
            mentions,
            engagement_metrics: 5.0,
        }
    }

    #[test]
    fn test_weekend_dates_shift_to_friday() {
        let friday = date(2024, 1, 5);
        assert_eq!(adjust_date(date(2024, 1, 6)), friday);
        assert_eq!(adjust_date(date(2024, 1, 7)), friday);
        for day in 1..=5 {
            assert_eq!(adjust_date(date(2024, 1, day)), date(2024, 1, day));
        }
    }

    #[test]
    fn test_adjusted_dates_are_never_weekends() {
        let mut day = date(2023, 12, 1);
        while day < date(2024, 3, 1) {
            let adjusted = adjust_date(day);
            assert!(!matches!(adjusted.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(adjusted <= day && day - adjusted <= Duration::days(2));
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_merge_and_returns() {
        let weeks = vec![week(date(2024, 1, 6), 3), week(date(2024, 1, 13), 4)];
        let prices = vec![
            DailyPrice {
                date: date(2024, 1, 5),
                close: 10.0,
            },
            DailyPrice {
                date: date(2024, 1, 12),
                close: 11.0,
            },
        ];

        let merged = merge_with_prices(&weeks, &prices);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].adjusted_date, date(2024, 1, 5));
        assert_eq!(merged[0].date, date(2024, 1, 6));
        assert_eq!(merged[0].returns, None);
        assert_eq!(merged[1].close, 11.0);
        assert!((merged[1].returns.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_weeks_dropped() {
        let weeks = vec![
            week(date(2024, 1, 7), 1),
            week(date(2024, 1, 14), 2),
            week(date(2024, 1, 21), 3),
        ];
        // no close for 2024-01-12
        let prices = vec![
            DailyPrice {
                date: date(2024, 1, 5),
                close: 20.0,
            },
            DailyPrice {
                date: date(2024, 1, 19),
                close: 25.0,
            },
        ];

        let merged = merge_with_prices(&weeks, &prices);

        let adjusted: Vec<_> = merged.iter().map(|m| m.adjusted_date).collect();
        assert_eq!(adjusted, vec![date(2024, 1, 5), date(2024, 1, 19)]);
        assert!(adjusted
            .iter()
            .all(|d| prices.iter().any(|p| p.date == *d)));
        assert!((merged[1].returns.unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap_is_empty() {
        let weeks = vec![week(date(2024, 1, 7), 1)];
        assert!(merge_with_prices(&weeks, &[]).is_empty());
    }
}
