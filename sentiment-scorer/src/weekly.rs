//! Weekly bucketing of scored posts.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use sentiment_core::{ScoredPost, SentimentCategory, WeeklySentiment};
use std::collections::BTreeMap;

/// Label of the Monday..Sunday week containing `timestamp`: the Sunday on or
/// after its calendar date.
pub fn week_ending(timestamp: NaiveDateTime) -> NaiveDate {
    let date = timestamp.date();
    let days_to_sunday = 6 - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(days_to_sunday)
}

#[derive(Default)]
struct Bucket {
    compound_sum: f64,
    weighted_sum: f64,
    engagement_sum: f64,
    mentions: u32,
}

/// Averages posts per week. Weeks without posts do not appear and the result
/// is ordered by week.
pub fn aggregate_weekly(posts: &[ScoredPost]) -> Vec<WeeklySentiment> {
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();

    for post in posts {
        let bucket = buckets.entry(week_ending(post.post.date)).or_default();
        bucket.compound_sum += post.compound_sentiment;
        bucket.weighted_sum += post.weighted_sentiment;
        bucket.engagement_sum += post.engagement_metrics;
        bucket.mentions += 1;
    }

    buckets
        .into_iter()
        .map(|(date, bucket)| {
            let n = f64::from(bucket.mentions);
            WeeklySentiment {
                date,
                compound_sentiment: bucket.compound_sum / n,
                weighted_sentiment: bucket.weighted_sum / n,
                mentions: bucket.mentions,
                engagement_metrics: bucket.engagement_sum / n,
            }
        })
        .collect()
}

/// Posts per sentiment category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl CategoryCounts {
    pub fn tally(posts: &[ScoredPost]) -> Self {
        posts.iter().fold(Self::default(), |mut counts, post| {
            match post.category {
                SentimentCategory::Positive => counts.positive += 1,
                SentimentCategory::Negative => counts.negative += 1,
                SentimentCategory::Neutral => counts.neutral += 1,
            }
            counts
        })
    }
}
