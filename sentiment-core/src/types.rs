use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers shared by the workbooks the stages hand to each other.
pub mod columns {
    pub const TITLE: &str = "Title";
    pub const SCORE: &str = "Score";
    pub const DATE: &str = "Date";
    pub const COMMENTS: &str = "Comments";
    pub const BODY: &str = "Body";
    pub const SUBREDDIT: &str = "Subreddit";
    pub const COMPOUND_SENTIMENT: &str = "Compound_Sentiment";
    pub const WEIGHTED_SENTIMENT: &str = "Weighted_Sentiment";
    pub const MENTIONS: &str = "Mentions";
    pub const ENGAGEMENT_METRICS: &str = "Engagement_Metrics";
    pub const ADJUSTED_DATE: &str = "Adjusted_Date";
    pub const CLOSE: &str = "Close";
    pub const RETURNS: &str = "Returns";
    pub const STOCK: &str = "Stock";
    pub const SENTIMENT_COMPONENT: &str = "Sentiment_Component";
    pub const STOCK_PRICE_METRIC: &str = "Stock_Price_Metric";
    pub const CORRELATION: &str = "Correlation";
    pub const P_VALUE: &str = "P-Value";
}

/// One search result as collected, with normalized text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub title: String,
    pub score: i64,
    pub date: NaiveDateTime,
    pub comments: i64,
    pub body: String,
    pub subreddit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl SentimentCategory {
    pub const POSITIVE_THRESHOLD: f64 = 0.05;
    pub const NEGATIVE_THRESHOLD: f64 = -0.05;

    pub fn from_compound(compound: f64) -> Self {
        if compound >= Self::POSITIVE_THRESHOLD {
            SentimentCategory::Positive
        } else if compound <= Self::NEGATIVE_THRESHOLD {
            SentimentCategory::Negative
        } else {
            SentimentCategory::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::Positive => "Positive",
            SentimentCategory::Negative => "Negative",
            SentimentCategory::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPost {
    pub post: RawPost,
    pub title_sentiment: f64,
    pub body_sentiment: f64,
    pub compound_sentiment: f64,
    pub category: SentimentCategory,
    pub weighted_sentiment: f64,
    pub engagement_metrics: f64,
}

impl ScoredPost {
    pub fn new(post: RawPost, title_sentiment: f64, body_sentiment: f64) -> Self {
        let compound_sentiment = (title_sentiment + body_sentiment) / 2.0;
        let engagement = (post.score + post.comments) as f64;

        Self {
            title_sentiment,
            body_sentiment,
            compound_sentiment,
            category: SentimentCategory::from_compound(compound_sentiment),
            weighted_sentiment: engagement * compound_sentiment,
            engagement_metrics: engagement / 2.0,
            post,
        }
    }
}

/// Aggregate of one ticker's posts over the week ending on `date`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySentiment {
    pub date: NaiveDate,
    pub compound_sentiment: f64,
    pub weighted_sentiment: f64,
    pub mentions: u32,
    pub engagement_metrics: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPrice {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub date: NaiveDate,
    pub adjusted_date: NaiveDate,
    pub compound_sentiment: f64,
    pub weighted_sentiment: f64,
    pub mentions: u32,
    pub engagement_metrics: f64,
    pub close: f64,
    /// Percent change from the previous merged row; absent on the first row.
    pub returns: Option<f64>,
}

impl MergedRecord {
    pub fn feature(&self, feature: SentimentFeature) -> f64 {
        match feature {
            SentimentFeature::CompoundSentiment => self.compound_sentiment,
            SentimentFeature::WeightedSentiment => self.weighted_sentiment,
            SentimentFeature::Mentions => f64::from(self.mentions),
            SentimentFeature::EngagementMetrics => self.engagement_metrics,
        }
    }

    pub fn price_metric(&self, metric: PriceMetric) -> Option<f64> {
        match metric {
            PriceMetric::Close => Some(self.close),
            PriceMetric::Returns => self.returns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentFeature {
    #[serde(rename = "Compound_Sentiment")]
    CompoundSentiment,
    #[serde(rename = "Weighted_Sentiment")]
    WeightedSentiment,
    #[serde(rename = "Mentions")]
    Mentions,
    #[serde(rename = "Engagement_Metrics")]
    EngagementMetrics,
}

impl SentimentFeature {
    pub const ALL: [SentimentFeature; 4] = [
        SentimentFeature::CompoundSentiment,
        SentimentFeature::WeightedSentiment,
        SentimentFeature::Mentions,
        SentimentFeature::EngagementMetrics,
    ];

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            SentimentFeature::CompoundSentiment => columns::COMPOUND_SENTIMENT,
            SentimentFeature::WeightedSentiment => columns::WEIGHTED_SENTIMENT,
            SentimentFeature::Mentions => columns::MENTIONS,
            SentimentFeature::EngagementMetrics => columns::ENGAGEMENT_METRICS,
        }
    }
}

impl fmt::Display for SentimentFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceMetric {
    Close,
    Returns,
}

impl PriceMetric {
    pub fn from_column_name(name: &str) -> Option<Self> {
        [PriceMetric::Close, PriceMetric::Returns]
            .into_iter()
            .find(|m| m.column_name() == name)
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            PriceMetric::Close => columns::CLOSE,
            PriceMetric::Returns => columns::RETURNS,
        }
    }
}

impl fmt::Display for PriceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub stock: String,
    pub sentiment_component: SentimentFeature,
    pub stock_price_metric: PriceMetric,
    pub correlation: f64,
    pub p_value: f64,
}
