//! VADER sentiment scoring for post text.

use sentiment_core::{RawPost, ScoredPost};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Wraps the VADER analyzer. Build one per stage run and share it by
/// reference; loading the lexicon is the expensive part.
pub struct SentimentScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// VADER compound score in `[-1, 1]`; blank text scores 0.
    pub fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let scores = self.analyzer.polarity_scores(text);
        scores
            .get("compound")
            .copied()
            .filter(|score| score.is_finite())
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }

    pub fn score_post(&self, post: RawPost) -> ScoredPost {
        let title_sentiment = self.compound(&post.title);
        let body_sentiment = self.compound(&post.body);
        ScoredPost::new(post, title_sentiment, body_sentiment)
    }
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self::new()
    }
}
