//! Reddit collection stage.
//!
//! Searches every configured subreddit for every ticker, keeps posts created
//! on or after the collection start, normalizes their text and saves one
//! sheet per ticker.

pub mod lemmatizer;
pub mod normalize;
pub mod stopwords;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reddit_client::api::RedditPostData;
use reddit_client::{RedditClient, SearchResults};
use sentiment_core::sheets::write_raw_posts;
use sentiment_core::workbook::WorkbookWriter;
use sentiment_core::{CoreError, PipelineConfig, RawPost, Stage, StageReport, TickerConfig};
use std::path::Path;
use tracing::{debug, info, warn};

pub use normalize::TextNormalizer;

/// Where search results come from.
#[async_trait]
pub trait PostSource: Send {
    /// Called once before any search; an error here aborts the stage.
    async fn authenticate(&mut self) -> Result<(), CoreError>;

    async fn search(&mut self, subreddit: &str, query: &str, limit: u32) -> SearchResults;
}

#[async_trait]
impl PostSource for RedditClient {
    async fn authenticate(&mut self) -> Result<(), CoreError> {
        RedditClient::authenticate(self).await
    }

    async fn search(&mut self, subreddit: &str, query: &str, limit: u32) -> SearchResults {
        RedditClient::search(self, subreddit, query, limit).await
    }
}

/// Posts gathered for one ticker across all subreddits, in search order.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerPosts {
    pub symbol: String,
    pub posts: Vec<RawPost>,
}

/// Converts one search hit, or `None` when it predates `start`.
pub fn to_raw_post(
    submission: &RedditPostData,
    searched_subreddit: &str,
    start: NaiveDateTime,
    normalizer: &TextNormalizer,
) -> Option<RawPost> {
    let created = submission.created_at()?;
    if created < start {
        return None;
    }

    let subreddit = if submission.subreddit.is_empty() {
        searched_subreddit.to_string()
    } else {
        submission.subreddit.clone()
    };

    Some(RawPost {
        title: normalizer.normalize(&submission.title),
        score: submission.score,
        date: created,
        comments: submission.num_comments,
        body: normalizer.normalize(&submission.selftext),
        subreddit,
    })
}

/// Runs every (ticker, subreddit) search.
///
/// A failed search is recorded in `report` and the pairs after it still run;
/// whatever pages it fetched before failing are kept. An error that cannot be
/// skipped, such as a rejected token, stops collection: the tickers searched
/// so far are returned and the ones not reached are recorded as skipped.
/// Only a failed authentication is returned as `Err`.
pub async fn collect_posts<S: PostSource + ?Sized>(
    source: &mut S,
    tickers: &[TickerConfig],
    subreddits: &[String],
    start: NaiveDateTime,
    limit: u32,
    normalizer: &TextNormalizer,
    report: &mut StageReport,
) -> Result<Vec<TickerPosts>, CoreError> {
    source.authenticate().await?;

    let mut collected = Vec::with_capacity(tickers.len());
    let mut stopped_by: Option<CoreError> = None;

    for ticker in tickers {
        if let Some(error) = &stopped_by {
            report.record_skipped(ticker.symbol.as_str(), error);
            continue;
        }
        let mut posts = Vec::new();

        for subreddit in subreddits {
            info!(
                "Searching r/{} for {} ({:?})",
                subreddit, ticker.symbol, ticker.query
            );
            let results = source.search(subreddit, &ticker.query, limit).await;
            let fetched = results.submissions.len();

            let before = posts.len();
            posts.extend(
                results
                    .submissions
                    .iter()
                    .filter_map(|s| to_raw_post(s, subreddit, start, normalizer)),
            );
            debug!(
                "r/{}: kept {} of {} results for {}",
                subreddit,
                posts.len() - before,
                fetched,
                ticker.symbol
            );

            if let Some(error) = results.error {
                let item = format!("{} in r/{}", ticker.symbol, subreddit);
                if let Err(error) = report.skip_or_fail(item.as_str(), error) {
                    warn!("Stopping collection after {}: {}", item, error);
                    report.record_skipped(item, &error);
                    stopped_by = Some(error);
                    break;
                }
            }
        }

        info!("Collected {} posts for {}", posts.len(), ticker.symbol);
        collected.push(TickerPosts {
            symbol: ticker.symbol.clone(),
            posts,
        });
    }

    Ok(collected)
}

/// Writes one sheet per ticker that has posts. Nothing is written when no
/// ticker has any.
pub fn save_posts(
    path: &Path,
    collected: &[TickerPosts],
    report: &mut StageReport,
) -> Result<(), CoreError> {
    let mut writer = WorkbookWriter::new();

    for ticker in collected {
        if ticker.posts.is_empty() {
            report.record_skipped(
                ticker.symbol.as_str(),
                &CoreError::InvalidInput {
                    message: format!("no posts found for {}", ticker.symbol),
                },
            );
            continue;
        }
        write_raw_posts(&mut writer, &ticker.symbol, &ticker.posts)?;
        report.record_written(ticker.symbol.as_str());
    }

    if writer.sheet_count() == 0 {
        warn!("No posts collected for any ticker, {} not written", path.display());
        return Ok(());
    }

    writer.save(path)?;
    report.record_output(path.to_path_buf());
    Ok(())
}

/// The whole collection stage against `source`.
pub async fn run_collector<S: PostSource + ?Sized>(
    config: &PipelineConfig,
    source: &mut S,
) -> Result<StageReport, CoreError> {
    let mut report = StageReport::new(Stage::Collect);
    let normalizer = TextNormalizer::new()?;

    info!(
        "Collecting posts for {} tickers from {} subreddits since {}",
        config.tickers.len(),
        config.reddit.subreddits.len(),
        config.reddit.start_date
    );

    let collected = collect_posts(
        source,
        &config.tickers,
        &config.reddit.subreddits,
        config.collection_start(),
        config.reddit.search_limit,
        &normalizer,
        &mut report,
    )
    .await?;

    save_posts(&config.raw_posts_path(), &collected, &mut report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentiment_core::sheets::read_raw_posts;
    use sentiment_core::workbook::WorkbookReader;
    use sentiment_core::{RedditApiError, StageOutcome};
    use std::collections::HashMap;

    /// In-memory search backend keyed by (subreddit, query).
    #[derive(Default)]
    struct FakeSource {
        results: HashMap<(String, String), Vec<RedditPostData>>,
        failures: HashMap<(String, String), RedditApiError>,
        auth_error: Option<RedditApiError>,
        searches: Vec<(String, String)>,
    }

    impl FakeSource {
        fn with_posts(mut self, subreddit: &str, query: &str, posts: Vec<RedditPostData>) -> Self {
            self.results
                .insert((subreddit.to_string(), query.to_string()), posts);
            self
        }

        fn failing(mut self, subreddit: &str, query: &str, error: RedditApiError) -> Self {
            self.failures
                .insert((subreddit.to_string(), query.to_string()), error);
            self
        }
    }

    #[async_trait]
    impl PostSource for FakeSource {
        async fn authenticate(&mut self) -> Result<(), CoreError> {
            match &self.auth_error {
                Some(e) => Err(CoreError::RedditApi(e.clone())),
                None => Ok(()),
            }
        }

        async fn search(&mut self, subreddit: &str, query: &str, limit: u32) -> SearchResults {
            let key = (subreddit.to_string(), query.to_string());
            self.searches.push(key.clone());
            let mut submissions = self.results.get(&key).cloned().unwrap_or_default();
            submissions.truncate(limit as usize);
            SearchResults {
                pages: 1,
                submissions,
                error: self
                    .failures
                    .get(&key)
                    .map(|e| CoreError::RedditApi(e.clone())),
            }
        }
    }

    fn submission(title: &str, body: &str, created_utc: f64) -> RedditPostData {
        RedditPostData {
            id: format!("id{}", created_utc as i64),
            title: title.to_string(),
            selftext: body.to_string(),
            subreddit: "stocks".to_string(),
            permalink: String::new(),
            created_utc,
            score: 10,
            num_comments: 4,
        }
    }

    fn config(dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.tickers = vec![
            TickerConfig::new("GME", "GME stock", "GameStop Corp."),
            TickerConfig::new("AMC", "AMC stock", "AMC Entertainment Holdings"),
        ];
        config.reddit.subreddits = vec!["stocks".to_string(), "wallstreetbets".to_string()];
        config.output.directory = dir.to_path_buf();
        config
    }

    // 2024-01-05 13:20:00 UTC
    const JAN_5_2024: f64 = 1_704_460_800.0;
    // 2019-12-31 00:00:00 UTC
    const DEC_31_2019: f64 = 1_577_750_400.0;

    #[tokio::test]
    async fn test_collects_filters_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut source = FakeSource::default().with_posts(
            "stocks",
            "GME stock",
            vec![
                submission("GME to the MOON!!", "Buying more shares https://x.io", JAN_5_2024),
                submission("Old news", "", DEC_31_2019),
            ],
        );

        let report = run_collector(&config, &mut source).await.unwrap();

        assert_eq!(source.searches.len(), 4);
        assert_eq!(report.written, vec!["GME".to_string()]);
        assert!(report.is_skipped("AMC"));
        assert_eq!(report.outcome(), StageOutcome::Partial);

        let mut reader = WorkbookReader::open(&config.raw_posts_path()).unwrap();
        assert_eq!(reader.sheet_names(), vec!["GME".to_string()]);
        let posts = read_raw_posts(&reader.sheet("GME").unwrap()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "gme moon");
        assert_eq!(posts[0].body, "buying share");
        assert_eq!(posts[0].score, 10);
        assert_eq!(posts[0].comments, 4);
        assert_eq!(posts[0].date.to_string(), "2024-01-05 13:20:00");
    }

    #[tokio::test]
    async fn test_failed_pair_is_skipped_and_others_continue() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut source = FakeSource::default()
            .with_posts("stocks", "GME stock", vec![submission("gme", "", JAN_5_2024)])
            .with_posts(
                "wallstreetbets",
                "AMC stock",
                vec![submission("amc squeeze", "", JAN_5_2024)],
            )
            .failing(
                "wallstreetbets",
                "GME stock",
                RedditApiError::ServerError { status_code: 503 },
            );

        let report = run_collector(&config, &mut source).await.unwrap();

        assert_eq!(source.searches.len(), 4);
        assert_eq!(report.skipped_count(), 1);
        assert!(report.is_skipped("GME in r/wallstreetbets"));
        assert_eq!(report.written, vec!["GME".to_string(), "AMC".to_string()]);
    }

    #[tokio::test]
    async fn test_partial_pages_are_kept() {
        let normalizer = TextNormalizer::new().unwrap();
        let tickers = vec![TickerConfig::new("GME", "GME stock", "GameStop Corp.")];
        let subreddits = vec!["stocks".to_string()];
        let mut source = FakeSource::default()
            .with_posts("stocks", "GME stock", vec![submission("first page", "", JAN_5_2024)])
            .failing(
                "stocks",
                "GME stock",
                RedditApiError::RateLimitExceeded { retry_after: 60 },
            );
        let mut report = StageReport::new(Stage::Collect);

        let collected = collect_posts(
            &mut source,
            &tickers,
            &subreddits,
            PipelineConfig::default().collection_start(),
            100,
            &normalizer,
            &mut report,
        )
        .await
        .unwrap();

        assert_eq!(collected[0].posts.len(), 1);
        assert_eq!(report.skipped_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_keeps_collected_posts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut source = FakeSource::default()
            .with_posts("stocks", "GME stock", vec![submission("gme squeeze", "", JAN_5_2024)])
            .with_posts("stocks", "AMC stock", vec![submission("amc", "", JAN_5_2024)])
            .failing("wallstreetbets", "GME stock", RedditApiError::InvalidToken);

        let report = run_collector(&config, &mut source).await.unwrap();

        // AMC is never searched once the token is rejected.
        assert_eq!(source.searches.len(), 2);
        assert!(report.is_skipped("GME in r/wallstreetbets"));
        assert!(report.is_skipped("AMC"));
        assert_eq!(report.written, vec!["GME".to_string()]);
        assert_eq!(report.outcome(), StageOutcome::Partial);

        let mut reader = WorkbookReader::open(&config.raw_posts_path()).unwrap();
        assert_eq!(reader.sheet_names(), vec!["GME".to_string()]);
        let posts = read_raw_posts(&reader.sheet("GME").unwrap()).unwrap();
        assert_eq!(posts[0].title, "gme squeeze");
    }

    #[tokio::test]
    async fn test_authentication_failure_fails_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut source = FakeSource {
            auth_error: Some(RedditApiError::AuthenticationFailed {
                reason: "invalid_client".to_string(),
            }),
            ..FakeSource::default()
        };

        let result = run_collector(&config, &mut source).await;

        assert!(result.is_err());
        assert!(source.searches.is_empty());
    }

    #[tokio::test]
    async fn test_no_posts_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut source = FakeSource::default();

        let report = run_collector(&config, &mut source).await.unwrap();

        assert_eq!(report.outcome(), StageOutcome::Empty);
        assert_eq!(report.skipped_count(), 2);
        assert!(report.outputs.is_empty());
        assert!(!config.raw_posts_path().exists());
    }

    #[test]
    fn test_start_date_is_inclusive() {
        let normalizer = TextNormalizer::new().unwrap();
        let start = PipelineConfig::default().collection_start();
        // 2020-01-01 00:00:00 UTC
        let on_start = submission("launch", "", 1_577_836_800.0);
        let just_before = submission("launch", "", 1_577_836_799.0);

        assert!(to_raw_post(&on_start, "stocks", start, &normalizer).is_some());
        assert!(to_raw_post(&just_before, "stocks", start, &normalizer).is_none());
    }

    #[test]
    fn test_missing_subreddit_falls_back_to_searched_one() {
        let normalizer = TextNormalizer::new().unwrap();
        let mut hit = submission("title", "", JAN_5_2024);
        hit.subreddit.clear();

        let start = PipelineConfig::default().collection_start();
        let post = to_raw_post(&hit, "investing", start, &normalizer).unwrap();
        assert_eq!(post.subreddit, "investing");
    }
}
