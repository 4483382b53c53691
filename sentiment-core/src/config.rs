//! Pipeline parameters.
//!
//! Every stage reads the same [`PipelineConfig`]. The defaults reproduce the
//! tickers, forums and date window the pipeline was built around; a
//! `pipeline.toml` in the working directory overrides any subset of them.

use crate::error::ConfigError;
use crate::sheets::merged_sheet_name;
use crate::types::SentimentFeature;
use crate::workbook::is_valid_sheet_name;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "pipeline.toml";
pub const REDDIT_CLIENT_ID_VAR: &str = "REDDIT_CLIENT_ID";
pub const REDDIT_CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";

/// Reddit's listing endpoints never page past this many results.
pub const MAX_SEARCH_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerConfig {
    pub symbol: String,
    pub query: String,
    pub company: String,
}

impl TickerConfig {
    pub fn new(symbol: &str, query: &str, company: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            query: query.to_string(),
            company: company.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditSettings {
    pub user_agent: String,
    pub subreddits: Vec<String>,
    pub search_limit: u32,
    pub start_date: NaiveDate,
}

impl Default for RedditSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("stock-sentiment/{}", env!("CARGO_PKG_VERSION")),
            subreddits: vec![
                "stocks".to_string(),
                "investing".to_string(),
                "wallstreetbets".to_string(),
            ],
            search_limit: MAX_SEARCH_LIMIT,
            start_date: date(2020, 1, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSettings {
    pub start_date: NaiveDate,
    /// Exclusive, like the upstream download API.
    pub end_date: NaiveDate,
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            start_date: date(2020, 1, 1),
            end_date: date(2024, 10, 10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    pub sentiment_features: Vec<SentimentFeature>,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            sentiment_features: vec![
                SentimentFeature::CompoundSentiment,
                SentimentFeature::WeightedSentiment,
                SentimentFeature::Mentions,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub raw_posts_file: String,
    pub sentiment_file: String,
    pub merged_file: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            raw_posts_file: "reddit_data.xlsx".to_string(),
            sentiment_file: "sentiment analysis.xlsx".to_string(),
            merged_file: "correlation_and_merged_data.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reddit: RedditSettings,
    pub tickers: Vec<TickerConfig>,
    pub prices: PriceSettings,
    pub correlation: CorrelationSettings,
    pub output: OutputSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reddit: RedditSettings::default(),
            tickers: vec![
                TickerConfig::new(
                    "GME",
                    "GameStop shares OR $GME OR GME stock",
                    "GameStop Corp.",
                ),
                TickerConfig::new(
                    "AMC",
                    "AMC shares OR $AMC OR AMC stock",
                    "AMC Entertainment Holdings",
                ),
                TickerConfig::new(
                    "TSLA",
                    "Tesla shares OR $TSLA OR Tesla stock",
                    "Tesla, Inc.",
                ),
                TickerConfig::new(
                    "AAPL",
                    "Apple shares OR $AAPL OR Apple stock",
                    "Apple Inc.",
                ),
            ],
            prices: PriceSettings::default(),
            correlation: CorrelationSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&raw)
    }

    /// Reads `path` when it exists, otherwise falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            info!("Loading pipeline configuration from {}", path.display());
            Self::load(path)
        } else {
            debug!("{} not found, using built-in configuration", path.display());
            let config = Self::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::MissingField {
                field: "tickers".to_string(),
            });
        }
        if let Some(ticker) = self.tickers.iter().find(|t| t.symbol.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "tickers.symbol".to_string(),
                value: format!("{:?}", ticker.symbol),
            });
        }
        // Every symbol names a sheet in each stage's workbook, the longest
        // being `{SYMBOL}_Merged_Data`.
        let mut seen = HashSet::new();
        for ticker in &self.tickers {
            if !is_valid_sheet_name(&merged_sheet_name(&ticker.symbol)) {
                return Err(ConfigError::InvalidValue {
                    field: "tickers.symbol".to_string(),
                    value: format!("{:?}", ticker.symbol),
                });
            }
            if !seen.insert(ticker.symbol.to_lowercase()) {
                return Err(ConfigError::ValidationFailed {
                    reason: format!("ticker {} is listed more than once", ticker.symbol),
                });
            }
        }
        if self.reddit.subreddits.is_empty() {
            return Err(ConfigError::MissingField {
                field: "reddit.subreddits".to_string(),
            });
        }
        if self.reddit.search_limit == 0 || self.reddit.search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "reddit.search_limit".to_string(),
                value: self.reddit.search_limit.to_string(),
            });
        }
        if self.prices.start_date >= self.prices.end_date {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "prices.start_date {} must be before prices.end_date {}",
                    self.prices.start_date, self.prices.end_date
                ),
            });
        }
        if self.correlation.sentiment_features.is_empty() {
            return Err(ConfigError::MissingField {
                field: "correlation.sentiment_features".to_string(),
            });
        }
        Ok(())
    }

    pub fn collection_start(&self) -> NaiveDateTime {
        self.reddit.start_date.and_time(NaiveTime::default())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.tickers.iter().map(|t| t.symbol.clone()).collect()
    }

    pub fn raw_posts_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.raw_posts_file)
    }

    pub fn sentiment_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.sentiment_file)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.merged_file)
    }

    pub fn dashboard_path(&self, symbol: &str) -> PathBuf {
        self.output.directory.join(format!("{}_dashboard.png", symbol))
    }
}

/// App-only OAuth credentials for the Reddit API.
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl RedditCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required_env(REDDIT_CLIENT_ID_VAR)?,
            client_secret: required_env(REDDIT_CLIENT_SECRET_VAR)?,
        })
    }
}

impl std::fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

fn required_env(var_name: &str) -> Result<String, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: var_name.to_string(),
        }),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
