//! Daily closing prices.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate};
use reqwest::{Client, StatusCode};
use sentiment_core::{CoreError, DailyPrice, ErrorExt, PriceApiError};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; stock-sentiment/", env!("CARGO_PKG_VERSION"), ")");

/// Closes per symbol. A symbol that could not be fetched carries its error.
pub type PriceHistory = HashMap<String, Result<Vec<DailyPrice>, CoreError>>;

#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily closes for `symbols` on trading days in `[start, end)`.
    ///
    /// `Err` means the source as a whole is unusable; per-symbol failures go
    /// into the returned map.
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, CoreError>;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Seconds east of UTC for the listing exchange.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance chart API, one request per symbol.
pub struct YahooPriceClient {
    http_client: Client,
    base_url: String,
}

impl YahooPriceClient {
    pub fn new() -> Result<Self, CoreError> {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>, CoreError> {
        let url = format!("{}/{}", self.base_url, symbol);
        let params = chart_params(start, end);
        debug!("Fetching daily closes for {} from {}", symbol, url);

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::PriceApi(PriceApiError::RequestTimeout {
                        symbol: symbol.to_string(),
                    })
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::PriceApi(status_error(symbol, status)));
        }

        let chart: ChartResponse = response.json().await.map_err(|e| {
            CoreError::PriceApi(PriceApiError::InvalidResponse {
                symbol: symbol.to_string(),
                details: e.to_string(),
            })
        })?;

        let prices = parse_chart(symbol, chart, start, end)?;
        info!("Fetched {} daily closes for {}", prices.len(), symbol);
        Ok(prices)
    }
}

#[async_trait]
impl PriceSource for YahooPriceClient {
    async fn daily_closes(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, CoreError> {
        let mut history = PriceHistory::new();

        for symbol in symbols {
            let result = self.fetch_symbol(symbol, start, end).await;
            if let Err(e) = &result {
                e.log_warn();
            }
            history.insert(symbol.clone(), result);
        }

        // Every request failing before Yahoo answered means the source is down.
        let unreachable = history
            .values()
            .all(|r| matches!(r, Err(CoreError::Network(_))));
        if unreachable {
            if let Some(Err(e)) = symbols.first().and_then(|s| history.remove(s)) {
                warn!("Price source unreachable for all {} symbols", symbols.len());
                return Err(e);
            }
        }

        Ok(history)
    }
}

fn chart_params(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    let midnight = |date: NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    };
    vec![
        ("period1", midnight(start).to_string()),
        ("period2", midnight(end).to_string()),
        ("interval", "1d".to_string()),
        ("events", "history".to_string()),
    ]
}

fn status_error(symbol: &str, status: StatusCode) -> PriceApiError {
    match status {
        StatusCode::NOT_FOUND => PriceApiError::UnknownSymbol {
            symbol: symbol.to_string(),
        },
        s if s.is_server_error() => PriceApiError::ServerError {
            symbol: symbol.to_string(),
            status_code: s.as_u16(),
        },
        s => PriceApiError::InvalidResponse {
            symbol: symbol.to_string(),
            details: format!("unexpected status {}", s),
        },
    }
}

/// Turns a chart payload into sorted daily closes within `[start, end)`.
/// Days without a close are dropped.
pub(crate) fn parse_chart(
    symbol: &str,
    chart: ChartResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyPrice>, PriceApiError> {
    if let Some(error) = chart.chart.error {
        return Err(if error.code.eq_ignore_ascii_case("Not Found") {
            PriceApiError::UnknownSymbol {
                symbol: symbol.to_string(),
            }
        } else {
            PriceApiError::InvalidResponse {
                symbol: symbol.to_string(),
                details: format!("{}: {}", error.code, error.description),
            }
        });
    }

    let result = chart
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| PriceApiError::EmptyHistory {
            symbol: symbol.to_string(),
        })?;

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();
    let offset = Duration::seconds(result.meta.gmtoffset);

    let mut prices: Vec<DailyPrice> = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let local = DateTime::from_timestamp(ts, 0)?.naive_utc() + offset;
            Some(DailyPrice {
                date: local.date(),
                close,
            })
        })
        .filter(|p| p.date >= start && p.date < end)
        .collect();

    prices.sort_by_key(|p| p.date);
    prices.dedup_by_key(|p| p.date);

    if prices.is_empty() {
        return Err(PriceApiError::EmptyHistory {
            symbol: symbol.to_string(),
        });
    }
    Ok(prices)
}
