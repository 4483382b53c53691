use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use reqwest::{Client, Method, Response, StatusCode};
use sentiment_core::{CoreError, RedditApiError};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit's largest page size for listing endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    #[serde(default)]
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

/// The parts of a submission the pipeline keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    #[serde(default)]
    pub permalink: String,
    pub created_utc: f64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
}

impl RedditPostData {
    /// Creation time as a naive UTC timestamp.
    pub fn created_at(&self) -> Option<chrono::NaiveDateTime> {
        let millis = (self.created_utc * 1000.0).round() as i64;
        chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
    }
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: RateLimiter,
    user_agent: String,
}

impl RedditApiClient {
    pub fn new(user_agent: String) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            user_agent,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: &[(&str, String)],
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", REDDIT_API_BASE, endpoint);
        let start_time = Instant::now();

        let permit = self.rate_limiter.acquire_permit().await;
        debug!(
            "Acquired rate limit permit for {} {} after {:?}",
            method, endpoint, permit.queue_wait_time
        );

        let request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .query(query_params);

        info!("Making Reddit API request: {} {}", method, endpoint);
        let response = request_builder.send().await.map_err(|e| {
            error!("Network error for {} {}: {}", method, endpoint, e);
            if e.is_timeout() {
                CoreError::RedditApi(RedditApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

        self.rate_limiter.observe_headers(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status: {} for {}", status, endpoint);
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let api_error = status_error(status, endpoint, retry_after);
            if let RedditApiError::RateLimitExceeded { retry_after } = &api_error {
                self.rate_limiter
                    .pause(Duration::from_secs(*retry_after))
                    .await;
            }
            return Err(CoreError::RedditApi(api_error));
        }

        debug!(
            "Request successful: {} {} in {:?}",
            status,
            endpoint,
            start_time.elapsed()
        );
        Ok(response)
    }

    /// One page of `/r/{subreddit}/search`, restricted to that subreddit.
    pub async fn search_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
        query: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/search", subreddit);
        let params = search_params(query, limit, after);

        let response = self
            .make_request(Method::GET, &endpoint, access_token, &params)
            .await?;

        let listing: RedditListing<RedditPostData> = response.json().await.map_err(|e| {
            error!("Failed to parse search results: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse search results for r/{}", subreddit),
            })
        })?;

        debug!(
            "Retrieved {} search results from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.get_rate_limit_status().await
    }
}

pub(crate) fn search_params(query: &str, limit: u32, after: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.to_string()),
        ("restrict_sr", "1".to_string()),
        ("sort", "relevance".to_string()),
        ("t", "all".to_string()),
        ("limit", limit.min(MAX_PAGE_SIZE).to_string()),
        ("raw_json", "1".to_string()),
    ];
    if let Some(after) = after {
        params.push(("after", after.to_string()));
    }
    params
}

pub(crate) fn status_error(
    status: StatusCode,
    endpoint: &str,
    retry_after: Option<u64>,
) -> RedditApiError {
    match status.as_u16() {
        429 => {
            let retry_after = retry_after.unwrap_or(60);
            warn!("Rate limited, retry after {} seconds", retry_after);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => match endpoint
            .strip_prefix("/r/")
            .and_then(|rest| rest.split('/').next())
        {
            Some(subreddit) => RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            },
            None => RedditApiError::InvalidResponse {
                details: format!("Resource not found: {}", endpoint),
            },
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {} for {}", code, endpoint),
        },
    }
}
