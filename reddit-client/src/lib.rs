//! Minimal Reddit client: app-only OAuth2 plus paginated subreddit search.

pub mod api;
pub mod rate_limiter;


use api::{RedditApiClient, RedditPostData, MAX_PAGE_SIZE};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, TokenResponse, TokenUrl};
use reqwest::Client;
use sentiment_core::{CoreError, RedditApiError, RedditCredentials};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub use rate_limiter::RateLimitStatus;

const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Reddit hands out app-only tokens for one hour.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }

    pub fn from_credentials(credentials: RedditCredentials, user_agent: &str) -> Self {
        Self::new(
            credentials.client_id,
            credentials.client_secret,
            user_agent.to_string(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl RedditToken {
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated(RedditToken),
    TokenExpired,
}

/// Everything one paginated search produced. A failure part-way through
/// keeps the pages fetched before it.
#[derive(Debug)]
pub struct SearchResults {
    pub submissions: Vec<RedditPostData>,
    pub pages: u32,
    pub error: Option<CoreError>,
}

pub struct RedditClient {
    config: RedditOAuth2Config,
    oauth_client: BasicClient,
    api: RedditApiClient,
    auth_state: AuthState,
}

impl RedditClient {
    pub fn new(config: RedditOAuth2Config) -> Result<Self, CoreError> {
        let auth_url = AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(|e| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("Invalid auth URL: {}", e),
            })
        })?;
        let token_url = TokenUrl::new(REDDIT_TOKEN_URL.to_string()).map_err(|e| {
            CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: format!("Invalid token URL: {}", e),
            })
        })?;

        let oauth_client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        );
        let api = RedditApiClient::new(config.user_agent.clone())?;

        Ok(Self {
            config,
            oauth_client,
            api,
            auth_state: AuthState::NotAuthenticated,
        })
    }

    pub fn config(&self) -> &RedditOAuth2Config {
        &self.config
    }

    pub fn get_auth_state(&self) -> &AuthState {
        &self.auth_state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&self.auth_state, AuthState::Authenticated(token) if !token.is_expired())
    }

    pub fn set_token(&mut self, token: RedditToken) {
        self.auth_state = if token.is_expired() {
            AuthState::TokenExpired
        } else {
            AuthState::Authenticated(token)
        };
    }

    /// Runs the client-credentials grant and stores the resulting token.
    pub async fn authenticate(&mut self) -> Result<(), CoreError> {
        info!("Requesting app-only Reddit token");
        let http_client = self.api.http_client();

        let response = self
            .oauth_client
            .exchange_client_credentials()
            .request_async(|request| send_token_request(http_client, request))
            .await
            .map_err(|e| {
                CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                    reason: e.to_string(),
                })
            })?;

        let lifetime = response.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        self.set_token(RedditToken {
            access_token: response.access_token().secret().clone(),
            expires_at: SystemTime::now() + lifetime,
        });
        debug!("Reddit token valid for {:?}", lifetime);
        Ok(())
    }

    /// Returns a usable access token, fetching a new one if the old one lapsed.
    pub async fn ensure_authenticated(&mut self) -> Result<String, CoreError> {
        match &self.auth_state {
            AuthState::Authenticated(token) if !token.is_expired() => {
                return Ok(token.access_token.clone())
            }
            AuthState::Authenticated(_) | AuthState::TokenExpired => {
                warn!("Reddit token expired, re-authenticating");
            }
            AuthState::NotAuthenticated => {}
        }

        self.authenticate().await?;
        match &self.auth_state {
            AuthState::Authenticated(token) => Ok(token.access_token.clone()),
            _ => Err(CoreError::RedditApi(RedditApiError::AuthenticationFailed {
                reason: "Reddit issued an already expired token".to_string(),
            })),
        }
    }

    /// Searches one subreddit, following `after` cursors until `limit`
    /// results are collected or the listing runs out.
    pub async fn search(&mut self, subreddit: &str, query: &str, limit: u32) -> SearchResults {
        let mut results = SearchResults {
            submissions: Vec::new(),
            pages: 0,
            error: None,
        };
        let mut after: Option<String> = None;

        while (results.submissions.len() as u32) < limit {
            let access_token = match self.ensure_authenticated().await {
                Ok(token) => token,
                Err(e) => {
                    results.error = Some(e);
                    break;
                }
            };

            let remaining = limit - results.submissions.len() as u32;
            let page = self
                .api
                .search_subreddit(
                    &access_token,
                    subreddit,
                    query,
                    remaining.min(MAX_PAGE_SIZE),
                    after.as_deref(),
                )
                .await;

            match page {
                Ok(listing) => {
                    results.pages += 1;
                    let fetched = listing.data.children.len();
                    results
                        .submissions
                        .extend(listing.data.children.into_iter().map(|child| child.data));
                    after = listing.data.after;
                    if fetched == 0 || after.is_none() {
                        break;
                    }
                }
                Err(e) => {
                    results.error = Some(e);
                    break;
                }
            }
        }

        results.submissions.truncate(limit as usize);
        info!(
            "r/{} search for {:?}: {} results over {} pages",
            subreddit,
            query,
            results.submissions.len(),
            results.pages
        );
        results
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.api.get_rate_limit_status().await
    }
}

/// Sends the token exchange through the client that carries our user agent;
/// Reddit rejects token requests without one.
async fn send_token_request(
    http_client: &Client,
    request: HttpRequest,
) -> Result<HttpResponse, reqwest::Error> {
    let response = http_client
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .body(request.body)
        .send()
        .await?;

    let status_code = response.status();
    let headers = response.headers().clone();
    let body = response.bytes().await?.to_vec();

    Ok(HttpResponse {
        status_code,
        headers,
        body,
    })
}
