//! Client-side pacing for the Reddit OAuth API.
//!
//! A token bucket keeps us under the published quota, and the
//! `x-ratelimit-*` headers Reddit returns can pause it early when the server
//! says the budget is spent.

use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    /// 100 requests per minute per OAuth client.
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100,
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }

    fn refill_rate(&self) -> f64 {
        f64::from(self.max_requests) / self.time_window.as_secs_f64()
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    /// Refill is measured from here. May lie in the future while paused.
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_allowance);
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate: config.refill_rate(),
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if now <= state.last_refill {
            return;
        }
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }

    /// Takes `tokens_needed` tokens, or returns how long until they will be there.
    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        self.refill(&mut state, now);

        if state.tokens >= tokens_needed {
            state.tokens -= tokens_needed;
            return Ok(());
        }

        let paused = state.last_refill.saturating_duration_since(now);
        let missing = tokens_needed - state.tokens;
        Err(paused + Duration::from_secs_f64(missing / self.refill_rate))
    }

    /// Empties the bucket and holds refill back for `duration`.
    pub async fn pause(&self, duration: Duration) {
        let until = Instant::now() + duration;
        let mut state = self.state.lock().await;
        state.tokens = 0.0;
        state.last_refill = state.last_refill.max(until);
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());
        state.tokens
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            token_bucket: TokenBucket::new(&config),
            config,
        }
    }

    /// Waits until one more request fits the budget.
    pub async fn acquire_permit(&self) -> RateLimitPermit {
        let start_time = Instant::now();

        while let Err(wait_time) = self.token_bucket.acquire(1.0).await {
            debug!("Rate limit reached, waiting {:?}", wait_time);
            sleep(wait_time).await;
        }

        RateLimitPermit {
            queue_wait_time: start_time.elapsed(),
        }
    }

    /// Stops handing out permits for `duration`, e.g. after a 429.
    pub async fn pause(&self, duration: Duration) {
        warn!("Pausing Reddit requests for {:?}", duration);
        self.token_bucket.pause(duration).await;
    }

    /// Reads Reddit's remaining-budget headers and pauses until the reset
    /// when the budget is used up.
    pub async fn observe_headers(&self, headers: &HeaderMap) {
        if let Some(reset) = exhausted_budget_reset(headers) {
            self.pause(reset).await;
        }
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.available_tokens().await;

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            requests_per_minute: self.config.max_requests,
            is_near_limit: available_tokens < f64::from(self.config.burst_allowance) * 0.2,
        }
    }
}

/// Time to wait when the headers report fewer than one request left.
pub(crate) fn exhausted_budget_reset(headers: &HeaderMap) -> Option<Duration> {
    let number = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
    };

    let remaining = number(REMAINING_HEADER)?;
    if remaining >= 1.0 {
        return None;
    }
    number(RESET_HEADER).map(Duration::from_secs_f64)
}

#[derive(Debug)]
pub struct RateLimitPermit {
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub requests_per_minute: u32,
    pub is_near_limit: bool,
}
