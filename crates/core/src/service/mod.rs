//! Market data operations with rate limiting and retry handling
//!
//! [`FinnhubService`] is the single entry point tool handlers call. It
//! owns the shared rate limiter, the retry policy, the lazily created
//! API client, and the served-request counter. Every operation
//! validates its arguments before any network traffic, then routes
//! exactly one Finnhub call through [`FinnhubService::execute_with_retry`].

mod rate_limiter;
mod retry;

pub use rate_limiter::{RateLimiter, RATE_LIMIT_INTERVAL};
pub use retry::{ProgressSink, RetryPolicy, BASE_WAIT, MAX_RETRIES};

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::client::FinnhubClient;
use crate::errors::FinnhubError;
use crate::models::{
    BasicFinancials, MetricKind, NewsArticle, NewsCategory, NewsItem, Quote,
    RecommendationTrend, StockSymbol, DISPLAY_DATE_FORMAT,
};

/// Environment variable holding the Finnhub API credential.
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/// Shared state backing the market data operations.
///
/// One instance serves all concurrent callers; the rate limiter and
/// request counter are global to the credential, not per caller.
pub struct FinnhubService {
    /// Explicit credential override; `None` falls back to the environment.
    api_key: Option<String>,
    /// Client slot, filled on first use. `Some(None)` after a failed
    /// initialization: the missing credential is a permanent condition.
    client: OnceLock<Option<FinnhubClient>>,
    rate_limiter: RateLimiter,
    retry_policy: RetryPolicy,
    /// Successfully served Finnhub calls since startup.
    requests_served: AtomicU64,
}

impl FinnhubService {
    /// Service resolving the credential from the environment on first use.
    pub fn new() -> Self {
        Self::with_config(None, RateLimiter::new(), RetryPolicy::default())
    }

    /// Service bound to an explicit credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::with_config(Some(api_key.into()), RateLimiter::new(), RetryPolicy::default())
    }

    /// Full control over credential source, pacing, and retry schedule.
    pub fn with_config(
        api_key: Option<String>,
        rate_limiter: RateLimiter,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            api_key,
            client: OnceLock::new(),
            rate_limiter,
            retry_policy,
            requests_served: AtomicU64::new(0),
        }
    }

    /// Number of Finnhub calls served successfully since startup.
    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    /// The lazily created API client.
    ///
    /// Initialization runs once. A missing credential is cached as a
    /// permanent failure instead of being re-checked on every call.
    fn client(&self) -> Result<&FinnhubClient, FinnhubError> {
        let slot = self.client.get_or_init(|| match self.resolve_api_key() {
            Some(api_key) => {
                info!("Finnhub client initialized");
                Some(FinnhubClient::new(api_key))
            }
            None => {
                error!("FINNHUB_API_KEY environment variable is not set");
                None
            }
        });
        slot.as_ref().ok_or(FinnhubError::MissingApiKey)
    }

    /// Resolve the credential: explicit key first, then the environment.
    /// Blank values count as missing.
    fn resolve_api_key(&self) -> Option<String> {
        let candidate = match &self.api_key {
            Some(key) => Some(key.clone()),
            None => std::env::var(API_KEY_ENV).ok(),
        };
        candidate
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Run one Finnhub call through the rate gate, absorbing 429s.
    ///
    /// Every attempt, including retries, first acquires the rate
    /// limiter. Only rate-limit rejections are retried, up to the
    /// policy's budget with a linearly growing wait; any other error
    /// passes through untouched. The served-request counter increments
    /// exactly once per successful call.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<T, FinnhubError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, FinnhubError>>,
    {
        let policy = self.retry_policy;
        let mut attempt: u32 = 0;

        loop {
            self.rate_limiter.acquire().await;

            match operation().await {
                Ok(value) => {
                    self.requests_served.fetch_add(1, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(err) if err.is_rate_limit() && attempt < policy.max_retries => {
                    let wait_time = policy.wait_for_attempt(attempt);
                    let message = format!(
                        "Rate limited (429). Waiting {}s before retry (Attempt {}/{})...",
                        wait_time.as_secs(),
                        attempt + 1,
                        policy.max_retries,
                    );
                    warn!("{message}");
                    if let Some(sink) = sink {
                        sink.report_progress(attempt, policy.max_retries, &message).await;
                    }
                    tokio::time::sleep(wait_time).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_rate_limit() {
                        error!("Max retries exceeded for 429 Too Many Requests");
                    }
                    return Err(err);
                }
            }
        }
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Fetch the latest market news.
    ///
    /// `category` must be one of general/forex/crypto/merger and
    /// `count` between 1 and 100. With `days` set, only articles
    /// strictly newer than that many days are returned. Dates render
    /// as `YYYY-MM-DD` in UTC.
    pub async fn list_news(
        &self,
        category: &str,
        count: i64,
        days: Option<i64>,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Vec<NewsItem>, FinnhubError> {
        let category = NewsCategory::parse(category)?;
        if !(1..=100).contains(&count) {
            return Err(FinnhubError::InvalidArgument(
                "Count must be between 1 and 100".to_string(),
            ));
        }
        if let Some(days) = days {
            if days < 1 {
                return Err(FinnhubError::InvalidArgument(
                    "Days must be a positive integer".to_string(),
                ));
            }
        }

        info!("Fetching {} news (count={}, days={:?})", category, count, days);
        let client = self.client()?;
        let articles = self
            .execute_with_retry(|| client.general_news(category, 0), sink)
            .await?;

        Ok(select_articles(articles, count as usize, days, Utc::now()))
    }

    /// Fetch the real-time quote for a stock.
    pub async fn get_market_data(
        &self,
        stock: &str,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Quote, FinnhubError> {
        let symbol = StockSymbol::parse(stock)?;

        info!("Fetching market data for {}", symbol);
        let client = self.client()?;
        self.execute_with_retry(|| client.quote(&symbol), sink).await
    }

    /// Fetch company fundamentals for a stock.
    ///
    /// `metric` selects the metric group: all/price/valuation/margin.
    pub async fn get_basic_financials(
        &self,
        stock: &str,
        metric: &str,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<BasicFinancials, FinnhubError> {
        let symbol = StockSymbol::parse(stock)?;
        let metric = MetricKind::parse(metric)?;

        info!("Fetching basic financials for {} (metric={})", symbol, metric);
        let client = self.client()?;
        self.execute_with_retry(|| client.company_basic_financials(&symbol, metric), sink)
            .await
    }

    /// Fetch analyst recommendation trends for a stock.
    pub async fn get_recommendation_trends(
        &self,
        stock: &str,
        sink: Option<&dyn ProgressSink>,
    ) -> Result<Vec<RecommendationTrend>, FinnhubError> {
        let symbol = StockSymbol::parse(stock)?;

        info!("Fetching recommendation trends for {}", symbol);
        let client = self.client()?;
        self.execute_with_retry(|| client.recommendation_trends(&symbol), sink)
            .await
    }
}

impl Default for FinnhubService {
    fn default() -> Self {
        Self::new()
    }
}

/// Window-filter, render, and truncate articles for display.
///
/// Articles must be strictly newer than the day cutoff; filtering
/// happens before truncation so stale items never consume the count
/// budget. Day windows too large to represent disable the filter.
fn select_articles(
    articles: Vec<NewsArticle>,
    count: usize,
    days: Option<i64>,
    now: DateTime<Utc>,
) -> Vec<NewsItem> {
    let min_ts = days
        .and_then(chrono::Duration::try_days)
        .and_then(|window| now.checked_sub_signed(window))
        .map(|cutoff| cutoff.timestamp());

    articles
        .into_iter()
        .filter(|article| min_ts.map_or(true, |min| article.datetime > min))
        .map(|article| article.into_item(DISPLAY_DATE_FORMAT))
        .take(count)
        .collect()
}
