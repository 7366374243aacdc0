//! Finnhub REST API client
//!
//! Thin wrapper over the Finnhub endpoints this crate serves:
//! - Market news via /news
//! - Real-time quotes via /quote
//! - Company fundamentals via /stock/metric
//! - Analyst recommendations via /stock/recommendation
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FinnhubError;
use crate::models::{
    BasicFinancials, MetricKind, NewsArticle, NewsCategory, Quote, RecommendationTrend,
    StockSymbol,
};

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Finnhub REST API client.
///
/// Holds one `reqwest::Client` and the API credential. The client does
/// no pacing of its own; callers route requests through the service
/// layer's rate limiter.
pub struct FinnhubClient {
    client: Client,
    api_key: String,
}

impl FinnhubClient {
    /// Create a new client bound to the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.into(),
        }
    }

    /// Make a GET request to the Finnhub API and return the raw body.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FinnhubError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        // API key goes in a header, not a query param.
        request = request.header("X-Finnhub-Token", &self.api_key);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FinnhubError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                FinnhubError::Network(e)
            }
        })?;

        let status = response.status();

        // Handle rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FinnhubError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }

        // Handle unauthorized (invalid API key)
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FinnhubError::Api {
                status: status.as_u16(),
                message: "Invalid or missing API key".to_string(),
            });
        }

        // Handle forbidden (API key quota exceeded)
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(FinnhubError::RateLimited {
                endpoint: endpoint.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Prefer Finnhub's own error message when the body carries one.
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(error_msg) = error_resp.error {
                    return Err(FinnhubError::Api {
                        status: status.as_u16(),
                        message: error_msg,
                    });
                }
            }

            return Err(FinnhubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response.text().await.map_err(FinnhubError::Network)
    }

    /// Decode a response body, tagging parse failures with the endpoint.
    fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, FinnhubError> {
        serde_json::from_str(body).map_err(|e| FinnhubError::Parse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Fetch latest market news for a category.
    ///
    /// `min_id` asks Finnhub for articles newer than the given article
    /// id; 0 means no lower bound.
    pub async fn general_news(
        &self,
        category: NewsCategory,
        min_id: u64,
    ) -> Result<Vec<NewsArticle>, FinnhubError> {
        let min_id = min_id.to_string();
        let body = self
            .fetch("/news", &[("category", category.as_str()), ("minId", &min_id)])
            .await?;
        Self::decode("/news", &body)
    }

    /// Fetch the real-time quote for a symbol.
    pub async fn quote(&self, symbol: &StockSymbol) -> Result<Quote, FinnhubError> {
        let body = self.fetch("/quote", &[("symbol", symbol.as_str())]).await?;
        Self::decode("/quote", &body)
    }

    /// Fetch company basic financials.
    pub async fn company_basic_financials(
        &self,
        symbol: &StockSymbol,
        metric: MetricKind,
    ) -> Result<BasicFinancials, FinnhubError> {
        let body = self
            .fetch(
                "/stock/metric",
                &[("symbol", symbol.as_str()), ("metric", metric.as_str())],
            )
            .await?;
        Self::decode("/stock/metric", &body)
    }

    /// Fetch analyst recommendation trends.
    pub async fn recommendation_trends(
        &self,
        symbol: &StockSymbol,
    ) -> Result<Vec<RecommendationTrend>, FinnhubError> {
        let body = self
            .fetch("/stock/recommendation", &[("symbol", symbol.as_str())])
            .await?;
        Self::decode("/stock/recommendation", &body)
    }
}
