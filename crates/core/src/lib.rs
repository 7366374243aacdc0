//! Finnhub MCP Core Crate
//!
//! This crate provides the market data operations behind the
//! finnhub-mcp server: argument validation, rate limiting, retry
//! handling, and the Finnhub REST client.
//!
//! # Overview
//!
//! The core crate supports:
//! - Market news, quotes, fundamentals, and analyst recommendations
//! - A shared minimum-interval rate limiter (1.1s between call starts)
//! - Automatic retries with linear backoff on HTTP 429
//! - Progress reporting hooks for long retry waits
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Tool handlers   |  (MCP server, batch jobs)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  FinnhubService  |  (validation, retry, counters)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |   RateLimiter    |  (spaces call starts)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  FinnhubClient   |  (HTTP, endpoint mapping)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`FinnhubService`] - Entry point owning limiter, policy, and client
//! - [`FinnhubClient`] - Thin REST wrapper over the Finnhub endpoints
//! - [`RateLimiter`] - Minimum-interval gate shared by all callers
//! - [`ProgressSink`] - Best-effort retry progress reporting
//! - [`FinnhubError`] - Error taxonomy for every fallible path

pub mod client;
pub mod errors;
pub mod models;
pub mod service;

// Re-export the client
pub use client::FinnhubClient;

// Re-export error types
pub use errors::FinnhubError;

// Re-export all public types from models
pub use models::{
    BasicFinancials, MetricKind, NewsArticle, NewsCategory, NewsItem, Quote,
    RecommendationTrend, StockSymbol,
};

// Re-export service types
pub use service::{
    FinnhubService, ProgressSink, RateLimiter, RetryPolicy, API_KEY_ENV, RATE_LIMIT_INTERVAL,
};
