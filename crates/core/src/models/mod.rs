//! Finnhub market data models
//!
//! This module contains the data types exchanged with Finnhub:
//! - `symbol` - Validated ticker symbols (StockSymbol)
//! - `news` - Market news (NewsCategory, NewsArticle, NewsItem)
//! - `quote` - Real-time quote data (Quote)
//! - `financials` - Company fundamentals (MetricKind, BasicFinancials)
//! - `trends` - Analyst recommendations (RecommendationTrend)

mod financials;
mod news;
mod quote;
mod symbol;
mod trends;

pub use financials::{BasicFinancials, MetricKind};
pub use news::{NewsArticle, NewsCategory, NewsItem, DISPLAY_DATE_FORMAT};
pub use quote::Quote;
pub use symbol::StockSymbol;
pub use trends::RecommendationTrend;
