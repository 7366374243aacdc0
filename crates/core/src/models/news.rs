//! Market news models
//!
//! [`NewsArticle`] mirrors the wire shape of Finnhub's `/news` payload
//! (unix-seconds `datetime`). [`NewsItem`] is the client-facing
//! rendering of the same article with the timestamp formatted as a
//! date string.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::FinnhubError;

/// Date format used when rendering articles for MCP clients.
pub const DISPLAY_DATE_FORMAT: &str = "%Y-%m-%d";

/// News category accepted by Finnhub's `/news` endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NewsCategory {
    #[default]
    General,
    Forex,
    Crypto,
    Merger,
}

impl NewsCategory {
    pub const ALL: [NewsCategory; 4] = [
        NewsCategory::General,
        NewsCategory::Forex,
        NewsCategory::Crypto,
        NewsCategory::Merger,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::General => "general",
            NewsCategory::Forex => "forex",
            NewsCategory::Crypto => "crypto",
            NewsCategory::Merger => "merger",
        }
    }

    /// Parse a category name as supplied by a tool caller.
    pub fn parse(input: &str) -> Result<Self, FinnhubError> {
        match input {
            "general" => Ok(NewsCategory::General),
            "forex" => Ok(NewsCategory::Forex),
            "crypto" => Ok(NewsCategory::Crypto),
            "merger" => Ok(NewsCategory::Merger),
            _ => Err(FinnhubError::InvalidArgument(format!(
                "Invalid category '{input}'. Must be one of: general, forex, crypto, merger"
            ))),
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One article as returned by Finnhub's `/news` endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct NewsArticle {
    /// Finnhub's own category label (e.g. "top news").
    #[serde(default)]
    pub category: String,
    /// Publication time, unix seconds.
    #[serde(default)]
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    /// Finnhub article id.
    #[serde(default)]
    pub id: i64,
    /// Thumbnail URL.
    #[serde(default)]
    pub image: String,
    /// Related symbols, comma separated.
    #[serde(default)]
    pub related: String,
    /// Publishing outlet.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
    /// Canonical article URL.
    #[serde(default)]
    pub url: String,
}

impl NewsArticle {
    /// Publication time as UTC, if the timestamp is representable.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.datetime, 0)
    }

    /// Render for clients with `datetime` formatted per `date_format`
    /// (interpreted in UTC). Unrepresentable timestamps render empty.
    pub fn into_item(self, date_format: &str) -> NewsItem {
        let datetime = self
            .published_at()
            .map(|t| t.format(date_format).to_string())
            .unwrap_or_default();
        NewsItem {
            category: self.category,
            datetime,
            headline: self.headline,
            id: self.id,
            image: self.image,
            related: self.related,
            source: self.source,
            summary: self.summary,
            url: self.url,
        }
    }
}

/// A news article rendered for display: identical to [`NewsArticle`]
/// except `datetime` carries a formatted date string.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewsItem {
    pub category: String,
    pub datetime: String,
    pub headline: String,
    pub id: i64,
    pub image: String,
    pub related: String,
    pub source: String,
    pub summary: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article(datetime: i64) -> NewsArticle {
        NewsArticle {
            category: "top news".to_string(),
            datetime,
            headline: "Markets rally".to_string(),
            id: 7_467_810,
            image: "https://example.com/thumb.png".to_string(),
            related: "AAPL".to_string(),
            source: "Reuters".to_string(),
            summary: "Stocks climbed today.".to_string(),
            url: "https://example.com/article".to_string(),
        }
    }

    #[test]
    fn test_category_parse_accepts_known_values() {
        assert_eq!(NewsCategory::parse("general").unwrap(), NewsCategory::General);
        assert_eq!(NewsCategory::parse("forex").unwrap(), NewsCategory::Forex);
        assert_eq!(NewsCategory::parse("crypto").unwrap(), NewsCategory::Crypto);
        assert_eq!(NewsCategory::parse("merger").unwrap(), NewsCategory::Merger);
    }

    #[test]
    fn test_category_parse_rejects_unknown_values() {
        let err = NewsCategory::parse("sports").unwrap_err();
        assert!(err.to_string().contains("Invalid category 'sports'"));
        assert!(err
            .to_string()
            .contains("Must be one of: general, forex, crypto, merger"));
    }

    #[test]
    fn test_category_is_case_sensitive() {
        assert!(NewsCategory::parse("General").is_err());
    }

    #[test]
    fn test_article_parses_finnhub_payload() {
        let json = r#"{
            "category": "top news",
            "datetime": 1710500400,
            "headline": "Fed holds rates steady",
            "id": 7467810,
            "image": "https://static.finnhub.io/img.png",
            "related": "",
            "source": "CNBC",
            "summary": "The Federal Reserve left rates unchanged.",
            "url": "https://www.cnbc.com/fed.html"
        }"#;

        let article: NewsArticle = serde_json::from_str(json).unwrap();
        assert_eq!(article.headline, "Fed holds rates steady");
        assert_eq!(article.datetime, 1_710_500_400);
        assert_eq!(article.id, 7_467_810);
    }

    #[test]
    fn test_article_tolerates_missing_fields() {
        let article: NewsArticle = serde_json::from_str(r#"{"headline": "Partial"}"#).unwrap();
        assert_eq!(article.headline, "Partial");
        assert_eq!(article.datetime, 0);
        assert_eq!(article.source, "");
    }

    #[test]
    fn test_into_item_formats_display_date() {
        // 2024-03-15 11:00:00 UTC
        let item = sample_article(1_710_500_400).into_item(DISPLAY_DATE_FORMAT);
        assert_eq!(item.datetime, "2024-03-15");
        assert_eq!(item.headline, "Markets rally");
    }

    #[test]
    fn test_into_item_supports_compact_date_format() {
        let item = sample_article(1_710_500_400).into_item("%Y%m%d");
        assert_eq!(item.datetime, "20240315");
    }

    #[test]
    fn test_item_serializes_datetime_as_string() {
        let item = sample_article(1_710_500_400).into_item(DISPLAY_DATE_FORMAT);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["datetime"], "2024-03-15");
        assert_eq!(value["id"], 7_467_810);
    }
}
