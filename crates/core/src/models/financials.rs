//! Company fundamentals model

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::FinnhubError;

/// Metric selector accepted by Finnhub's `/stock/metric` endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MetricKind {
    #[default]
    All,
    Price,
    Valuation,
    Margin,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::All => "all",
            MetricKind::Price => "price",
            MetricKind::Valuation => "valuation",
            MetricKind::Margin => "margin",
        }
    }

    /// Parse a metric name as supplied by a tool caller.
    pub fn parse(input: &str) -> Result<Self, FinnhubError> {
        match input {
            "all" => Ok(MetricKind::All),
            "price" => Ok(MetricKind::Price),
            "valuation" => Ok(MetricKind::Valuation),
            "margin" => Ok(MetricKind::Margin),
            _ => Err(FinnhubError::InvalidArgument(format!(
                "Invalid metric '{input}'. Must be one of: all, price, valuation, margin"
            ))),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fundamentals as returned by Finnhub's `/stock/metric` endpoint.
///
/// The `metric` map is open ended (52-week ranges, beta, P/E ratios,
/// margins, ...) and varies by plan and symbol, so it is passed through
/// rather than modeled field by field.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BasicFinancials {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, rename = "metricType")]
    pub metric_type: String,
    #[serde(default)]
    pub metric: Map<String, Value>,
    /// Historical series keyed by period; opaque pass-through.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub series: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!(MetricKind::parse("all").unwrap(), MetricKind::All);
        assert_eq!(MetricKind::parse("price").unwrap(), MetricKind::Price);
        assert_eq!(MetricKind::parse("valuation").unwrap(), MetricKind::Valuation);
        assert_eq!(MetricKind::parse("margin").unwrap(), MetricKind::Margin);
    }

    #[test]
    fn test_metric_kind_rejects_unknown() {
        let err = MetricKind::parse("growth").unwrap_err();
        assert!(err.to_string().contains("Invalid metric 'growth'"));
        assert!(err
            .to_string()
            .contains("Must be one of: all, price, valuation, margin"));
    }

    #[test]
    fn test_parses_finnhub_payload() {
        let json = r#"{
            "metric": {
                "10DayAverageTradingVolume": 62.27,
                "52WeekHigh": 199.62,
                "52WeekLow": 164.08,
                "beta": 1.2921,
                "peBasicExclExtraTTM": 27.89
            },
            "metricType": "all",
            "series": {
                "annual": {
                    "currentRatio": [
                        {"period": "2023-09-30", "v": 0.988}
                    ]
                }
            },
            "symbol": "AAPL"
        }"#;

        let financials: BasicFinancials = serde_json::from_str(json).unwrap();
        assert_eq!(financials.symbol, "AAPL");
        assert_eq!(financials.metric_type, "all");
        assert_eq!(financials.metric["52WeekHigh"], 199.62);
        assert!(financials.series["annual"]["currentRatio"].is_array());
    }

    #[test]
    fn test_serializes_metric_type_in_camel_case() {
        let financials = BasicFinancials {
            symbol: "AAPL".to_string(),
            metric_type: "all".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&financials).unwrap();
        assert_eq!(value["metricType"], "all");
        // Null series is omitted entirely.
        assert!(value.get("series").is_none());
    }

    #[test]
    fn test_tolerates_empty_payload() {
        let financials: BasicFinancials = serde_json::from_str("{}").unwrap();
        assert!(financials.metric.is_empty());
        assert!(financials.series.is_null());
    }
}
