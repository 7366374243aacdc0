//! Analyst recommendation trend model

use serde::{Deserialize, Serialize};

/// One month of analyst recommendations from Finnhub's
/// `/stock/recommendation` endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationTrend {
    #[serde(default)]
    pub buy: i64,
    #[serde(default)]
    pub hold: i64,
    /// Month the counts apply to (e.g. "2024-03-01").
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub sell: i64,
    #[serde(default)]
    pub strong_buy: i64,
    #[serde(default)]
    pub strong_sell: i64,
    #[serde(default)]
    pub symbol: String,
}
