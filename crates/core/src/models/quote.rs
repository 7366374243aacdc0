//! Real-time quote model

use serde::{Deserialize, Serialize};

/// Real-time quote as returned by Finnhub's `/quote` endpoint.
///
/// Field names mirror the wire format so the payload round-trips to
/// clients unchanged. Finnhub omits fields for unknown symbols, hence
/// everything is optional.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Quote {
    /// Current price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<f64>,
    /// Change since previous close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<f64>,
    /// Percent change since previous close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<f64>,
    /// High price of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    /// Low price of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    /// Open price of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o: Option<f64>,
    /// Previous close price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<f64>,
    /// Quote timestamp, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
}
