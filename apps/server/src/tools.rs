//! Tool definitions and dispatch
//!
//! Maps MCP tool calls onto [`FinnhubService`] operations. Malformed
//! arguments (wrong shape, unknown tool) become JSON-RPC errors;
//! domain failures (validation, upstream errors) become tool results
//! with `isError` set so clients see them as tool output.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use finnhub_mcp_core::{FinnhubError, FinnhubService, ProgressSink};

use crate::protocol::{LogLevel, RpcError, ToolCallResult, ToolDef};
use crate::server::Notifier;

/// Definitions advertised by tools/list.
pub fn tool_definitions() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: "list_news",
            description: concat!(
                "Fetch latest financial market news from Finnhub.\n",
                "\n",
                "Parameters:\n",
                "- category: News category. Valid values: 'general', 'forex', 'crypto', 'merger'. Default: 'general'\n",
                "- count: Maximum number of articles to return. Default: 10\n",
                "- days: Only return news from the past N days. Optional.\n",
                "\n",
                "Returns: List of news articles with headline, source, summary, url, and publication date."
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["general", "forex", "crypto", "merger"],
                        "default": "general",
                        "description": "News category"
                    },
                    "count": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 100,
                        "default": 10,
                        "description": "Maximum number of articles to return"
                    },
                    "days": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Only return news from the past N days"
                    }
                },
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_market_data",
            description: concat!(
                "Get real-time market quote data for a specific stock.\n",
                "\n",
                "Parameters:\n",
                "- stock: Stock ticker symbol (e.g., 'AAPL', 'GOOGL', 'MSFT')\n",
                "\n",
                "Returns: Quote data including:\n",
                "- c: Current price\n",
                "- h: High price of the day\n",
                "- l: Low price of the day\n",
                "- o: Open price of the day\n",
                "- pc: Previous close price\n",
                "- t: Timestamp\n",
                "- d: Change (current - previous close)\n",
                "- dp: Percent change"
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "stock": {
                        "type": "string",
                        "description": "Stock ticker symbol (e.g., 'AAPL')"
                    }
                },
                "required": ["stock"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_basic_financials",
            description: concat!(
                "Get comprehensive financial metrics for a company.\n",
                "\n",
                "Parameters:\n",
                "- stock: Stock ticker symbol (e.g., 'AAPL', 'GOOGL', 'MSFT')\n",
                "- metric: Type of metrics to retrieve. Valid values: 'all', 'price', 'valuation', 'margin'. Default: 'all'\n",
                "\n",
                "Returns: Financial metrics including:\n",
                "- 52-week high/low\n",
                "- Beta\n",
                "- Market capitalization\n",
                "- P/E ratio\n",
                "- EPS\n",
                "- Dividend yield\n",
                "- Revenue/profit margins\n",
                "- And many more fundamental indicators"
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "stock": {
                        "type": "string",
                        "description": "Stock ticker symbol (e.g., 'AAPL')"
                    },
                    "metric": {
                        "type": "string",
                        "enum": ["all", "price", "valuation", "margin"],
                        "default": "all",
                        "description": "Type of metrics to retrieve"
                    }
                },
                "required": ["stock"],
                "additionalProperties": false
            }),
        },
        ToolDef {
            name: "get_recommendation_trends",
            description: concat!(
                "Get analyst recommendation trends for a stock over time.\n",
                "\n",
                "Parameters:\n",
                "- stock: Stock ticker symbol (e.g., 'AAPL', 'GOOGL', 'MSFT')\n",
                "\n",
                "Returns: Monthly breakdown of analyst recommendations including:\n",
                "- buy: Number of buy recommendations\n",
                "- hold: Number of hold recommendations\n",
                "- sell: Number of sell recommendations\n",
                "- strongBuy: Number of strong buy recommendations\n",
                "- strongSell: Number of strong sell recommendations\n",
                "- period: The month of the recommendation data\n",
                "\n",
                "Useful for understanding market sentiment and analyst consensus on a stock."
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "stock": {
                        "type": "string",
                        "description": "Stock ticker symbol (e.g., 'AAPL')"
                    }
                },
                "required": ["stock"],
                "additionalProperties": false
            }),
        },
    ]
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ListNewsParams {
    category: String,
    count: i64,
    days: Option<i64>,
}

impl Default for ListNewsParams {
    fn default() -> Self {
        Self {
            category: "general".to_string(),
            count: 10,
            days: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StockParams {
    stock: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FinancialsParams {
    stock: String,
    #[serde(default = "FinancialsParams::default_metric")]
    metric: String,
}

impl FinancialsParams {
    fn default_metric() -> String {
        "all".to_string()
    }
}

/// Execute one tool call against the shared service.
pub async fn dispatch_tool(
    service: &FinnhubService,
    name: &str,
    arguments: Option<Value>,
    notifier: &Notifier,
    sink: Option<&dyn ProgressSink>,
) -> Result<ToolCallResult, RpcError> {
    match name {
        "list_news" => {
            let params: ListNewsParams = parse_arguments(arguments)?;
            notifier.log(
                LogLevel::Info,
                format!("Fetching {} news...", params.category),
            );
            Ok(render(
                service
                    .list_news(&params.category, params.count, params.days, sink)
                    .await,
            ))
        }
        "get_market_data" => {
            let params: StockParams = parse_arguments(arguments)?;
            notifier.log(
                LogLevel::Info,
                format!("Fetching market data for {}...", display_symbol(&params.stock)),
            );
            Ok(render(service.get_market_data(&params.stock, sink).await))
        }
        "get_basic_financials" => {
            let params: FinancialsParams = parse_arguments(arguments)?;
            notifier.log(
                LogLevel::Info,
                format!(
                    "Fetching basic financials for {}...",
                    display_symbol(&params.stock)
                ),
            );
            Ok(render(
                service
                    .get_basic_financials(&params.stock, &params.metric, sink)
                    .await,
            ))
        }
        "get_recommendation_trends" => {
            let params: StockParams = parse_arguments(arguments)?;
            notifier.log(
                LogLevel::Info,
                format!(
                    "Fetching recommendation trends for {}...",
                    display_symbol(&params.stock)
                ),
            );
            Ok(render(
                service.get_recommendation_trends(&params.stock, sink).await,
            ))
        }
        _ => Err(RpcError::invalid_params(format!("Unknown tool: {name}"))),
    }
}

/// Normalized symbol for announce messages; validation happens later in
/// the service.
fn display_symbol(stock: &str) -> String {
    stock.trim().to_uppercase()
}

fn parse_arguments<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T, RpcError> {
    let value = arguments.unwrap_or_else(|| json!({}));
    serde_json::from_value(value)
        .map_err(|e| RpcError::invalid_params(format!("Invalid tool arguments: {e}")))
}

/// Render an operation result as a tool call result.
fn render<T: Serialize>(result: Result<T, FinnhubError>) -> ToolCallResult {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => ToolCallResult::error(format!("Failed to serialize tool result: {e}")),
        },
        Err(e) => ToolCallResult::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use finnhub_mcp_core::service::{RateLimiter, RetryPolicy};
    use tokio::sync::mpsc;

    fn test_service() -> FinnhubService {
        FinnhubService::with_config(
            Some("test-key".to_string()),
            RateLimiter::with_interval(Duration::ZERO),
            RetryPolicy::default(),
        )
    }

    fn test_notifier() -> Notifier {
        let (tx, _rx) = mpsc::unbounded_channel();
        Notifier::new(tx)
    }

    #[test]
    fn test_tool_definitions_cover_all_operations() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "list_news",
                "get_market_data",
                "get_basic_financials",
                "get_recommendation_trends"
            ]
        );
        for def in &defs {
            assert_eq!(def.input_schema["type"], "object");
            assert!(def.input_schema["properties"].is_object());
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn test_list_news_arguments_default() {
        let params: ListNewsParams = parse_arguments(None).unwrap();
        assert_eq!(params.category, "general");
        assert_eq!(params.count, 10);
        assert_eq!(params.days, None);
    }

    #[test]
    fn test_financials_metric_defaults_to_all() {
        let params: FinancialsParams =
            parse_arguments(Some(json!({"stock": "AAPL"}))).unwrap();
        assert_eq!(params.metric, "all");
    }

    #[test]
    fn test_unknown_argument_fields_are_rejected() {
        let result: Result<StockParams, _> =
            parse_arguments(Some(json!({"ticker": "AAPL"})));
        let err = result.unwrap_err();
        assert_eq!(err.code, RpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_protocol_error() {
        let service = test_service();
        let notifier = test_notifier();

        let err = dispatch_tool(&service, "bogus_tool", None, &notifier, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, RpcError::INVALID_PARAMS);
        assert!(err.message.contains("Unknown tool: bogus_tool"));
    }

    #[tokio::test]
    async fn test_missing_required_stock_is_a_protocol_error() {
        let service = test_service();
        let notifier = test_notifier();

        let err = dispatch_tool(&service, "get_market_data", Some(json!({})), &notifier, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, RpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_validation_failures_render_as_tool_errors() {
        let service = test_service();
        let notifier = test_notifier();

        let result = dispatch_tool(
            &service,
            "get_market_data",
            Some(json!({"stock": "  "})),
            &notifier,
            None,
        )
        .await
        .unwrap();

        assert!(result.is_error);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Stock symbol is required"));
    }

    #[tokio::test]
    async fn test_invalid_category_renders_as_tool_error() {
        let service = test_service();
        let notifier = test_notifier();

        let result = dispatch_tool(
            &service,
            "list_news",
            Some(json!({"category": "sports"})),
            &notifier,
            None,
        )
        .await
        .unwrap();

        assert!(result.is_error);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Invalid category 'sports'"));
    }
}
