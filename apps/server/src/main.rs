use finnhub_mcp_core::{FinnhubService, API_KEY_ENV};
use finnhub_mcp_server::{McpServer, SERVER_NAME};
use tokio::io::BufReader;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Diagnostics go to stderr; stdout carries the protocol.
fn init_tracing() {
    let log_format = std::env::var("FINNHUB_MCP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
    if api_key.trim().is_empty() {
        eprintln!("Error: {API_KEY_ENV} environment variable is not set.");
        eprintln!("Please set it in your MCP client configuration or environment.");
        std::process::exit(1);
    }

    init_tracing();
    tracing::info!("Starting {} server on stdio", SERVER_NAME);

    let server = McpServer::new(FinnhubService::new());
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
