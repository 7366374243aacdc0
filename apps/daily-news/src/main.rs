//! Daily news snapshot batch job.
//!
//! Fetches the latest general market news from Finnhub, keeps today's
//! articles out of the freshest thirty, and writes them to
//! `news_output_{YYYYMMDD}.json` in the working directory. Intended to
//! run once a day from cron or a CI schedule.

use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveTime, Utc};
use finnhub_mcp_core::client::FinnhubClient;
use finnhub_mcp_core::models::{NewsArticle, NewsCategory, NewsItem};
use finnhub_mcp_core::API_KEY_ENV;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Number of freshest articles scanned for today's news.
const SCAN_LIMIT: usize = 30;

/// Date format used in rendered articles and the output filename.
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Midnight UTC of the day containing `now`.
fn start_of_today(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Keep today's articles out of the freshest [`SCAN_LIMIT`].
///
/// The scan window is cut before filtering, so a stale article inside
/// the window shrinks the result rather than pulling in the next one.
fn todays_news(articles: Vec<NewsArticle>, start_of_day: DateTime<Utc>) -> Vec<NewsItem> {
    let start_ts = start_of_day.timestamp();
    articles
        .into_iter()
        .take(SCAN_LIMIT)
        .filter(|article| article.datetime >= start_ts)
        .map(|article| article.into_item(COMPACT_DATE_FORMAT))
        .collect()
}

async fn run() -> anyhow::Result<()> {
    let api_key = std::env::var(API_KEY_ENV)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or_else(|| anyhow!("{API_KEY_ENV} environment variable is not set"))?;

    let client = FinnhubClient::new(api_key);

    info!("Fetching general news...");
    let articles = client
        .general_news(NewsCategory::General, 0)
        .await
        .map_err(|e| anyhow!("Error fetching news: {e}"))?;

    let now = Utc::now();
    let items = todays_news(articles, start_of_today(now));
    info!(
        "Processed {} news items from the top {}.",
        items.len(),
        SCAN_LIMIT
    );

    let output_file = format!("news_output_{}.json", now.format(COMPACT_DATE_FORMAT));
    let payload = serde_json::to_string_pretty(&items).context("Failed to serialize news")?;
    std::fs::write(&output_file, payload).map_err(|e| anyhow!("Failed to save output: {e}"))?;
    info!("Saved news to {}", output_file);

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}
