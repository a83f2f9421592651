//! # Blogscope
//!
//! Finds blog posts for a keyword, pulls the article text and reader comments
//! out of each page, and produces an enriched report: a model-written summary,
//! per-comment sentiment, a word cloud and a sentiment pie chart.
//!
//! ## Usage
//!
//! ```sh
//! blogscope search "rust async" -n 20
//! blogscope extract https://example.com/post
//! blogscope analyze https://example.com/post -o ./reports
//! ```
//!
//! ## Architecture
//!
//! 1. **Search**: Keyword to blog URLs through the Custom Search API
//! 2. **Fetching**: Download each page with a fixed user agent and timeout
//! 3. **Extraction**: Article text through a cascade of strategies, comments
//!    through DOM heuristics with a WordPress REST fallback
//! 4. **Enrichment**: Summary, sentiment and charts, each allowed to fail alone
//! 5. **Output**: JSON on stdout, or JSON and Markdown report files
//!
//! URLs are processed one at a time.

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod extractors;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod report;
mod search;
mod sentiment;
mod utils;

use api::Summarizer;
use cli::{Cli, Command};
use config::AppConfig;
use fetch::Fetcher;
use models::ExtractionRecord;
use outputs::{json, markdown};
use search::SearchClient;
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("blogscope starting up");

    let args = Cli::parse();
    debug!(?args.command, config = ?args.config, "Parsed CLI arguments");

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_cli(&args);

    match args.command {
        Command::Search { keyword, num_results } => run_search(&config, &keyword, num_results).await?,
        Command::Extract { urls } => run_extract(urls).await?,
        Command::Analyze {
            url,
            output_dir,
            static_dir,
        } => {
            let report_dir = output_dir.unwrap_or_else(|| config.output.report_dir.clone());
            let static_dir = static_dir.unwrap_or_else(|| config.output.static_dir.clone());
            run_analyze(&config, &url, &report_dir, &static_dir).await?
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// Print search hits for `keyword` as JSON.
#[instrument(level = "info", skip(config))]
async fn run_search(config: &AppConfig, keyword: &str, num_results: usize) -> Result<(), Box<dyn Error>> {
    let (Some(api_key), Some(cx)) = (config.search.api_key.clone(), config.search.cx.clone()) else {
        error!("Search needs an API key and engine id (GOOGLE_API_KEY / GOOGLE_CX or config search section)");
        return Err("missing search credentials".into());
    };

    let client = match &config.search.endpoint {
        Some(endpoint) => SearchClient::with_endpoint(api_key, cx, endpoint.clone()),
        None => SearchClient::new(api_key, cx),
    };

    let links = client.fetch_blog_links(keyword, num_results).await?;
    info!(found = links.len(), "Search complete");
    println!("{}", serde_json::to_string_pretty(&links)?);
    Ok(())
}

/// Extract every URL in order and print the records as a JSON array.
#[instrument(level = "info", skip_all, fields(urls = urls.len()))]
async fn run_extract(urls: Vec<String>) -> Result<(), Box<dyn Error>> {
    let fetcher = Fetcher::new()?;

    let records: Vec<ExtractionRecord> = stream::iter(urls)
        .then(|url| {
            let fetcher = &fetcher;
            async move { pipeline::extract_article_and_comments(fetcher, &url).await }
        })
        .collect()
        .await;

    let failed = records.iter().filter(|r| r.is_failed()).count();
    info!(total = records.len(), failed, "Extraction complete");

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// Extract, enrich and write the report for one URL.
#[instrument(level = "info", skip(config))]
async fn run_analyze(config: &AppConfig, url: &str, report_dir: &str, static_dir: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = ensure_writable_dir(report_dir).await {
        error!(
            path = %report_dir,
            error = %e,
            "Report directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = Fetcher::new()?;
    let summarizer = Summarizer::from_config(&config.summarizer)?;

    let record = pipeline::extract_article_and_comments(&fetcher, url).await;
    if let Some(err) = &record.error {
        error!(error = %err, "Page could not be fetched");
    }
    debug!(text = %truncate_for_log(&record.text, 200), "Extracted article text");

    let report = report::build_report(&record, &summarizer, static_dir).await;
    for warning in &report.warnings {
        info!(%warning, "Report warning");
    }

    let json_path = json::write_report(&report, report_dir).await?;
    let md_path = markdown::write_markdown(&report, report_dir).await?;
    info!(%json_path, %md_path, "Report written");
    Ok(())
}
