//! Per-URL orchestration: fetch, extract, assemble.
//!
//! [`extract_article_and_comments`] never fails. A fetch error ends processing
//! for that URL and is recorded in the returned record; everything after the
//! fetch degrades to empty values instead of erroring.

use crate::extractors::{article, comments, probes};
use crate::fetch::Fetcher;
use crate::models::{ExtractionRecord, PageDocument};
use tracing::{info, instrument, warn};

/// Upper bound on comments in an [`ExtractionRecord`].
pub const MAX_RECORD_COMMENTS: usize = 30;

/// Fetch a page and extract its article and comments.
#[instrument(level = "info", skip(fetcher))]
pub async fn extract_article_and_comments(fetcher: &Fetcher, url: &str) -> ExtractionRecord {
    let page = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(error = %e, "Fetch failed; recording error");
            return ExtractionRecord::failed(url, e.to_string());
        }
    };

    let native = comments::extract_comments(&page.markup);
    let fallback = if native.is_empty() {
        probes::fetch_platform_comments(fetcher, &page.url, &page.markup).await
    } else {
        Vec::new()
    };

    assemble_record(&page, native, fallback)
}

/// Build the record for a fetched page.
///
/// `fallback` replaces `native` only when `native` is empty. Widget
/// annotations go first and the list is cut to [`MAX_RECORD_COMMENTS`].
pub fn assemble_record(page: &PageDocument, native: Vec<String>, fallback: Vec<String>) -> ExtractionRecord {
    let article = article::extract_article(&page.markup);
    let found = if native.is_empty() { fallback } else { native };

    let comments: Vec<String> = probes::detect_widgets(&page.markup)
        .into_iter()
        .chain(found)
        .take(MAX_RECORD_COMMENTS)
        .collect();

    info!(
        url = %page.url,
        has_title = article.title.is_some(),
        text_chars = article.text.chars().count(),
        comments = comments.len(),
        "Assembled extraction record"
    );

    ExtractionRecord {
        url: page.url.clone(),
        title: article.title,
        text: article.text,
        comments,
        error: None,
    }
}
