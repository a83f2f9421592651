//! Enrichment of an [`ExtractionRecord`] into a [`BlogReport`].
//!
//! Each step (summary, word cloud, sentiment, pie chart) runs on its own and
//! a failing step only adds a warning. [`build_report`] always returns a
//! report.

use crate::api::Summarizer;
use crate::models::{BlogReport, ExtractionRecord};
use crate::outputs::charts;
use crate::sentiment;
use chrono::Utc;
use itertools::Itertools;
use tracing::{info, instrument, warn};

pub const NO_CONTENT_WARNING: &str = "No main content found for this blog.";
pub const WORDCLOUD_WARNING: &str = "Could not generate wordcloud.";
pub const PIE_CHART_WARNING: &str = "Could not generate sentiment chart.";
pub const SUMMARY_ERROR: &str = "Error while generating summary.";

/// Summarize, score and chart an extraction record.
///
/// Charts are written under `static_dir`.
#[instrument(level = "info", skip(record, summarizer), fields(url = %record.url))]
pub async fn build_report(record: &ExtractionRecord, summarizer: &Summarizer, static_dir: &str) -> BlogReport {
    let mut warnings = Vec::new();
    let content = record.text.as_str();

    if content.trim().is_empty() {
        warnings.push(NO_CONTENT_WARNING.to_string());
    }

    let summary = match summarizer.summarize(content).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!(error = %e, "Summary failed");
            SUMMARY_ERROR.to_string()
        }
    };

    let wordcloud_path = match charts::render_wordcloud(content, static_dir).await {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "Word cloud failed");
            warnings.push(WORDCLOUD_WARNING.to_string());
            None
        }
    };

    let unique_comments: Vec<String> = record.comments.iter().unique().cloned().collect();
    let comments = sentiment::score_comments(&unique_comments);

    let pie_chart_path = if comments.is_empty() {
        None
    } else {
        match charts::render_pie_chart(&comments, static_dir).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Pie chart failed");
                warnings.push(PIE_CHART_WARNING.to_string());
                None
            }
        }
    };

    info!(
        comments = comments.len(),
        warnings = warnings.len(),
        has_wordcloud = wordcloud_path.is_some(),
        has_pie_chart = pie_chart_path.is_some(),
        "Built report"
    );

    BlogReport {
        url: record.url.clone(),
        title: record.title.clone(),
        summary,
        comments,
        wordcloud_path,
        pie_chart_path,
        warnings,
        error: record.error.clone(),
        generated_at: Utc::now().to_rfc3339(),
    }
}
