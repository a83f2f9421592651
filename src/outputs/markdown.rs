//! Markdown rendering of a [`BlogReport`].
//!
//! The layout mirrors a blog description page: title and link, the summary,
//! any warnings, chart images, then each comment with its sentiment. Image
//! links are written relative to the directory the Markdown file lives in.

use crate::models::BlogReport;
use crate::sentiment::Sentiment;
use crate::utils::{relative_link, report_slug};
use std::error::Error;
use std::fmt::{self, Write};
use tokio::fs;
use tracing::{info, instrument};

/// Render a report as Markdown to be stored in `report_dir`.
pub fn report_to_markdown(report: &BlogReport, report_dir: &str) -> Result<String, fmt::Error> {
    let mut md = String::new();

    let title = report.title.as_deref().unwrap_or(&report.url);
    writeln!(md, "# {}\n", title)?;
    writeln!(md, "<{}>\n", report.url)?;

    if let Some(err) = &report.error {
        writeln!(md, "> **Error:** {}\n", err)?;
    }

    if !report.warnings.is_empty() {
        for warning in &report.warnings {
            writeln!(md, "> ⚠ {}", warning)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "## Summary\n")?;
    writeln!(md, "{}\n", report.summary.trim())?;

    if let Some(path) = &report.wordcloud_path {
        writeln!(md, "## Word Cloud\n")?;
        writeln!(md, "![Word cloud]({})\n", relative_link(report_dir, path))?;
    }

    writeln!(md, "## Comments\n")?;
    if report.comments.is_empty() {
        writeln!(md, "_No comments found._\n")?;
    } else {
        if let Some(path) = &report.pie_chart_path {
            writeln!(md, "![Sentiment Distribution]({})\n", relative_link(report_dir, path))?;
        }
        for comment in &report.comments {
            writeln!(md, "- {} **{}**: {}", badge(comment.sentiment), comment.sentiment, comment.content)?;
        }
        writeln!(md)?;
    }

    writeln!(md, "---\n_Generated {}_", report.generated_at)?;
    Ok(md)
}

/// Render and write a report next to its JSON twin. Returns the written path.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir, url = %report.url))]
pub async fn write_markdown(report: &BlogReport, report_dir: &str) -> Result<String, Box<dyn Error>> {
    let md = report_to_markdown(report, report_dir)?;
    fs::create_dir_all(report_dir).await?;

    let path = format!("{}/{}.md", report_dir.trim_end_matches('/'), report_slug(&report.url));
    fs::write(&path, md).await?;
    info!(%path, "Wrote Markdown report");
    Ok(path)
}

fn badge(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "🟢",
        Sentiment::Negative => "🔴",
        Sentiment::Neutral => "⚪",
    }
}
