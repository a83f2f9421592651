//! JSON report writer.
//!
//! Reports are written one file per analyzed URL:
//! ```text
//! report_dir/
//! └── example-com-2024-05-rust-tips.json
//! ```

use crate::models::BlogReport;
use crate::utils::report_slug;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`BlogReport`] as pretty-printed JSON into `report_dir`.
///
/// The file name is derived from the report URL. Returns the written path.
#[instrument(level = "info", skip_all, fields(report_dir = %report_dir, url = %report.url))]
pub async fn write_report(report: &BlogReport, report_dir: &str) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;

    if let Err(e) = fs::create_dir_all(report_dir).await {
        error!(%report_dir, error = %e, "Failed to create report dir");
        return Err(e.into());
    }

    let path = format!("{}/{}.json", report_dir.trim_end_matches('/'), report_slug(&report.url));
    fs::write(&path, json).await?;
    info!(%path, "Wrote JSON report");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoredComment;
    use crate::sentiment::Sentiment;

    fn sample_report() -> BlogReport {
        BlogReport {
            url: "https://example.com/2024/05/rust-tips".to_string(),
            title: Some("Rust tips".to_string()),
            summary: "A short summary.".to_string(),
            comments: vec![ScoredComment {
                content: "Very helpful, thank you!".to_string(),
                sentiment: Sentiment::Positive,
            }],
            wordcloud_path: None,
            pie_chart_path: Some("static/img/plot.svg".to_string()),
            warnings: vec!["Could not generate wordcloud.".to_string()],
            error: None,
            generated_at: "2024-05-01T00:00:00+00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports");
        let report_dir = nested.to_str().unwrap();

        let path = write_report(&sample_report(), report_dir).await.unwrap();
        assert!(path.ends_with("example-com-2024-05-rust-tips.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: BlogReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.summary, "A short summary.");
        assert_eq!(parsed.comments[0].sentiment, Sentiment::Positive);
        assert_eq!(parsed.warnings, vec!["Could not generate wordcloud.".to_string()]);
    }
}
