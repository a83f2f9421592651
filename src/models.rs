//! Data models for fetched pages, extraction results and analysis reports.
//!
//! This module defines the core data structures used throughout the application:
//! - [`PageDocument`]: Raw markup fetched for a single URL
//! - [`ArticleResult`]: Best-effort title and main text of a page
//! - [`CommentCandidate`]: A comment-like text block found during harvesting
//! - [`ExtractionRecord`]: The article plus comments for one URL, or an error
//! - [`BlogLink`], [`ScoredComment`], [`BlogReport`]: Search results and the
//!   enriched report produced by the `analyze` command

use crate::sentiment::Sentiment;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Raw markup fetched from a URL.
///
/// Created by the fetcher and consumed by both extractors. It is never
/// mutated after the fetch completes.
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// The URL the markup was fetched from.
    pub url: String,
    /// The response body as text.
    pub markup: String,
}

/// The main content of a page.
///
/// `text` is an empty string when no extraction strategy produced anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResult {
    /// The page or article title, when the winning strategy provides one.
    pub title: Option<String>,
    /// The extracted article text.
    pub text: String,
}

/// Where a comment candidate was harvested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// A block nested inside an element whose id or class looks comment-related.
    KeywordNode,
    /// An element matched by one of the common comment CSS selectors.
    GenericSelector,
}

/// A raw comment-like text block, before cleaning and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCandidate {
    /// Stripped text of the block.
    pub text: String,
    /// Length of `text` in characters.
    pub chars: usize,
    /// Which harvesting pass produced it.
    pub origin: CandidateOrigin,
}

/// Article text and comments extracted from a single URL.
///
/// When the fetch fails only `url` and `error` are populated, and only those
/// two keys are serialized. Otherwise `title` and `error` are left out of the
/// JSON when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExtractionRecord {
    /// The URL that was processed.
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Main article text, possibly empty.
    #[serde(default)]
    pub text: String,
    /// Cleaned comments in first-seen order.
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Serialize for ExtractionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let error_only = self.is_failed() && self.title.is_none() && self.text.is_empty() && self.comments.is_empty();

        let mut state = serializer.serialize_struct("ExtractionRecord", 5)?;
        state.serialize_field("url", &self.url)?;
        match &self.title {
            Some(title) => state.serialize_field("title", title)?,
            None => state.skip_field("title")?,
        }
        if error_only {
            state.skip_field("text")?;
            state.skip_field("comments")?;
        } else {
            state.serialize_field("text", &self.text)?;
            state.serialize_field("comments", &self.comments)?;
        }
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        state.end()
    }
}

impl ExtractionRecord {
    /// A record for a URL that could not be fetched.
    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the record carries an error instead of content.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// A search hit pointing at a candidate blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogLink {
    pub title: String,
    pub link: String,
}

/// A comment paired with its sentiment label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredComment {
    pub content: String,
    pub sentiment: Sentiment,
}

/// The enriched analysis of one blog post.
///
/// Every enrichment step is optional: a failed step leaves its field empty
/// and adds a human-readable entry to `warnings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogReport {
    /// The analyzed URL.
    pub url: String,
    pub title: Option<String>,
    /// Summary of the article text.
    pub summary: String,
    /// Comments with their sentiment, deduplicated.
    pub comments: Vec<ScoredComment>,
    /// Path of the rendered word cloud, when rendering succeeded.
    pub wordcloud_path: Option<String>,
    /// Path of the rendered sentiment pie chart, when rendering succeeded.
    pub pie_chart_path: Option<String>,
    /// Non-fatal problems met while enriching the record.
    pub warnings: Vec<String>,
    /// Set when the page itself could not be fetched.
    pub error: Option<String>,
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_result_default_is_empty() {
        let article = ArticleResult::default();
        assert_eq!(article.title, None);
        assert_eq!(article.text, "");
    }

    #[test]
    fn test_failed_record_has_no_content() {
        let record = ExtractionRecord::failed("https://example.com/post", "Error fetching https://example.com/post: boom");
        assert!(record.is_failed());
        assert_eq!(record.url, "https://example.com/post");
        assert!(record.title.is_none());
        assert!(record.text.is_empty());
        assert!(record.comments.is_empty());
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let record = ExtractionRecord {
            url: "https://example.com".to_string(),
            title: None,
            text: "Body".to_string(),
            comments: vec!["A thoughtful comment here.".to_string()],
            error: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"title\""));
        assert!(!json.contains("\"error\""));
        assert!(json.contains("A thoughtful comment here."));
    }

    #[test]
    fn test_failed_record_serializes_url_and_error_only() {
        let record = ExtractionRecord::failed("http://x", "Error fetching http://x: connection refused");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "http://x", "error": "Error fetching http://x: connection refused"})
        );
    }

    #[test]
    fn test_successful_record_keeps_empty_fields() {
        let record = ExtractionRecord {
            url: "https://example.com".to_string(),
            ..ExtractionRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"url": "https://example.com", "text": "", "comments": []}));
    }

    #[test]
    fn test_record_deserialization_of_failure() {
        let json = r#"{"url": "https://example.com", "error": "Error fetching https://example.com: timeout"}"#;
        let record: ExtractionRecord = serde_json::from_str(json).unwrap();
        assert!(record.is_failed());
        assert!(record.comments.is_empty());
        assert_eq!(record.text, "");
    }

    #[test]
    fn test_scored_comment_serialization() {
        let comment = ScoredComment {
            content: "Loved it.".to_string(),
            sentiment: Sentiment::Positive,
        };
        let json = serde_json::to_string(&comment).unwrap();
        assert_eq!(json, r#"{"content":"Loved it.","sentiment":"Positive"}"#);
    }
}
