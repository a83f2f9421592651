//! Blog discovery through the Google Custom Search JSON API.
//!
//! The query is biased towards blogging platforms and posts with comment
//! sections, and away from social networks and archive pages. Results are
//! requested in pages of 10 until enough links are collected or a page comes
//! back empty.

use crate::models::BlogLink;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, info, instrument};

/// Default Custom Search endpoint.
pub const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Results per page; the API maximum.
const PAGE_SIZE: usize = 10;

const BLOG_HINTS: &str = r#"("blog post" OR "posted on" OR "written by" OR inurl:blog OR "comments") -category -tag -archive"#;
const BLOG_SITES: &str = "(site:medium.com OR site:substack.com OR site:wordpress.com OR site:blogspot.com \
OR site:dev.to OR site:hashnode.dev OR site:ghost.io OR site:vocal.media \
OR site:beehiiv.com OR site:mirror.xyz OR site:hubspot.com OR site:moz.com \
OR site:ahrefs.com OR site:buffer.com OR site:shopify.com OR site:semrush.com)";
const EXCLUDED_SITES: &str = "-site:pinterest.* -site:facebook.com -site:youtube.com -site:twitter.com -site:reddit.com -site:quora.com";

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: String,
    link: String,
}

/// Client for the Custom Search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    api_key: String,
    cx: String,
    endpoint: String,
}

impl SearchClient {
    /// Create a client for the public endpoint.
    pub fn new(api_key: String, cx: String) -> Self {
        Self::with_endpoint(api_key, cx, SEARCH_ENDPOINT.to_string())
    }

    /// Create a client for a custom endpoint.
    pub fn with_endpoint(api_key: String, cx: String, endpoint: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            cx,
            endpoint,
        }
    }

    /// Search for up to `num_results` blog posts about `keyword`.
    ///
    /// A non-2xx answer (bad key, exhausted quota) is an error rather than an
    /// empty result.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_blog_links(&self, keyword: &str, num_results: usize) -> Result<Vec<BlogLink>, Box<dyn Error>> {
        let query = blog_query(keyword);
        let mut results: Vec<BlogLink> = Vec::new();
        let mut start = 1usize;

        let num = PAGE_SIZE.to_string();

        while results.len() < num_results {
            let start_param = start.to_string();
            let page: SearchPage = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("cx", self.cx.as_str()),
                    ("q", query.as_str()),
                    ("num", num.as_str()),
                    ("start", start_param.as_str()),
                    ("sort", "date"),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if page.items.is_empty() {
                debug!(start, "Empty result page; stopping");
                break;
            }

            debug!(start, count = page.items.len(), "Fetched result page");
            results.extend(page.items.into_iter().map(|item| BlogLink {
                title: item.title,
                link: item.link,
            }));
            start += PAGE_SIZE;
        }

        results.truncate(num_results);
        info!(count = results.len(), "Found blog links");
        Ok(results)
    }
}

/// The full search expression for a keyword.
pub fn blog_query(keyword: &str) -> String {
    format!("{keyword} {BLOG_HINTS} {BLOG_SITES} {EXCLUDED_SITES}")
}
