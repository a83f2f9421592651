//! HTTP retrieval of page markup.
//!
//! All page and probe requests go through a single [`Fetcher`] so that every
//! request carries the same identifying User-Agent and the same timeout.
//! There are no retries: a failed fetch is terminal for that URL.

use crate::models::PageDocument;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; BlogScraper/1.0; +https://example.com/bot)";

/// Timeout applied to every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);

/// A transport or HTTP failure while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Error fetching {url}: HTTP status {status}")]
    Status { url: String, status: StatusCode },
    #[error("Error building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }
}

/// Shared HTTP client for page and probe requests.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher with the default 12 second timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Build a fetcher with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GET a page and return its markup.
    ///
    /// Any non-2xx status and any transport error become a [`FetchError`].
    #[instrument(level = "info", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<PageDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Non-success status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let markup = response
            .text()
            .await
            .map_err(|e| FetchError::transport(url, e))?;
        info!(bytes = markup.len(), "Fetched page");

        Ok(PageDocument {
            url: url.to_string(),
            markup,
        })
    }

    /// GET a JSON document.
    ///
    /// Returns `Ok(None)` when the server answers with anything but 200 or the
    /// body is not valid JSON.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_json(&self, url: &str) -> Result<Option<serde_json::Value>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        if response.status() != StatusCode::OK {
            debug!(status = %response.status(), "JSON endpoint did not answer 200");
            return Ok(None);
        }

        match response.json::<serde_json::Value>().await {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(error = %e, "JSON endpoint returned an unparseable body");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_sends_user_agent_and_returns_markup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>hi</body></html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/post", server.uri());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.markup, "<html><body>hi</body></html>");
    }

    #[tokio::test]
    async fn test_fetch_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/missing", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status == StatusCode::NOT_FOUND));
        assert!(err.to_string().contains(&url));
    }

    #[tokio::test]
    async fn test_fetch_reports_connection_errors_with_url() {
        let fetcher = Fetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let url = "http://127.0.0.1:1/unreachable";
        let err = fetcher.fetch(url).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(err.to_string().starts_with("Error fetching http://127.0.0.1:1/unreachable"));
    }

    #[tokio::test]
    async fn test_get_json_ignores_non_ok_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{}"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let value = fetcher.get_json(&server.uri()).await.unwrap();
        assert!(value.is_none());
    }
}
