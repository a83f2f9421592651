//! Article summarization through hosted language models.
//!
//! The summarizer talks to two backends:
//! - [`GeminiAsk`]: the primary backend, Google's `generateContent` endpoint
//! - [`CompletionAsk`]: the fallback, any OpenAI-compatible `/completions` endpoint
//!
//! Both implement [`AskAsync`] and are wrapped in [`RetryAsk`], which adds
//! exponential backoff with jitter. When the primary backend gives up, the
//! fallback is tried once with its own retry budget.
//!
//! # Retry Strategy
//!
//! - Configurable number of retries per backend (default 2)
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::SummarizerConfig;
use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Summary returned for pages without extractable text.
pub const NO_CONTENT_SUMMARY: &str = "No content available for summarization.";

/// Trait for async LLM interaction.
///
/// Implementors send a prompt to a model and return its text answer.
pub trait AskAsync {
    /// Send `text` to the model and return its answer.
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Primary backend: Gemini `generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiAsk {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiAsk {
    pub fn new(client: Client, base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
        }
    }
}

impl AskAsync for GeminiAsk {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let api_key = self.api_key.as_deref().ok_or("Gemini API key is not configured")?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text }],
            }],
        };

        let t0 = Instant::now();
        let response: GeminiResponse = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(elapsed_ms = t0.elapsed().as_millis(), "Gemini answered");

        let answer: String = response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if answer.trim().is_empty() {
            return Err("Gemini returned no candidates".into());
        }
        Ok(answer.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

/// Fallback backend: an OpenAI-compatible text completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionAsk {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl CompletionAsk {
    pub fn new(client: Client, base_url: String, model: String, api_key: Option<String>, max_tokens: u32) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
            max_tokens,
        }
    }
}

impl AskAsync for CompletionAsk {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let api_key = self.api_key.as_deref().ok_or("completion API key is not configured")?;
        let url = format!("{}/completions", self.base_url.trim_end_matches('/'));
        let request = CompletionRequest {
            model: &self.model,
            prompt: text,
            max_tokens: self.max_tokens,
        };

        let t0 = Instant::now();
        let response: CompletionResponse = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        info!(elapsed_ms = t0.elapsed().as_millis(), "Completion endpoint answered");

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| "completion endpoint returned no choices".into())
    }
}

/// Summarizes article text with a primary and a fallback model.
#[derive(Debug)]
pub struct Summarizer {
    primary: RetryAsk<GeminiAsk>,
    fallback: RetryAsk<CompletionAsk>,
}

impl Summarizer {
    /// Build both backends from configuration.
    pub fn from_config(config: &SummarizerConfig) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;
        let base_delay = StdDuration::from_millis(config.base_delay_ms);

        let primary = GeminiAsk::new(
            client.clone(),
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
        );
        let fallback = CompletionAsk::new(
            client,
            config.completion_base_url.clone(),
            config.completion_model.clone(),
            config.completion_api_key.clone(),
            config.max_tokens,
        );

        Ok(Self {
            primary: RetryAsk::new(primary, config.max_retries, base_delay),
            fallback: RetryAsk::new(fallback, config.max_retries, base_delay),
        })
    }

    /// Summarize article text.
    ///
    /// Empty text short-circuits to [`NO_CONTENT_SUMMARY`]. An error is
    /// returned only when both backends fail.
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    pub async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>> {
        if text.trim().is_empty() {
            return Ok(NO_CONTENT_SUMMARY.to_string());
        }

        let prompt = summary_prompt(text);
        match self.primary.ask(&prompt).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(error = %e, "Primary summarizer failed; trying fallback");
                self.fallback.ask(&prompt).await
            }
        }
    }
}

/// The instruction sent to the model for an article.
pub fn summary_prompt(content: &str) -> String {
    format!(
        "Generate a precise summary of the given content in such way that it covers what is discussed in it \
         Content: '''{content}''' Please give output in plain text with no headings etc"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug)]
    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl AskAsync for Flaky {
        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("transient".into());
            }
            Ok(format!("echo: {text}"))
        }
    }

    fn test_config(server: &MockServer) -> SummarizerConfig {
        SummarizerConfig {
            gemini_base_url: server.uri(),
            gemini_api_key: Some("gem-key".to_string()),
            completion_base_url: server.uri(),
            completion_api_key: Some("oa-key".to_string()),
            max_retries: 0,
            base_delay_ms: 1,
            ..SummarizerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(flaky, 3, StdDuration::from_millis(1));
        let answer = api.ask("hello").await.unwrap();

        assert_eq!(answer, "echo: hello");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let flaky = Flaky {
            failures_left: Cell::new(10),
            calls: Cell::new(0),
        };
        let api = RetryAsk::new(flaky, 1, StdDuration::from_millis(1));

        assert!(api.ask("hello").await.is_err());
        assert_eq!(api.inner.calls.get(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_uses_placeholder() {
        let server = MockServer::start().await;
        let summarizer = Summarizer::from_config(&test_config(&server)).unwrap();

        assert_eq!(summarizer.summarize("   ").await.unwrap(), NO_CONTENT_SUMMARY);
    }

    #[tokio::test]
    async fn test_primary_backend_summary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(query_param("key", "gem-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "A short summary. "}]}}]
            })))
            .mount(&server)
            .await;

        let summarizer = Summarizer::from_config(&test_config(&server)).unwrap();
        let summary = summarizer.summarize("Some long article text.").await.unwrap();
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_fallback_used_when_primary_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/completions"))
            .and(header("authorization", "Bearer oa-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"text": "\n\nFallback summary."}]
            })))
            .mount(&server)
            .await;

        let summarizer = Summarizer::from_config(&test_config(&server)).unwrap();
        let summary = summarizer.summarize("Some long article text.").await.unwrap();
        assert_eq!(summary, "Fallback summary.");
    }

    #[tokio::test]
    async fn test_error_when_both_backends_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let summarizer = Summarizer::from_config(&test_config(&server)).unwrap();
        assert!(summarizer.summarize("Some long article text.").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_keys_count_as_failures() {
        let server = MockServer::start().await;
        let config = SummarizerConfig {
            gemini_api_key: None,
            completion_api_key: None,
            ..test_config(&server)
        };
        let summarizer = Summarizer::from_config(&config).unwrap();
        assert!(summarizer.summarize("Text to summarize.").await.is_err());
    }

    #[test]
    fn test_summary_prompt_wraps_content() {
        let prompt = summary_prompt("the body");
        assert!(prompt.contains("Content: '''the body'''"));
        assert!(prompt.ends_with("no headings etc"));
    }
}
