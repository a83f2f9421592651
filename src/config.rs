//! Application configuration loaded from an optional YAML file.
//!
//! Every field has a default, so an absent file or a partial file is valid.
//! Secrets given on the command line or through the environment override the
//! file (see [`AppConfig::apply_cli`]).
//!
//! ```yaml
//! search:
//!   api_key: "..."
//!   cx: "..."
//! summarizer:
//!   gemini_model: gemini-2.5-flash
//!   completion_base_url: https://api.openai.com/v1
//!   max_retries: 2
//! output:
//!   static_dir: ./static
//! ```

use crate::cli::Cli;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub summarizer: SummarizerConfig,
    pub output: OutputConfig,
}

/// Custom Search API credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub cx: Option<String>,
    /// Overrides the public endpoint; useful for proxies and tests.
    pub endpoint: Option<String>,
}

/// Language model backends used for summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub completion_base_url: String,
    pub completion_model: String,
    pub completion_api_key: Option<String>,
    pub max_tokens: u32,
    /// Retries per backend before giving up on it.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_api_key: None,
            completion_base_url: "https://api.openai.com/v1".to_string(),
            completion_model: "gpt-3.5-turbo-instruct".to_string(),
            completion_api_key: None,
            max_tokens: 512,
            max_retries: 2,
            base_delay_ms: 1000,
            timeout_secs: 60,
        }
    }
}

/// Where reports and chart images are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for JSON and Markdown reports.
    pub report_dir: String,
    /// Directory holding the `img/` chart assets.
    pub static_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: "./reports".to_string(),
            static_dir: "./static".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config = Self::from_file(Path::new(path))?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Could not read config {}: {e}", path.display()))?;
        Self::from_yaml(&raw)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error>> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Let values given on the command line or environment win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        override_with(&mut self.search.api_key, &cli.google_api_key);
        override_with(&mut self.search.cx, &cli.google_cx);
        override_with(&mut self.summarizer.gemini_api_key, &cli.gemini_api_key);
        override_with(&mut self.summarizer.completion_api_key, &cli.openai_api_key);
    }
}

fn override_with(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value.as_ref().filter(|v| !v.trim().is_empty()) {
        *slot = Some(v.clone());
    }
}
