//! Command-line interface definitions for blogscope.
//!
//! This module defines the CLI arguments and subcommands using the `clap` crate.
//! API credentials can be provided via flags or environment variables.

use clap::{Parser, Subcommand};

/// Command-line arguments for blogscope.
///
/// # Examples
///
/// ```sh
/// # Find blog posts about a topic
/// blogscope search "machine learning" -n 20
///
/// # Extract article text and comments as JSON
/// blogscope extract https://example.com/post https://example.org/another
///
/// # Full analysis: summary, comment sentiment, word cloud and pie chart
/// blogscope analyze https://example.com/post -o ./reports --static-dir ./static
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Google Custom Search API key
    #[arg(long, env = "GOOGLE_API_KEY", global = true, hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Google Custom Search engine id
    #[arg(long, env = "GOOGLE_CX", global = true)]
    pub google_cx: Option<String>,

    /// Gemini API key for the primary summarizer
    #[arg(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// API key for the fallback completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search for blog posts about a keyword
    Search {
        /// Keyword or phrase to search for
        keyword: String,

        /// Number of links to return
        #[arg(short = 'n', long, default_value_t = 10)]
        num_results: usize,
    },

    /// Extract article text and comments from one or more URLs
    Extract {
        /// Absolute URLs of blog posts
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Extract, summarize and chart a single blog post
    Analyze {
        /// Absolute URL of the blog post
        url: String,

        /// Output directory for the JSON and Markdown report
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Directory for chart images (written under img/)
        #[arg(long)]
        static_dir: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_parsing() {
        let cli = Cli::parse_from(["blogscope", "search", "rust async", "-n", "25"]);
        match cli.command {
            Command::Search { keyword, num_results } => {
                assert_eq!(keyword, "rust async");
                assert_eq!(num_results, 25);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_default_count() {
        let cli = Cli::parse_from(["blogscope", "search", "rust"]);
        assert!(matches!(cli.command, Command::Search { num_results: 10, .. }));
    }

    #[test]
    fn test_extract_requires_urls() {
        assert!(Cli::try_parse_from(["blogscope", "extract"]).is_err());

        let cli = Cli::parse_from(["blogscope", "extract", "https://a.example", "https://b.example"]);
        match cli.command {
            Command::Extract { urls } => assert_eq!(urls.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_analyze_with_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "blogscope",
            "analyze",
            "https://example.com/post",
            "-o",
            "/tmp/reports",
            "--config",
            "/etc/blogscope.yaml",
        ]);

        assert_eq!(cli.config.as_deref(), Some("/etc/blogscope.yaml"));
        match cli.command {
            Command::Analyze { url, output_dir, static_dir } => {
                assert_eq!(url, "https://example.com/post");
                assert_eq!(output_dir.as_deref(), Some("/tmp/reports"));
                assert!(static_dir.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
