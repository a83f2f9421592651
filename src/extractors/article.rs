//! Main article text extraction.
//!
//! Extraction is a short-circuiting cascade of strategies tried in order of
//! expected quality. Each strategy either returns a result that clears its own
//! length threshold or `None`; the first `Some` wins and later strategies are
//! never run. Failures inside a strategy (parse errors, libraries giving up)
//! are folded into `None`.
//!
//! | Order | Strategy | Accepts when | Title |
//! |-------|----------|--------------|-------|
//! | 1 | [`full_text`] | > 200 chars | none |
//! | 2 | [`readability_document`] | > 150 chars | from the algorithm |
//! | 3 | [`largest_block`] | > 100 chars | page `<title>` |
//! | 4 | [`whole_page`] | always | page `<title>` |
//!
//! The two library-backed strategies are skipped on markup that is too large
//! or too deeply nested (see [`within_parse_budget`]); their cost grows much
//! faster than linearly with nesting depth.

use super::text::{char_len, page_title, strip_tags, take_chars, visible_text};
use crate::models::ArticleResult;
use dom_smoothie::{Config, Readability};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::io::Cursor;
use tracing::debug;
use url::Url;

/// A single extraction technique.
pub type Strategy = fn(&str) -> Option<ArticleResult>;

const FULL_TEXT_MIN_CHARS: usize = 200;
const READABILITY_MIN_CHARS: usize = 150;
const BLOCK_MIN_CHARS: usize = 100;
/// How many block-level candidates the largest-block scan looks at.
const BLOCK_SCAN_LIMIT: usize = 40;
const WHOLE_PAGE_MAX_CHARS: usize = 5000;

/// Element cap handed to the full-text parser.
const MAX_ELEMENTS_TO_PARSE: usize = 9000;
/// Largest markup the library-backed strategies will look at.
const MAX_MARKUP_BYTES: usize = 5 * 1024 * 1024;
/// Deepest container nesting the library-backed strategies will look at.
const MAX_NESTING_DEPTH: usize = 128;

/// Base URL handed to the readability parser, which insists on one.
const PLACEHOLDER_BASE: &str = "http://localhost/";

static BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, div, main").expect("valid block selector"));
static CONTAINER_TAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<(/?)(?:div|section|article|main|span|table|tbody|tr|td|ul|ol|blockquote|aside|header|footer|nav|form|figure)\b[^>]*>",
    )
    .expect("valid container tag regex")
});
static NOISE_CLASSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)nav|menu|footer|header|advert|cookie|subscribe").expect("valid noise regex")
});

/// The strategies in priority order.
pub const CASCADE: [(&str, Strategy); 4] = [
    ("full_text", full_text),
    ("readability_document", readability_document),
    ("largest_block", largest_block),
    ("whole_page", whole_page),
];

/// Extract the main article from raw markup.
///
/// Never fails: when nothing can be extracted the result has an empty `text`.
pub fn extract_article(markup: &str) -> ArticleResult {
    run_cascade(markup, &CASCADE)
}

/// Try each strategy in order and return the first accepted result.
pub fn run_cascade(markup: &str, strategies: &[(&str, Strategy)]) -> ArticleResult {
    for (name, strategy) in strategies {
        match strategy(markup) {
            Some(result) => {
                debug!(strategy = name, chars = char_len(&result.text), "Article strategy accepted");
                return result;
            }
            None => debug!(strategy = name, "Article strategy fell through"),
        }
    }
    ArticleResult::default()
}

/// Whether markup is small and shallow enough for the readability parsers.
pub fn within_parse_budget(markup: &str) -> bool {
    markup.len() <= MAX_MARKUP_BYTES && container_depth_within(markup, MAX_NESTING_DEPTH)
}

/// Linear scan of container open/close tags; stops as soon as `limit` is passed.
fn container_depth_within(markup: &str, limit: usize) -> bool {
    let mut depth = 0usize;
    for caps in CONTAINER_TAGS.captures_iter(markup) {
        if caps.get(1).is_some_and(|m| m.as_str() == "/") {
            depth = depth.saturating_sub(1);
        } else {
            depth += 1;
            if depth > limit {
                return false;
            }
        }
    }
    true
}

fn longer_than(text: &str, min_chars: usize) -> bool {
    char_len(text) > min_chars
}

fn non_empty_title(raw: &str) -> Option<String> {
    Some(raw.trim().to_string()).filter(|t| !t.is_empty())
}

/// Boilerplate-removal extraction tuned for long-form prose.
pub fn full_text(markup: &str) -> Option<ArticleResult> {
    if !within_parse_budget(markup) {
        debug!(bytes = markup.len(), "Markup over parse budget; skipping full-text strategy");
        return None;
    }

    let config = Config {
        max_elements_to_parse: MAX_ELEMENTS_TO_PARSE,
        ..Default::default()
    };
    let mut readability = Readability::new(markup, None, Some(config)).ok()?;
    let article = readability.parse().ok()?;
    let text = article.text_content.trim().to_string();

    longer_than(&text, FULL_TEXT_MIN_CHARS).then_some(ArticleResult { title: None, text })
}

/// Reader-mode DOM simplification, flattened to line-separated text.
pub fn readability_document(markup: &str) -> Option<ArticleResult> {
    if !within_parse_budget(markup) {
        debug!(bytes = markup.len(), "Markup over parse budget; skipping readability strategy");
        return None;
    }

    let base = Url::parse(PLACEHOLDER_BASE).ok()?;
    let mut cursor = Cursor::new(markup.as_bytes());
    let product = readability::extractor::extract(&mut cursor, &base).ok()?;

    let text = strip_tags(&product.content, "\n");
    if !longer_than(&text, READABILITY_MIN_CHARS) {
        return None;
    }

    Some(ArticleResult {
        title: non_empty_title(&product.title),
        text,
    })
}

/// The longest block-level element whose class does not look like chrome.
pub fn largest_block(markup: &str) -> Option<ArticleResult> {
    let document = Html::parse_document(markup);

    let best = document
        .select(&BLOCKS)
        .take(BLOCK_SCAN_LIMIT)
        .filter(|block| {
            let classes = block.value().classes().collect::<Vec<_>>().join(" ");
            !NOISE_CLASSES.is_match(&classes)
        })
        .map(|block| visible_text(block, "\n").trim().to_string())
        .fold(String::new(), |best, text| {
            if char_len(&text) > char_len(&best) { text } else { best }
        });

    longer_than(&best, BLOCK_MIN_CHARS).then(|| ArticleResult {
        title: page_title(&document),
        text: best,
    })
}

/// All visible page text, cut to the first 5000 characters.
pub fn whole_page(markup: &str) -> Option<ArticleResult> {
    let document = Html::parse_document(markup);
    let text = visible_text(document.root_element(), "\n");

    Some(ArticleResult {
        title: page_title(&document),
        text: take_chars(text.trim(), WHOLE_PAGE_MAX_CHARS),
    })
}
