//! Tag stripping and whitespace helpers shared by the extractors.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid title selector"));

/// Elements whose text content is never part of the readable page.
const HIDDEN_CONTAINERS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Join the text nodes under `element` with `separator`.
///
/// Text inside scripts, styles and templates is skipped.
pub fn visible_text(element: ElementRef<'_>, separator: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .any(|e| HIDDEN_CONTAINERS.contains(&e.name()));
        if !hidden {
            parts.push(&text.text);
        }
    }
    parts.join(separator)
}

/// Parse an HTML fragment and return its visible text, trimmed.
pub fn strip_tags(html: &str, separator: &str) -> String {
    let fragment = Html::parse_fragment(html);
    visible_text(fragment.root_element(), separator).trim().to_string()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// The trimmed `<title>` of a document, if present and non-empty.
pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Length of `text` in characters.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The first `max` characters of `text`.
pub fn take_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
