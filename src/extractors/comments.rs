//! Reader comment extraction.
//!
//! Comments are found with structural and lexical heuristics rather than
//! per-platform markup knowledge:
//!
//! 1. **Keyword nodes**: elements whose `id` or `class` mentions comments,
//!    replies, threads and the like. Every nested block inside them is a candidate.
//! 2. **Generic selectors**: elements matching common comment CSS classes.
//! 3. **Cleaning**: button labels and bylines ("reply", "like", "posted by"…)
//!    are removed and whitespace is collapsed.
//! 4. **Filtering**: a comment needs at least four words and some sentence
//!    punctuation.
//! 5. **Dedup and cap**: first-seen order, exact-match dedup, at most 50.
//!
//! Keyword-node candidates always precede generic-selector candidates, so when
//! both passes see the same comment the keyword-node copy is the one kept.

use super::text::{char_len, collapse_whitespace, visible_text};
use crate::models::{CandidateOrigin, CommentCandidate};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

/// Upper bound on comments returned by [`extract_comments`].
pub const MAX_COMMENTS: usize = 50;

/// Candidates must be strictly longer than this many characters.
const MIN_CANDIDATE_CHARS: usize = 20;
/// Candidates must be strictly shorter than this many characters.
const MAX_CANDIDATE_CHARS: usize = 2000;
const MIN_TOKENS: usize = 4;

static COMMENT_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(comment|reply|discussion|thread|responses|comments-list|feedback|disqus)")
        .expect("valid comment keyword regex")
});
static NOISE_PHRASES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(reply|share|expand full comment|liked by|like|report|posted by|author)\b")
        .expect("valid noise phrase regex")
});
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]").expect("valid punctuation regex"));

static ATTRIBUTED: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[id], [class]").expect("valid attribute selector"));
static NESTED_BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div, li, article, section").expect("valid block selector"));
static GENERIC_COMMENTS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".comment, .comment-body, li.comment, div.reply, .comment-entry")
        .expect("valid comment selector")
});

/// Extract cleaned, deduplicated comments from raw markup.
pub fn extract_comments(markup: &str) -> Vec<String> {
    let document = Html::parse_document(markup);
    let candidates = collect_candidates(&document);

    let comments: Vec<String> = candidates
        .iter()
        .map(|c| clean_candidate(&c.text))
        .filter(|c| is_comment_like(c))
        .unique()
        .take(MAX_COMMENTS)
        .collect();

    debug!(
        candidates = candidates.len(),
        comments = comments.len(),
        "Extracted comments"
    );
    comments
}

/// Harvest raw comment candidates, keyword nodes first.
pub fn collect_candidates(document: &Html) -> Vec<CommentCandidate> {
    let mut candidates = Vec::new();

    let keyword_nodes = document.select(&ATTRIBUTED).filter(|el| {
        let element = el.value();
        let id_match = element.id().is_some_and(|id| COMMENT_KEYWORDS.is_match(id));
        let class_match = || {
            let classes = element.classes().collect::<Vec<_>>().join(" ");
            COMMENT_KEYWORDS.is_match(&classes)
        };
        id_match || class_match()
    });

    for node in keyword_nodes {
        for child in node.select(&NESTED_BLOCKS) {
            push_candidate(&mut candidates, visible_text(child, " "), CandidateOrigin::KeywordNode);
        }
    }
    let keyword_count = candidates.len();

    for element in document.select(&GENERIC_COMMENTS) {
        push_candidate(&mut candidates, visible_text(element, " "), CandidateOrigin::GenericSelector);
    }

    debug!(
        keyword_node = keyword_count,
        generic_selector = candidates.len() - keyword_count,
        "Collected comment candidates"
    );
    candidates
}

fn push_candidate(candidates: &mut Vec<CommentCandidate>, raw: String, origin: CandidateOrigin) {
    let text = raw.trim();
    let chars = char_len(text);
    if chars > MIN_CANDIDATE_CHARS && chars < MAX_CANDIDATE_CHARS {
        candidates.push(CommentCandidate {
            text: text.to_string(),
            chars,
            origin,
        });
    }
}

/// Remove button labels and bylines, then normalize whitespace.
pub fn clean_candidate(text: &str) -> String {
    collapse_whitespace(&NOISE_PHRASES.replace_all(text, ""))
}

/// Whether cleaned text still reads like a sentence from a person.
pub fn is_comment_like(text: &str) -> bool {
    let chars = char_len(text);
    text.split_whitespace().count() >= MIN_TOKENS
        && SENTENCE_END.is_match(text)
        && (MIN_CANDIDATE_CHARS..=MAX_CANDIDATE_CHARS).contains(&chars)
}
