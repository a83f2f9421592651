//! Word cloud and sentiment pie chart rendering.
//!
//! Both charts are written as standalone SVG files so they can be served as
//! static assets without any image toolchain. The data preparation
//! ([`word_frequencies`], [`sentiment_counts`]) is separate from drawing and
//! is what the tests pin down.

use crate::models::ScoredComment;
use crate::sentiment::Sentiment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::f64::consts::PI;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Word cloud asset path, relative to the static directory.
pub const WORDCLOUD_PATH: &str = "img/wordcloud.svg";
/// Pie chart asset path, relative to the static directory.
pub const PIE_CHART_PATH: &str = "img/plot.svg";

const CLOUD_WIDTH: f64 = 1000.0;
const CLOUD_HEIGHT: f64 = 600.0;
const CLOUD_MAX_WORDS: usize = 100;
const MIN_FONT: f64 = 14.0;
const MAX_FONT: f64 = 72.0;

const PIE_SIZE: f64 = 600.0;
const PIE_RADIUS: f64 = 220.0;

/// Sampled from matplotlib's viridis, dark to light.
const VIRIDIS: [&str; 8] = [
    "#440154", "#46327e", "#365c8d", "#277f8e", "#1fa187", "#4ac16d", "#a0da39", "#fde725",
];
const PIE_COLORS: [&str; 3] = ["#1f77b4", "#ff7f0e", "#2ca02c"];

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z']+").expect("valid word regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "if", "then", "of", "to", "in", "on", "for", "with", "as", "by",
        "is", "are", "was", "were", "be", "been", "being", "that", "this", "it", "its", "at", "from", "into",
        "over", "under", "about", "after", "before", "between", "during", "without", "within", "than",
        "not", "no", "yes", "more", "most", "less", "very", "much", "many", "some", "any", "such",
        "you", "your", "we", "our", "they", "their", "them", "he", "she", "his", "her", "i", "me", "my",
        "can", "will", "would", "should", "could", "may", "might", "do", "does", "did", "have", "has", "had",
        "what", "which", "who", "when", "where", "why", "how", "all", "also", "just", "so", "there", "here",
        "these", "those", "one", "out", "up", "get", "like", "make", "even", "only", "other", "each",
    ]
    .into_iter()
    .collect()
});

/// The most frequent non-stopword words of `text`, most frequent first.
///
/// Words are lower-cased and must have at least three letters. Ties are
/// broken alphabetically so the output is stable.
pub fn word_frequencies(text: &str, max_words: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in WORD.find_iter(text) {
        let word = m.as_str().trim_matches('\'').to_lowercase();
        if word.chars().count() < 3 || STOPWORDS.contains(word.as_str()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(max_words);
    ranked
}

/// Number of comments per sentiment, in first-seen order.
pub fn sentiment_counts(comments: &[ScoredComment]) -> Vec<(Sentiment, usize)> {
    let mut counts: Vec<(Sentiment, usize)> = Vec::new();
    for comment in comments {
        match counts.iter_mut().find(|(s, _)| *s == comment.sentiment) {
            Some((_, n)) => *n += 1,
            None => counts.push((comment.sentiment, 1)),
        }
    }
    counts
}

/// Render a word cloud of `text` as SVG markup.
pub fn wordcloud_svg(text: &str) -> Result<String, Box<dyn Error>> {
    let words = word_frequencies(text, CLOUD_MAX_WORDS);
    if words.is_empty() {
        return Err("no words to draw".into());
    }
    let top = words[0].1 as f64;

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{CLOUD_WIDTH}" height="{CLOUD_HEIGHT}" viewBox="0 0 {CLOUD_WIDTH} {CLOUD_HEIGHT}">"#
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    // Row-by-row flow layout; words that no longer fit are dropped.
    let (mut x, mut y, mut row_height) = (10.0_f64, 10.0_f64, 0.0_f64);
    for (i, (word, count)) in words.iter().enumerate() {
        let size = MIN_FONT + (MAX_FONT - MIN_FONT) * (*count as f64 / top).sqrt();
        let width = size * 0.6 * word.chars().count() as f64;
        if x + width > CLOUD_WIDTH - 10.0 {
            x = 10.0;
            y += row_height + 6.0;
            row_height = 0.0;
        }
        if y + size > CLOUD_HEIGHT - 10.0 {
            break;
        }
        let color = VIRIDIS[i % VIRIDIS.len()];
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" font-family="sans-serif" font-size="{size:.1}" fill="{color}">{}</text>"#,
            y + size,
            escape_xml(word)
        )?;
        x += width + 12.0;
        row_height = row_height.max(size);
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Render the sentiment distribution of `comments` as an SVG pie chart.
pub fn pie_chart_svg(comments: &[ScoredComment]) -> Result<String, Box<dyn Error>> {
    let counts = sentiment_counts(comments);
    if counts.is_empty() {
        return Err("no comments to chart".into());
    }
    let total = comments.len() as f64;
    let (cx, cy) = (PIE_SIZE / 2.0, PIE_SIZE / 2.0 + 20.0);

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{PIE_SIZE}" height="{}" viewBox="0 0 {PIE_SIZE} {}">"#,
        PIE_SIZE + 40.0,
        PIE_SIZE + 40.0
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{cx}" y="30" text-anchor="middle" font-family="sans-serif" font-size="20">Sentiment Distribution</text>"#
    )?;

    // Matplotlib starts at 3 o'clock and runs counter-clockwise.
    let mut start = 0.0_f64;
    for (i, (sentiment, count)) in counts.iter().enumerate() {
        let fraction = *count as f64 / total;
        let end = start + fraction * 2.0 * PI;
        let color = PIE_COLORS[i % PIE_COLORS.len()];

        if counts.len() == 1 {
            writeln!(svg, r#"<circle cx="{cx}" cy="{cy}" r="{PIE_RADIUS}" fill="{color}"/>"#)?;
        } else {
            let (x0, y0) = (cx + PIE_RADIUS * start.cos(), cy - PIE_RADIUS * start.sin());
            let (x1, y1) = (cx + PIE_RADIUS * end.cos(), cy - PIE_RADIUS * end.sin());
            let large_arc = u8::from(fraction > 0.5);
            writeln!(
                svg,
                r#"<path d="M {cx} {cy} L {x0:.2} {y0:.2} A {PIE_RADIUS} {PIE_RADIUS} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{color}"/>"#
            )?;
        }

        let mid = (start + end) / 2.0;
        let (px, py) = (cx + PIE_RADIUS * 0.6 * mid.cos(), cy - PIE_RADIUS * 0.6 * mid.sin());
        let (lx, ly) = (cx + PIE_RADIUS * 1.1 * mid.cos(), cy - PIE_RADIUS * 1.1 * mid.sin());
        writeln!(
            svg,
            r#"<text x="{px:.1}" y="{py:.1}" text-anchor="middle" font-family="sans-serif" font-size="14">{:.1}%</text>"#,
            fraction * 100.0
        )?;
        writeln!(
            svg,
            r#"<text x="{lx:.1}" y="{ly:.1}" text-anchor="middle" font-family="sans-serif" font-size="16">{sentiment}</text>"#
        )?;
        start = end;
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Render the word cloud for `text` into `static_dir`.
///
/// Returns the path written.
#[instrument(level = "info", skip(text))]
pub async fn render_wordcloud(text: &str, static_dir: &str) -> Result<String, Box<dyn Error>> {
    let svg = wordcloud_svg(text)?;
    write_asset(static_dir, WORDCLOUD_PATH, &svg).await
}

/// Render the sentiment pie chart into `static_dir`.
///
/// Returns the path written.
#[instrument(level = "info", skip(comments), fields(comments = comments.len()))]
pub async fn render_pie_chart(comments: &[ScoredComment], static_dir: &str) -> Result<String, Box<dyn Error>> {
    let svg = pie_chart_svg(comments)?;
    write_asset(static_dir, PIE_CHART_PATH, &svg).await
}

async fn write_asset(static_dir: &str, relative: &str, contents: &str) -> Result<String, Box<dyn Error>> {
    let path = Path::new(static_dir).join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, contents).await?;
    let path = path.display().to_string();
    info!(%path, bytes = contents.len(), "Wrote chart");
    Ok(path)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(sentiments: &[Sentiment]) -> Vec<ScoredComment> {
        sentiments
            .iter()
            .enumerate()
            .map(|(i, s)| ScoredComment {
                content: format!("Comment {i}."),
                sentiment: *s,
            })
            .collect()
    }

    #[test]
    fn test_word_frequencies_filters_and_ranks() {
        let text = "Rust is fast. Rust is safe! The borrow checker keeps Rust safe and it is a tool.";
        let words = word_frequencies(text, 3);

        assert_eq!(words[0], ("rust".to_string(), 3));
        assert_eq!(words[1], ("safe".to_string(), 2));
        assert_eq!(words[2], ("borrow".to_string(), 1));
        assert!(words.iter().all(|(w, _)| !STOPWORDS.contains(w.as_str())));
    }

    #[test]
    fn test_sentiment_counts_first_seen_order() {
        let comments = scored(&[Sentiment::Negative, Sentiment::Positive, Sentiment::Negative]);
        assert_eq!(
            sentiment_counts(&comments),
            vec![(Sentiment::Negative, 2), (Sentiment::Positive, 1)]
        );
    }

    #[test]
    fn test_pie_chart_labels_percentages() {
        let comments = scored(&[Sentiment::Positive, Sentiment::Positive, Sentiment::Positive, Sentiment::Neutral]);
        let svg = pie_chart_svg(&comments).unwrap();

        assert!(svg.contains("Sentiment Distribution"));
        assert!(svg.contains(">75.0%<"));
        assert!(svg.contains(">25.0%<"));
        assert!(svg.contains(">Neutral<"));
    }

    #[test]
    fn test_pie_chart_single_slice_is_a_circle() {
        let svg = pie_chart_svg(&scored(&[Sentiment::Neutral, Sentiment::Neutral])).unwrap();
        assert!(svg.contains("<circle"));
        assert!(svg.contains(">100.0%<"));
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        assert!(pie_chart_svg(&[]).is_err());
        assert!(wordcloud_svg("a an the").is_err());
    }

    #[test]
    fn test_wordcloud_escapes_and_draws_words() {
        let svg = wordcloud_svg("Ownership ownership borrowing lifetimes").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">ownership<"));
        assert!(svg.contains(">lifetimes<"));
        assert_eq!(escape_xml("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
    }

    #[tokio::test]
    async fn test_render_writes_fixed_asset_paths() {
        let dir = tempfile::tempdir().unwrap();
        let static_dir = dir.path().to_str().unwrap();

        let cloud = render_wordcloud("Readable words for the cloud image.", static_dir).await.unwrap();
        let pie = render_pie_chart(&scored(&[Sentiment::Positive]), static_dir).await.unwrap();

        assert!(cloud.ends_with("img/wordcloud.svg"));
        assert!(pie.ends_with("img/plot.svg"));
        assert!(dir.path().join(WORDCLOUD_PATH).exists());
        assert!(dir.path().join(PIE_CHART_PATH).exists());
    }
}
