//! Comment sentiment scoring with the VADER lexicon.
//!
//! VADER produces a compound polarity in `[-1, 1]`; it is bucketed into three
//! labels with the conventional ±0.05 thresholds.

use crate::models::ScoredComment;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use vader_sentiment::SentimentIntensityAnalyzer;

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

static ANALYZER: Lazy<SentimentIntensityAnalyzer<'static>> = Lazy::new(SentimentIntensityAnalyzer::new);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        };
        f.write_str(label)
    }
}

/// Bucket a compound polarity score.
pub fn classify_compound(compound: f64) -> Sentiment {
    if compound >= POSITIVE_THRESHOLD {
        Sentiment::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Compound polarity of `text`.
pub fn compound_score(text: &str) -> f64 {
    ANALYZER
        .polarity_scores(text)
        .get("compound")
        .copied()
        .unwrap_or(0.0)
}

/// Sentiment label of `text`.
pub fn score(text: &str) -> Sentiment {
    classify_compound(compound_score(text))
}

/// Score every comment, keeping order.
pub fn score_comments(comments: &[String]) -> Vec<ScoredComment> {
    comments
        .iter()
        .map(|c| ScoredComment {
            content: c.clone(),
            sentiment: score(c),
        })
        .collect()
}
