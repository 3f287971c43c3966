//! Token-set similarity search over category labels.
//!
//! Both strings are lower-cased, split on whitespace and reduced to their
//! unique tokens, so word order and repetition do not matter:
//! `"Liveness Check"` and `"check liveness"` score 100. The score is the Dice
//! overlap of the two token sets scaled to `0..=100`:
//!
//! ```text
//! score = 100 * 2 * overlap / (|query tokens| + |candidate tokens|)
//! ```
//!
//! Identical tokens count 1 towards `overlap`. When `min_token_similarity` is
//! configured, tokens that differ but whose character similarity reaches it
//! (typos such as `livenes` / `liveness`) count their similarity ratio instead,
//! each token pairing with at most one token of the other side. Without it the
//! score is plain set overlap. Either way a score of 100 means the two token
//! sets are equal.

use std::cmp::Ordering;

use serde::Serialize;
use similar::TextDiff;

use crate::{
    config::FuzzySettings,
    error::{InsightError, Result},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub label: String,
    pub score: f64,
    /// Position of the label in the candidate pool.
    pub position: usize,
}

/// Ranks `candidates` against `query` with the default settings.
pub fn search<S: AsRef<str>>(query: &str, candidates: &[S], limit: usize) -> Result<Vec<FuzzyMatch>> {
    let settings = FuzzySettings {
        limit,
        ..FuzzySettings::default()
    };
    search_with(query, candidates, &settings)
}

/// Ranks `candidates` against `query`, best first, at most `settings.limit`
/// results. Equal scores keep candidate order.
///
/// An empty (or blank) query is a caller error: the filter layer treats it as
/// "every candidate matches" and must not ask for a ranking.
pub fn search_with<S: AsRef<str>>(
    query: &str,
    candidates: &[S],
    settings: &FuzzySettings,
) -> Result<Vec<FuzzyMatch>> {
    if query.trim().is_empty() {
        return Err(InsightError::EmptyQuery);
    }
    let query_tokens = tokenize(query);
    let mut matches = candidates
        .iter()
        .enumerate()
        .map(|(position, label)| FuzzyMatch {
            label: label.as_ref().to_string(),
            score: score_tokens(&query_tokens, &tokenize(label.as_ref()), settings.min_token_similarity),
            position,
        })
        .filter(|m| settings.score_cutoff.is_none_or(|cutoff| m.score >= cutoff))
        .collect::<Vec<_>>();
    // sort_by is stable, so ties stay in pool order
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(settings.limit);
    Ok(matches)
}

/// Token-set similarity of two strings in `0..=100`.
pub fn token_set_score(left: &str, right: &str, min_token_similarity: Option<f64>) -> f64 {
    score_tokens(&tokenize(left), &tokenize(right), min_token_similarity)
}

pub fn tokenize(value: &str) -> Vec<String> {
    let lowered = value.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for token in lowered.split_whitespace() {
        if !tokens.iter().any(|seen| seen == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

fn score_tokens(left: &[String], right: &[String], min_token_similarity: Option<f64>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let exact = left.iter().filter(|token| right.contains(token)).count();
    let soft = match min_token_similarity {
        Some(threshold) => {
            let left_rest = left.iter().filter(|t| !right.contains(t)).collect::<Vec<_>>();
            let right_rest = right.iter().filter(|t| !left.contains(t)).collect::<Vec<_>>();
            soft_overlap(&left_rest, &right_rest, threshold)
        }
        None => 0.0,
    };
    let overlap = exact as f64 + soft;
    let score = 200.0 * overlap / (left.len() + right.len()) as f64;
    score.clamp(0.0, 100.0)
}

/// Greedy one-to-one pairing of leftover tokens, most similar pairs first.
/// Pair order only depends on the unordered token pair, which keeps the score
/// symmetric.
fn soft_overlap(left: &[&String], right: &[&String], min_token_similarity: f64) -> f64 {
    if left.is_empty() || right.is_empty() || min_token_similarity > 1.0 {
        return 0.0;
    }
    let mut pairs = Vec::new();
    for (li, l) in left.iter().enumerate() {
        for (ri, r) in right.iter().enumerate() {
            let ratio = char_ratio(l, r);
            if ratio >= min_token_similarity {
                pairs.push((ratio, li, ri));
            }
        }
    }
    pairs.sort_by(|a, b| {
        b.0.total_cmp(&a.0).then_with(|| {
            let key_a = unordered(left[a.1], right[a.2]);
            let key_b = unordered(left[b.1], right[b.2]);
            key_a.cmp(&key_b)
        })
    });

    let mut left_used = vec![false; left.len()];
    let mut right_used = vec![false; right.len()];
    let mut total = 0.0;
    for (ratio, li, ri) in pairs {
        if left_used[li] || right_used[ri] {
            continue;
        }
        left_used[li] = true;
        right_used[ri] = true;
        total += ratio;
    }
    total
}

fn unordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    match a.cmp(b) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    }
}

fn char_ratio(a: &str, b: &str) -> f64 {
    f64::from(TextDiff::from_chars(a, b).ratio())
}
