// src/scoring/relevance.rs
//! Keyword relevance: match-sets against title and body, title weighted double.

use super::matcher::{MatchText, MatcherCache};
use super::synonyms::MatchSet;
use tracing::info;

/// Score when no keywords are configured at all ("can't judge").
pub const NEUTRAL_RELEVANCE: f64 = 50.0;
/// Floor awarded as soon as one match-set hits.
pub const BASE_RELEVANCE: f64 = 30.0;
/// Maximum bonus on top of the base, scaled by the weighted match ratio.
pub const MATCH_BONUS: f64 = 70.0;

const TITLE_WEIGHT: usize = 2;
const BODY_WEIGHT: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Relevance {
    pub score: f64,
    /// Matched keywords in discovery order, no repeats.
    pub matched: Vec<String>,
}

impl Relevance {
    fn neutral() -> Self {
        Self {
            score: NEUTRAL_RELEVANCE,
            matched: Vec::new(),
        }
    }
}

/// Ordered, case-insensitive union of item-local and global keywords.
pub fn merge_keywords(local: &[String], global: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(local.len() + global.len());
    for kw in local.iter().chain(global) {
        let t = kw.trim();
        if t.is_empty() {
            continue;
        }
        let lower = t.to_lowercase();
        if !out.iter().any(|o| o.to_lowercase() == lower) {
            out.push(t.to_string());
        }
    }
    out
}

/// Score `title`/`body` against `sets`.
///
/// * no sets → 50, nothing matched
/// * sets but no hit → 0
/// * otherwise → 30 + (2·title_hits + body_hits) / (3·sets) × 70, capped at 100
///
/// A set counts at most once per field no matter how many of its synonyms hit.
pub fn score_relevance(
    title: &str,
    body: Option<&str>,
    sets: &[MatchSet],
    matchers: &MatcherCache,
) -> Relevance {
    if sets.is_empty() {
        return Relevance::neutral();
    }

    let title_text = MatchText::new(title);
    let body_text = MatchText::new(body.unwrap_or_default());

    let mut title_hits = 0usize;
    let mut body_hits = 0usize;
    let mut matched: Vec<String> = Vec::new();

    for set in sets {
        let mut in_title: Option<&str> = None;
        let mut in_body: Option<&str> = None;

        for term in set.terms() {
            let m = matchers.get(term);
            if in_title.is_none() && m.is_match(&title_text) {
                in_title = Some(term);
            }
            if in_body.is_none() && !body_text.is_empty() && m.is_match(&body_text) {
                in_body = Some(term);
            }
            if in_title.is_some() && in_body.is_some() {
                break;
            }
        }

        if let Some(t) = in_title {
            title_hits += 1;
            if !matched.iter().any(|m| m == t) {
                matched.push(t.to_string());
            }
        }
        if let Some(b) = in_body {
            body_hits += 1;
            if !matched.iter().any(|m| m == b) {
                matched.push(b.to_string());
            }
        }
    }

    let weighted = title_hits * TITLE_WEIGHT + body_hits * BODY_WEIGHT;
    if weighted == 0 {
        dev_log_relevance(title, &[], 0.0);
        return Relevance {
            score: 0.0,
            matched: Vec::new(),
        };
    }

    let max_possible = sets.len() * (TITLE_WEIGHT + BODY_WEIGHT);
    let ratio = weighted as f64 / max_possible as f64;
    let score = (BASE_RELEVANCE + ratio * MATCH_BONUS).min(100.0);
    dev_log_relevance(title, &matched, score);
    Relevance { score, matched }
}

// Dev logging gate: SCORE_DEV_LOG=1
pub(crate) fn dev_logging_enabled() -> bool {
    std::env::var("SCORE_DEV_LOG").ok().as_deref() == Some("1")
}

/// Short, stable id for a piece of text so logs never carry raw titles.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn dev_log_relevance(title: &str, matched: &[String], score: f64) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(title);
    let matched_short: Vec<&str> = matched.iter().take(5).map(String::as_str).collect();
    info!(target: "relevance", %id, %score, matched = ?matched_short);
}
