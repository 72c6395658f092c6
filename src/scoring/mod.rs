// src/scoring/mod.rs
//! Article scoring: four component scores in [0,100] combined by a weighted
//! sum into a total in [0,100], then bucketed.
//!
//! Components:
//! - `engagement`   : feed engagement rate + social signals
//! - `relevance`    : keyword / synonym matches in title and body
//! - `freshness`    : hours since publication
//! - `source_trust` : configured publisher trust

pub mod engagement;
pub mod freshness;
pub mod matcher;
pub mod priority;
pub mod relevance;
pub mod synonyms;
pub mod trust;

use crate::article::Article;
use crate::config::{Config, Weights};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use engagement::{engagement_score, EngagementBreakdown, SignalScore};
pub use freshness::freshness_score;
pub use matcher::{is_word_match, KeywordMatcher, MatchText, MatcherCache};
pub use priority::{assign_bucket, categorize, is_paywalled, PriorityBucket};
pub use relevance::{merge_keywords, score_relevance, Relevance};
pub use synonyms::{expand_with_synonyms, MatchSet};
pub use trust::source_trust_score;

/// Per-article scores. Components and total are rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub engagement: f64,
    pub relevance: f64,
    pub freshness: f64,
    pub source_trust: f64,
    pub total: f64,
    pub matched_keywords: Vec<String>,
    pub engagement_detail: EngagementBreakdown,
}

/// The four component scores before weighting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Components {
    pub engagement: f64,
    pub relevance: f64,
    pub freshness: f64,
    pub source_trust: f64,
}

/// Weighted sum, clamped to [0,100].
pub fn weighted_total(c: &Components, w: &Weights) -> f64 {
    let raw = c.engagement * w.engagement
        + c.relevance * w.relevance
        + c.freshness * w.freshness
        + c.source_trust * w.source_trust;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 100.0)
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Scores articles against one configuration snapshot and one "now".
pub struct Scorer<'a> {
    config: &'a Config,
    matchers: MatcherCache,
    now: DateTime<Utc>,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a Config, now: DateTime<Utc>) -> Self {
        let known = config
            .global_keywords
            .iter()
            .chain(config.categories.iter().flat_map(|c| c.keywords.iter()))
            .chain(config.synonym_groups.iter().flatten())
            .map(String::as_str);
        Self {
            config,
            matchers: MatcherCache::new(known),
            now,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn score(&self, article: &Article) -> ScoreBreakdown {
        let (engagement, detail) = engagement_score(article.engagement_rate, &article.signals);

        let keywords = merge_keywords(&article.keywords, &self.config.global_keywords);
        let sets = expand_with_synonyms(&keywords, &self.config.synonym_groups);
        let rel = score_relevance(&article.title, article.body.as_deref(), &sets, &self.matchers);

        let components = Components {
            engagement,
            relevance: rel.score,
            freshness: freshness_score(article.published, self.now),
            source_trust: source_trust_score(article.source.as_deref(), &self.config.trusted_sources),
        };
        let total = weighted_total(&components, &self.config.scoring.weights);

        ScoreBreakdown {
            engagement: round1(components.engagement),
            relevance: round1(components.relevance),
            freshness: round1(components.freshness),
            source_trust: round1(components.source_trust),
            total: round1(total),
            matched_keywords: rel.matched,
            engagement_detail: EngagementBreakdown {
                feed: round1(detail.feed),
                signals: detail.signals,
            },
        }
    }

    pub fn bucket(&self, article: &Article, scores: &ScoreBreakdown) -> PriorityBucket {
        assign_bucket(
            scores.total,
            article.link(),
            &self.config.scoring.thresholds,
            &self.config.paywalled_domains,
        )
    }
}
