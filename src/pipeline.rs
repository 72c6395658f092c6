// src/pipeline.rs
//! Ranking: score every article, drop near-duplicates, sort by total and
//! group by priority bucket.

use crate::article::{attach_signals, Article};
use crate::config::Config;
use crate::dedup::deduplicate_by;
use crate::scoring::{PriorityBucket, ScoreBreakdown, Scorer};
use crate::social::{distinct_urls, fetch_social_metrics, DynSignalProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub scores: ScoreBreakdown,
    pub bucket: PriorityBucket,
}

/// Ordered output of one ranking run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RankedReport {
    /// Sorted by total, descending; ties keep input order.
    pub items: Vec<ScoredArticle>,
    /// Articles dropped as near-duplicates.
    pub duplicates_removed: usize,
    pub input_count: usize,
}

impl RankedReport {
    /// Items of one bucket in ranked order.
    pub fn bucket(&self, bucket: PriorityBucket) -> impl Iterator<Item = &ScoredArticle> {
        self.items.iter().filter(move |s| s.bucket == bucket)
    }

    /// Non-empty buckets in presentation order.
    pub fn by_bucket(&self) -> Vec<(PriorityBucket, Vec<&ScoredArticle>)> {
        PriorityBucket::ALL
            .iter()
            .map(|&b| (b, self.bucket(b).collect::<Vec<_>>()))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }

    /// Counts for every bucket, zeros included, in presentation order.
    pub fn bucket_counts(&self) -> Vec<(PriorityBucket, usize)> {
        PriorityBucket::ALL
            .iter()
            .map(|&b| (b, self.bucket(b).count()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Rank articles whose social signals are already attached (or absent).
pub fn rank(articles: Vec<Article>, config: &Config, now: DateTime<Utc>) -> RankedReport {
    let input_count = articles.len();
    let scorer = Scorer::new(config, now);

    let scored: Vec<ScoredArticle> = articles
        .into_iter()
        .map(|article| {
            let scores = scorer.score(&article);
            let bucket = scorer.bucket(&article, &scores);
            ScoredArticle {
                article,
                scores,
                bucket,
            }
        })
        .collect();

    let (mut items, duplicates_removed) =
        deduplicate_by(scored, |s| s.article.title.as_str(), |s| s.scores.total);

    // sort_by is stable
    items.sort_by(|a, b| b.scores.total.total_cmp(&a.scores.total));

    tracing::info!(
        input = input_count,
        kept = items.len(),
        duplicates_removed,
        "ranked articles"
    );

    RankedReport {
        items,
        duplicates_removed,
        input_count,
    }
}

/// Fetch social signals for every distinct URL, attach them, then rank.
/// Skips the fan-out when social lookups are disabled in `config`.
pub async fn rank_with_social(
    mut articles: Vec<Article>,
    config: &Config,
    providers: &[DynSignalProvider],
    now: DateTime<Utc>,
) -> RankedReport {
    if config.social.enabled && !providers.is_empty() {
        let urls = distinct_urls(&articles);
        let metrics = fetch_social_metrics(providers, urls, config.social.workers).await;
        attach_signals(&mut articles, &metrics);
    }
    rank(articles, config, now)
}
