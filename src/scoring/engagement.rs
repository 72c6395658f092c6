// src/scoring/engagement.rs
//! Engagement: feed-supplied engagement rate plus capped social signals.

use crate::article::{SignalCount, SignalSource};
use serde::Serialize;

pub const FEED_RATE_MULTIPLIER: f64 = 5.0;
pub const FEED_RATE_CEILING: f64 = 50.0;

/// One signal's raw count and its capped contribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalScore {
    pub source: SignalSource,
    pub count: u64,
    pub points: f64,
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementBreakdown {
    /// Capped contribution of the feed's own engagement rate.
    pub feed: f64,
    /// One entry per known signal source, present even when the count is 0.
    pub signals: Vec<SignalScore>,
}

impl EngagementBreakdown {
    pub fn signal(&self, source: SignalSource) -> Option<&SignalScore> {
        self.signals.iter().find(|s| s.source == source)
    }
}

/// Returns the engagement score (0..=100) and its breakdown.
pub fn engagement_score(rate: f64, signals: &[SignalCount]) -> (f64, EngagementBreakdown) {
    let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
    let feed = (rate * FEED_RATE_MULTIPLIER).min(FEED_RATE_CEILING);

    let per_signal: Vec<SignalScore> = SignalSource::ALL
        .iter()
        .map(|&source| {
            let found = signals.iter().find(|s| s.source == source);
            let count = found.map(|s| s.count).unwrap_or(0);
            SignalScore {
                source,
                count,
                points: (count as f64 * source.multiplier()).min(source.ceiling()),
                item_id: found.and_then(|s| s.item_id.clone()),
            }
        })
        .collect();

    let total = (feed + per_signal.iter().map(|s| s.points).sum::<f64>()).min(100.0);
    (
        total,
        EngagementBreakdown {
            feed,
            signals: per_signal,
        },
    )
}
