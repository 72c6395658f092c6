// src/scoring/priority.rs
//! Priority buckets derived from the total score, with paywall override.

use crate::config::Thresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityBucket {
    MustRead,
    ShouldRead,
    Optional,
    Skip,
    Paywalled,
}

impl PriorityBucket {
    /// Presentation order.
    pub const ALL: [PriorityBucket; 5] = [
        PriorityBucket::MustRead,
        PriorityBucket::ShouldRead,
        PriorityBucket::Optional,
        PriorityBucket::Skip,
        PriorityBucket::Paywalled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PriorityBucket::MustRead => "MUST READ",
            PriorityBucket::ShouldRead => "SHOULD READ",
            PriorityBucket::Optional => "OPTIONAL",
            PriorityBucket::Skip => "SKIP",
            PriorityBucket::Paywalled => "PAYWALLED",
        }
    }
}

impl fmt::Display for PriorityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score-only bucketing; thresholds are inclusive lower bounds.
pub fn categorize(total: f64, t: &Thresholds) -> PriorityBucket {
    if total >= t.must_read {
        PriorityBucket::MustRead
    } else if total >= t.should_read {
        PriorityBucket::ShouldRead
    } else if total >= t.optional {
        PriorityBucket::Optional
    } else {
        PriorityBucket::Skip
    }
}

/// Lowercased host of `url`, or empty if it does not parse.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

/// True if the URL's host contains any configured paywall fragment.
pub fn is_paywalled(url: Option<&str>, paywalled_domains: &[String]) -> bool {
    let Some(url) = url else { return false };
    let domain = domain_of(url);
    if domain.is_empty() {
        return false;
    }
    paywalled_domains.iter().any(|pd| {
        let pd = pd.trim().to_ascii_lowercase();
        !pd.is_empty() && domain.contains(&pd)
    })
}

/// Bucket for an item: paywall wins over any score.
pub fn assign_bucket(
    total: f64,
    url: Option<&str>,
    thresholds: &Thresholds,
    paywalled_domains: &[String],
) -> PriorityBucket {
    if is_paywalled(url, paywalled_domains) {
        PriorityBucket::Paywalled
    } else {
        categorize(total, thresholds)
    }
}
