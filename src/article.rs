// src/article.rs
//! Canonical article shape used by the scoring pipeline, plus the social
//! signal counts attached to it before scoring.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// External signal sources that contribute to the engagement score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Hatena,
    HackerNews,
}

impl SignalSource {
    pub const ALL: [SignalSource; 2] = [SignalSource::Hatena, SignalSource::HackerNews];

    /// Points awarded per unit of raw count.
    pub fn multiplier(self) -> f64 {
        match self {
            SignalSource::Hatena => 2.0,
            SignalSource::HackerNews => 0.5,
        }
    }

    /// Upper bound of this signal's engagement contribution.
    pub fn ceiling(self) -> f64 {
        match self {
            SignalSource::Hatena => 40.0,
            SignalSource::HackerNews => 40.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalSource::Hatena => "hatena",
            SignalSource::HackerNews => "hn",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One raw count from one signal source. `item_id` is only known for sources
/// that expose a permalink id (Hacker News).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCount {
    pub source: SignalSource,
    pub count: u64,
    #[serde(default)]
    pub item_id: Option<String>,
}

impl SignalCount {
    pub fn zero(source: SignalSource) -> Self {
        Self {
            source,
            count: 0,
            item_id: None,
        }
    }
}

/// Signals collected per URL by the social fan-out.
pub type SocialMetrics = HashMap<String, Vec<SignalCount>>;

/// An article as the pipeline sees it. Built once from whichever input format
/// was loaded; never mutated by scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Epoch seconds or milliseconds; `None`/0 means unknown.
    #[serde(default)]
    pub published: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub engagement_rate: f64,
    /// Item-local keywords (from the article's category).
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub signals: Vec<SignalCount>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// URL if present and non-empty.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    pub fn signal(&self, source: SignalSource) -> Option<&SignalCount> {
        self.signals.iter().find(|s| s.source == source)
    }
}

/// Attach fetched signals to every article whose URL has an entry.
/// Articles without a URL or without a lookup result keep their signals.
pub fn attach_signals(articles: &mut [Article], metrics: &SocialMetrics) {
    for a in articles.iter_mut() {
        let Some(url) = a.link() else { continue };
        if let Some(found) = metrics.get(url) {
            a.signals = found.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_only_matching_urls() {
        let mut arts = vec![
            Article {
                url: Some("https://a.example/1".into()),
                ..Article::new("one")
            },
            Article::new("no url"),
        ];
        let mut m = SocialMetrics::new();
        m.insert(
            "https://a.example/1".into(),
            vec![SignalCount {
                source: SignalSource::Hatena,
                count: 7,
                item_id: None,
            }],
        );
        attach_signals(&mut arts, &m);
        assert_eq!(arts[0].signal(SignalSource::Hatena).map(|s| s.count), Some(7));
        assert!(arts[1].signals.is_empty());
    }

    #[test]
    fn blank_url_is_not_a_link() {
        let a = Article {
            url: Some("  ".into()),
            ..Article::new("x")
        };
        assert!(a.link().is_none());
    }
}
