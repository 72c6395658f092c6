// src/social/mod.rs
pub mod hackernews;
pub mod hatena;

use crate::article::{Article, SignalCount, SignalSource, SocialMetrics};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub use hackernews::HackerNewsProvider;
pub use hatena::HatenaProvider;

/// Default fan-out width.
pub const DEFAULT_WORKERS: usize = 10;

/// One external counter keyed by article URL.
#[async_trait::async_trait]
pub trait SignalProvider: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<SignalCount>;
    fn source(&self) -> SignalSource;
}

pub type DynSignalProvider = Arc<dyn SignalProvider>;

/// The two production providers with a shared per-call timeout.
pub fn default_providers(timeout: Duration) -> Vec<DynSignalProvider> {
    vec![
        Arc::new(HatenaProvider::new().with_timeout(timeout)),
        Arc::new(HackerNewsProvider::new().with_timeout(timeout)),
    ]
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("social_lookups_total", "Social signal lookups attempted.");
        describe_counter!(
            "social_lookup_errors_total",
            "Social signal lookups that failed and were counted as zero."
        );
    });
}

/// Distinct non-empty URLs in first-seen order.
pub fn distinct_urls(articles: &[Article]) -> Vec<String> {
    let mut seen = HashSet::new();
    articles
        .iter()
        .filter_map(|a| a.link())
        .filter(|u| seen.insert(u.to_string()))
        .map(str::to_string)
        .collect()
}

/// Query every provider for one URL. A failing provider yields a zero count.
async fn lookup_all(providers: &[DynSignalProvider], url: &str) -> Vec<SignalCount> {
    let mut out = Vec::with_capacity(providers.len());
    for p in providers {
        counter!("social_lookups_total").increment(1);
        match p.lookup(url).await {
            Ok(c) => out.push(c),
            Err(e) => {
                tracing::warn!(target: "social", error = ?e, provider = %p.source(), url, "lookup failed");
                counter!("social_lookup_errors_total").increment(1);
                out.push(SignalCount::zero(p.source()));
            }
        }
    }
    out
}

/// Fetch signals for all `urls` with at most `width` URLs in flight.
/// Never fails; completion order is irrelevant since results are keyed by URL.
pub async fn fetch_social_metrics(
    providers: &[DynSignalProvider],
    urls: Vec<String>,
    width: usize,
) -> SocialMetrics {
    ensure_metrics_described();
    if providers.is_empty() || urls.is_empty() {
        return SocialMetrics::new();
    }

    tracing::info!(target: "social", urls = urls.len(), width, "fetching social metrics");

    let metrics: SocialMetrics = stream::iter(urls)
        .map(|url| async move {
            let counts = lookup_all(providers, &url).await;
            (url, counts)
        })
        .buffer_unordered(width.max(1))
        .collect()
        .await;

    for source in SignalSource::ALL {
        let total: u64 = metrics
            .values()
            .flatten()
            .filter(|c| c.source == source)
            .map(|c| c.count)
            .sum();
        tracing::info!(target: "social", %source, total, "social metrics collected");
    }
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        source: SignalSource,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SignalProvider for Fixed {
        async fn lookup(&self, url: &str) -> Result<SignalCount> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.contains("broken") {
                return Err(anyhow!("boom"));
            }
            Ok(SignalCount {
                source: self.source,
                count: url.len() as u64,
                item_id: None,
            })
        }
        fn source(&self) -> SignalSource {
            self.source
        }
    }

    #[tokio::test]
    async fn failures_become_zero_and_others_survive() {
        let p: DynSignalProvider = Arc::new(Fixed {
            source: SignalSource::Hatena,
            calls: AtomicUsize::new(0),
        });
        let urls = vec!["https://ok.example/a".to_string(), "https://broken.example/".to_string()];
        let m = fetch_social_metrics(&[p], urls, 2).await;
        assert_eq!(m.len(), 2);
        assert_eq!(m["https://ok.example/a"][0].count, 20);
        assert_eq!(m["https://broken.example/"][0], SignalCount::zero(SignalSource::Hatena));
    }

    #[tokio::test]
    async fn each_distinct_url_is_looked_up_once() {
        let fixed = Arc::new(Fixed {
            source: SignalSource::HackerNews,
            calls: AtomicUsize::new(0),
        });
        let arts = vec![
            Article {
                url: Some("https://a.example/".into()),
                ..Article::new("1")
            },
            Article {
                url: Some("https://a.example/".into()),
                ..Article::new("2")
            },
            Article::new("no url"),
        ];
        let urls = distinct_urls(&arts);
        assert_eq!(urls, vec!["https://a.example/"]);
        let p: DynSignalProvider = fixed.clone();
        let _ = fetch_social_metrics(&[p], urls, 10).await;
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_providers_no_work() {
        let m = fetch_social_metrics(&[], vec!["https://x/".into()], 4).await;
        assert!(m.is_empty());
    }
}
