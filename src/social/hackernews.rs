use super::SignalProvider;
use crate::article::{SignalCount, SignalSource};
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const HN_SEARCH_BASE: &str = "https://hn.algolia.com";
const ITEM_PAGE: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(default)]
    points: Option<u64>,
    #[serde(rename = "objectID", default)]
    object_id: Option<String>,
}

/// Hacker News points via the Algolia search API, restricted to URL matches.
#[derive(Clone)]
pub struct HackerNewsProvider {
    base: String,
    client: Client,
    timeout: Duration,
}

impl Default for HackerNewsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HackerNewsProvider {
    pub fn new() -> Self {
        Self {
            base: HN_SEARCH_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn item_url(id: &str) -> String {
    format!("{ITEM_PAGE}{id}")
}

#[async_trait::async_trait]
impl SignalProvider for HackerNewsProvider {
    async fn lookup(&self, url: &str) -> Result<SignalCount> {
        let rsp = self
            .client
            .get(format!("{}/api/v1/search", self.base))
            .query(&[
                ("query", url),
                ("restrictSearchableAttributes", "url"),
                ("hitsPerPage", "1"),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .context("hn request")?;

        if !rsp.status().is_success() {
            return Err(anyhow!("hn HTTP {}", rsp.status()));
        }
        let body: SearchResponse = rsp.json().await.context("hn json")?;

        let (count, item_id) = match body.hits.into_iter().next() {
            Some(hit) => (hit.points.unwrap_or(0), hit.object_id.filter(|s| !s.is_empty())),
            None => (0, None),
        };
        Ok(SignalCount {
            source: SignalSource::HackerNews,
            count,
            item_id,
        })
    }

    fn source(&self) -> SignalSource {
        SignalSource::HackerNews
    }
}
