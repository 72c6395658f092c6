use super::SignalProvider;
use crate::article::{SignalCount, SignalSource};
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;

pub const HATENA_API_BASE: &str = "https://bookmark.hatenaapis.com";
const ENTRY_PAGE_BASE: &str = "https://b.hatena.ne.jp/entry";

/// Hatena Bookmark count API. The response body is a bare integer.
#[derive(Clone)]
pub struct HatenaProvider {
    base: String,
    client: Client,
    timeout: Duration,
}

impl Default for HatenaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HatenaProvider {
    pub fn new() -> Self {
        Self {
            base: HATENA_API_BASE.to_string(),
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

/// Body of the count endpoint as a number; anything but digits is 0.
pub fn parse_count(body: &str) -> u64 {
    let t = body.trim();
    if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) {
        t.parse().unwrap_or(0)
    } else {
        0
    }
}

/// Hatena entry page for an article URL.
pub fn entry_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("{ENTRY_PAGE_BASE}/s/{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("{ENTRY_PAGE_BASE}/{rest}")
    } else {
        format!("{ENTRY_PAGE_BASE}/{url}")
    }
}

#[async_trait::async_trait]
impl SignalProvider for HatenaProvider {
    async fn lookup(&self, url: &str) -> Result<SignalCount> {
        let rsp = self
            .client
            .get(format!("{}/count/entry", self.base))
            .query(&[("url", url)])
            .timeout(self.timeout)
            .send()
            .await
            .context("hatena request")?;

        if !rsp.status().is_success() {
            return Err(anyhow!("hatena HTTP {}", rsp.status()));
        }
        let body = rsp.text().await.context("hatena body")?;
        Ok(SignalCount {
            source: SignalSource::Hatena,
            count: parse_count(&body),
            item_id: None,
        })
    }

    fn source(&self) -> SignalSource {
        SignalSource::Hatena
    }
}
