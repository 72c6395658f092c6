// src/ingest/feedly.rs
//! Feedly Cloud API v3 client: profile, stream paging, read markers and
//! the Read Later tag.

use super::format::{CategorizedFile, CategoryBlock, EntryRecord, FetchMetadata, UNCATEGORIZED};
use crate::config::Config;
use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const FEEDLY_API_BASE: &str = "https://api.feedly.com/v3";
/// Server-side cap for `count` and for marker batches.
pub const MAX_BATCH: usize = 1000;
pub const MAPPING_FILE_NAME: &str = "url_to_entry_id.json";

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "feedly_entries_fetched_total",
            "Entries received from Feedly stream pages."
        );
    });
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenStatus {
    Valid(Profile),
    /// HTTP 401.
    Expired,
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamQuery {
    pub count: usize,
    pub unread_only: bool,
    /// Milliseconds since epoch.
    pub newer_than: Option<i64>,
}

impl Default for StreamQuery {
    fn default() -> Self {
        Self {
            count: MAX_BATCH,
            unread_only: true,
            newer_than: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamPage {
    #[serde(default)]
    items: Vec<EntryRecord>,
    #[serde(default)]
    continuation: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkersBody<'a> {
    action: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    entry_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagBody<'a> {
    entry_ids: &'a [String],
}

/// Outcome of a batched mark-as-read; `marked` counts batches that succeeded
/// before any error.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkReadReport {
    pub marked: usize,
    pub error: Option<String>,
}

impl MarkReadReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Read the bearer token, trimmed.
pub fn load_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("token file not found: {}", path.display()))?;
    let token = raw.trim().to_string();
    if token.is_empty() {
        bail!("token file is empty: {}", path.display());
    }
    Ok(token)
}

#[derive(Clone)]
pub struct FeedlyClient {
    base: String,
    token: String,
    client: Client,
    timeout: Duration,
}

impl FeedlyClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base: FEEDLY_API_BASE.to_string(),
            token: token.into(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
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

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Probe the token against `/profile`.
    pub async fn check_token(&self) -> Result<TokenStatus> {
        let rsp = self
            .client
            .get(self.url("profile"))
            .bearer_auth(&self.token)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("feedly profile request")?;

        match rsp.status() {
            StatusCode::OK => {
                let profile: Profile = rsp.json().await.context("feedly profile json")?;
                Ok(TokenStatus::Valid(profile))
            }
            StatusCode::UNAUTHORIZED => Ok(TokenStatus::Expired),
            status => Ok(TokenStatus::Rejected {
                status: status.as_u16(),
                body: rsp.text().await.unwrap_or_default(),
            }),
        }
    }

    pub async fn profile(&self) -> Result<Profile> {
        match self.check_token().await? {
            TokenStatus::Valid(p) => Ok(p),
            TokenStatus::Expired => Err(anyhow!("feedly token expired (401)")),
            TokenStatus::Rejected { status, body } => {
                Err(anyhow!("feedly profile failed: {status} {body}"))
            }
        }
    }

    async fn stream_page(
        &self,
        stream_id: &str,
        q: &StreamQuery,
        continuation: Option<&str>,
    ) -> Result<StreamPage> {
        let mut params: Vec<(&str, String)> = vec![
            ("streamId", stream_id.to_string()),
            ("count", q.count.clamp(1, MAX_BATCH).to_string()),
            ("unreadOnly", q.unread_only.to_string()),
        ];
        if let Some(ts) = q.newer_than {
            params.push(("newerThan", ts.to_string()));
        }
        if let Some(c) = continuation {
            params.push(("continuation", c.to_string()));
        }

        let rsp = self
            .client
            .get(self.url("streams/contents"))
            .bearer_auth(&self.token)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .context("feedly stream request")?
            .error_for_status()
            .context("feedly stream status")?;
        rsp.json().await.context("feedly stream json")
    }

    /// Every page of a stream following `continuation`. A failing page ends
    /// paging; entries already received are returned.
    pub async fn stream_contents(&self, stream_id: &str, q: &StreamQuery) -> Vec<EntryRecord> {
        ensure_metrics_described();
        let mut all = Vec::new();
        let mut continuation: Option<String> = None;
        let mut page = 1usize;

        loop {
            match self.stream_page(stream_id, q, continuation.as_deref()).await {
                Ok(p) => {
                    counter!("feedly_entries_fetched_total").increment(p.items.len() as u64);
                    all.extend(p.items);
                    tracing::debug!(target: "feedly", page, total = all.len(), "stream page");
                    match p.continuation.filter(|c| !c.is_empty()) {
                        Some(c) => continuation = Some(c),
                        None => break,
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::warn!(target: "feedly", error = ?e, stream_id, page, "stream paging stopped");
                    break;
                }
            }
        }
        all
    }

    /// Fetch `global.all` and group entries by their first category label.
    pub async fn fetch_global_all(&self, config: &Config, include_read: bool) -> Result<CategorizedFile> {
        let profile = self.profile().await?;
        let stream_id = format!("user/{}/category/global.all", profile.id);
        let unread_only = config.unread_only && !include_read;
        let query = StreamQuery {
            count: config.fetch_count as usize,
            unread_only,
            newer_than: None,
        };

        tracing::info!(target: "feedly", unread_only, "fetching global.all");
        let raw = self.stream_contents(&stream_id, &query).await;
        tracing::info!(target: "feedly", count = raw.len(), "fetched entries");

        let fetched_at = chrono::Local::now().to_rfc3339();
        let categories = group_by_category(raw, config, &profile.id, &fetched_at);
        for block in categories.values() {
            tracing::info!(target: "feedly", category = %block.name, count = block.count, "category");
        }

        Ok(CategorizedFile {
            metadata: FetchMetadata {
                generated_at: Some(fetched_at),
                total_articles: categories.values().map(|c| c.count).sum(),
                categories_count: categories.len(),
                unread_only,
            },
            categories,
        })
    }

    /// POST `markAsRead` markers in batches of [`MAX_BATCH`].
    pub async fn mark_as_read(&self, entry_ids: &[String]) -> MarkReadReport {
        let mut marked = 0usize;
        for batch in entry_ids.chunks(MAX_BATCH) {
            let body = MarkersBody {
                action: "markAsRead",
                kind: "entries",
                entry_ids: batch,
            };
            let res = self
                .client
                .post(self.url("markers"))
                .bearer_auth(&self.token)
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await;

            let err = match res {
                Ok(rsp) if rsp.status().is_success() => None,
                Ok(rsp) => {
                    let status = rsp.status();
                    Some(format!("API error: {status} - {}", rsp.text().await.unwrap_or_default()))
                }
                Err(e) => Some(format!("request error: {e}")),
            };
            if let Some(error) = err {
                tracing::warn!(target: "feedly", marked, %error, "mark as read stopped");
                return MarkReadReport {
                    marked,
                    error: Some(error),
                };
            }
            marked += batch.len();
        }
        MarkReadReport { marked, error: None }
    }

    /// Tag entries with `global.saved` (Read Later). Returns the saved count.
    pub async fn save_to_read_later(&self, user_id: &str, entry_ids: &[String]) -> Result<usize> {
        if entry_ids.is_empty() {
            return Ok(0);
        }
        let tag = format!("user/{user_id}/tag/global.saved");
        let encoded: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();

        let rsp = self
            .client
            .put(self.url(&format!("tags/{encoded}")))
            .bearer_auth(&self.token)
            .json(&TagBody { entry_ids })
            .timeout(self.timeout)
            .send()
            .await
            .context("feedly tag request")?;

        if !rsp.status().is_success() {
            let status = rsp.status();
            bail!("API error: {status} - {}", rsp.text().await.unwrap_or_default());
        }
        Ok(entry_ids.len())
    }
}

/// Slug for a category label: configured slug, else the label lowercased
/// with spaces replaced by `-`.
pub fn category_slug(config: &Config, label: &str) -> String {
    config
        .category_by_name(label)
        .and_then(|c| c.slug.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| label.to_lowercase().replace(' ', "-"))
}

pub fn group_by_category(
    raw: Vec<EntryRecord>,
    config: &Config,
    user_id: &str,
    fetched_at: &str,
) -> IndexMap<String, CategoryBlock> {
    let mut out: IndexMap<String, CategoryBlock> = IndexMap::new();
    for entry in raw {
        let (label, slug) = match entry.first_category_label() {
            Some(label) => (label.to_string(), category_slug(config, label)),
            None => (UNCATEGORIZED.to_string(), UNCATEGORIZED.to_string()),
        };
        let block = out.entry(slug.clone()).or_insert_with(|| CategoryBlock {
            stream_id: format!("user/{user_id}/category/{label}"),
            keywords: config
                .category_by_name(&label)
                .map(|c| c.keywords.clone())
                .unwrap_or_default(),
            name: label,
            slug,
            fetched_at: Some(fetched_at.to_string()),
            ..CategoryBlock::default()
        });
        block.articles.push(entry.into_stored());
        block.count += 1;
    }
    out.sort_by(|_, a, _, b| b.count.cmp(&a.count));
    out
}

/// Where the URL mapping lives for a given fetch output path.
pub fn mapping_path_for(output: &Path) -> PathBuf {
    output
        .parent()
        .map(|p| p.join(MAPPING_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(MAPPING_FILE_NAME))
}

/// Write the fetch output and its URL mapping side by side.
pub fn write_fetch_output(file: &CategorizedFile, output: &Path) -> Result<PathBuf> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(output, json).with_context(|| format!("write {}", output.display()))?;

    let mapping_path = mapping_path_for(output);
    let mapping = serde_json::to_string_pretty(&file.url_mapping())?;
    std::fs::write(&mapping_path, mapping)
        .with_context(|| format!("write {}", mapping_path.display()))?;
    Ok(mapping_path)
}
