// src/ingest/mod.rs
pub mod feedly;
pub mod format;

use crate::article::Article;
use anyhow::{Context, Result};
use std::path::Path;

pub use feedly::{FeedlyClient, MarkReadReport, Profile, StreamQuery, TokenStatus};
pub use format::{ArticleFile, CategorizedFile, CategoryBlock, EntryRecord, FetchMetadata};

/// Normalize feed HTML into plain text: decode entities, strip tags,
/// fold typographic quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// Parse an article file of either shape.
pub fn parse_article_file(content: &str) -> Result<ArticleFile> {
    serde_json::from_str(content).context("parse article file")
}

pub fn read_article_file(path: &Path) -> Result<ArticleFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read article file {}", path.display()))?;
    parse_article_file(&content)
}

/// Load articles from `path`. A missing file yields an empty list.
pub fn load_articles(path: &Path) -> Result<Vec<Article>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "article file not found");
        return Ok(Vec::new());
    }
    let articles = read_article_file(path)?.into_articles();
    tracing::info!(path = %path.display(), count = articles.len(), "loaded articles");
    Ok(articles)
}
