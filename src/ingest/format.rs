// src/ingest/format.rs
//! On-disk article files. Two shapes are accepted and resolved once at load:
//! the categorized file written by `fetch`, and a legacy `{items: [...]}`
//! file of raw feed entries.

use super::normalize_text;
use crate::article::Article;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const UNCATEGORIZED: &str = "uncategorized";
pub const UNTITLED: &str = "No Title";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleFile {
    Categorized(CategorizedFile),
    Legacy(LegacyFile),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorizedFile {
    #[serde(default)]
    pub metadata: FetchMetadata,
    pub categories: IndexMap<String, CategoryBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyFile {
    #[serde(default)]
    pub items: Vec<EntryRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub total_articles: usize,
    #[serde(default)]
    pub categories_count: usize,
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub stream_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub articles: Vec<EntryRecord>,
    #[serde(default)]
    pub fetched_at: Option<String>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default, alias = "htmlUrl", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "streamId", skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Body text: a bare string in stored files, `{content: ...}` in raw entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrContent {
    Text(String),
    Object {
        #[serde(default)]
        content: Option<String>,
    },
}

impl TextOrContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextOrContent::Text(s) => Some(s.as_str()),
            TextOrContent::Object { content } => content.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
    }
}

/// One feed entry, lenient enough to read both stored and raw shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "canonicalUrl", default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate: Vec<Link>,
    #[serde(rename = "originId", default, skip_serializing_if = "Option::is_none")]
    pub origin_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub published: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<TextOrContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<TextOrContent>,
    #[serde(
        default,
        alias = "engagementRate",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub engagement_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<SourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRef>,
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl EntryRecord {
    /// `url > canonicalUrl > alternate[0].href > originId`.
    pub fn resolve_url(&self) -> Option<&str> {
        non_blank(&self.url)
            .or_else(|| non_blank(&self.canonical_url))
            .or_else(|| self.alternate.first().and_then(|l| non_blank(&l.href)))
            .or_else(|| non_blank(&self.origin_id))
    }

    pub fn source_title(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| non_blank(&s.title))
            .or_else(|| self.origin.as_ref().and_then(|o| non_blank(&o.title)))
    }

    pub fn body_text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(TextOrContent::as_text)
            .or_else(|| self.summary.as_ref().and_then(TextOrContent::as_text))
    }

    /// First category label of a raw entry.
    pub fn first_category_label(&self) -> Option<&str> {
        self.categories.first().map(|c| non_blank(&c.label).unwrap_or("unknown"))
    }

    /// Compact stored shape written by `fetch`: resolved URL, normalized body,
    /// source taken from `origin`, raw-only fields dropped.
    pub fn into_stored(self) -> EntryRecord {
        let url = self.resolve_url().map(str::to_string);
        let body = self.body_text().map(normalize_text).filter(|b| !b.is_empty());
        let source = self.source.clone().or_else(|| self.origin.clone());
        EntryRecord {
            id: self.id,
            title: Some(self.title.unwrap_or_else(|| UNTITLED.to_string())),
            url,
            published: self.published,
            author: self.author.filter(|a| !a.is_empty()),
            content: body.map(TextOrContent::Text),
            engagement_rate: Some(self.engagement_rate.unwrap_or(0.0)),
            source,
            keywords: self.keywords,
            ..EntryRecord::default()
        }
    }

    pub fn into_article(self, category: Option<&CategoryBlock>) -> Article {
        Article {
            url: self.resolve_url().map(str::to_string),
            source: self.source_title().map(str::to_string),
            body: self.body_text().map(normalize_text).filter(|b| !b.is_empty()),
            engagement_rate: self.engagement_rate.unwrap_or(0.0),
            published: self.published,
            keywords: category.map(|c| c.keywords.clone()).unwrap_or_default(),
            category: category.map(|c| {
                if c.name.is_empty() {
                    c.slug.clone()
                } else {
                    c.name.clone()
                }
            }),
            title: non_blank(&self.title).unwrap_or(UNTITLED).to_string(),
            id: self.id,
            signals: Vec::new(),
        }
    }
}

impl CategorizedFile {
    /// `url -> entry id` for every entry that has both.
    pub fn url_mapping(&self) -> IndexMap<String, String> {
        self.categories
            .values()
            .flat_map(|c| c.articles.iter())
            .filter_map(|e| Some((e.resolve_url()?.to_string(), non_blank(&e.id)?.to_string())))
            .collect()
    }
}

impl ArticleFile {
    pub fn entries(&self) -> Box<dyn Iterator<Item = &EntryRecord> + '_> {
        match self {
            ArticleFile::Categorized(f) => {
                Box::new(f.categories.values().flat_map(|c| c.articles.iter()))
            }
            ArticleFile::Legacy(f) => Box::new(f.items.iter()),
        }
    }

    /// Entry ids in file order.
    pub fn entry_ids(&self) -> Vec<String> {
        self.entries()
            .filter_map(|e| non_blank(&e.id).map(str::to_string))
            .collect()
    }

    pub fn into_articles(self) -> Vec<Article> {
        match self {
            ArticleFile::Categorized(f) => f
                .categories
                .into_iter()
                .flat_map(|(slug, mut block)| {
                    if block.slug.is_empty() {
                        block.slug = slug;
                    }
                    let entries = std::mem::take(&mut block.articles);
                    entries
                        .into_iter()
                        .map(|e| e.into_article(Some(&block)))
                        .collect::<Vec<_>>()
                })
                .collect(),
            ArticleFile::Legacy(f) => f.items.into_iter().map(|e| e.into_article(None)).collect(),
        }
    }
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;
    Ok(v.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
    .filter(|f: &f64| f.is_finite()))
}
