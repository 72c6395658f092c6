// src/report/bookmarks.rs
//! Read back a report whose "save" checkboxes were ticked by hand.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

// Link targets may hold one level of balanced parentheses, e.g. `.../Rust_(programming_language)`.
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\|\s*\d+\s*\|\s*\[([^\]]+)\]\(((?:[^()\s]|\([^()\s]*\))+)\)\s*\|.*?\|\s*\[([xX ])\]\s*\|\s*\[([xX ])\]\s*\|",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedLink {
    pub title: String,
    pub url: String,
    pub read: bool,
}

/// Rows whose last checkbox (save) is ticked, in document order.
pub fn parse_saved_urls(markdown: &str) -> Vec<SavedLink> {
    ROW.captures_iter(markdown)
        .filter(|c| c[4].eq_ignore_ascii_case("x"))
        .map(|c| SavedLink {
            title: c[1].to_string(),
            url: c[2].trim().to_string(),
            read: c[3].eq_ignore_ascii_case("x"),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSelection {
    /// Distinct entry ids in document order.
    pub entry_ids: Vec<String>,
    /// Saved URLs with no entry in the mapping.
    pub unmapped: Vec<String>,
}

pub fn resolve_entry_ids(links: &[SavedLink], mapping: &IndexMap<String, String>) -> BookmarkSelection {
    let mut seen = HashSet::new();
    let mut out = BookmarkSelection::default();
    for link in links {
        match mapping.get(&link.url) {
            Some(id) => {
                if seen.insert(id.clone()) {
                    out.entry_ids.push(id.clone());
                }
            }
            None => out.unmapped.push(link.url.clone()),
        }
    }
    out
}

/// `url -> entry id` file written by `fetch`.
pub fn load_mapping(path: &Path) -> Result<IndexMap<String, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("mapping file not found: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse mapping {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
| # | 記事 | スコア | 注目 | Feedly | はてブ | HN | 関連 | 鮮度 | マッチKW | 読了 | 保存 |
|---|------|--------|------|--------|--------|-----|------|------|----------|------|------|
| 1 | [Alpha](https://a.example/1) | **80.5** | 40 | 10 | [12](https://b.hatena.ne.jp/entry/s/a.example/1) | 0 | 100 | 100 | rust | [ ] | [x] |
| 2 | [Beta](https://b.example/2) | **60** | 0 | 0 | 0 | 0 | 70 | 50 | | [x] | [ ] |
| 3 | [Gamma](https://c.example/3) | **41** | 0 | 0 | 0 | 0 | 40 | 35 | ai | [x] | [X] |
";

    #[test]
    fn only_save_column_counts() {
        let links = parse_saved_urls(REPORT);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.example/1", "https://c.example/3"]);
        assert!(!links[0].read);
        assert!(links[1].read);
    }

    #[test]
    fn parenthesised_urls_are_read_whole() {
        let md = "| 1 | [Rust](https://en.wikipedia.org/wiki/Rust_(programming_language)) | **70.0** | 0 | 0 | 0 | 0 | 100 | 25 | rust | [ ] | [x] |\n";
        let links = parse_saved_urls(md);
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].url,
            "https://en.wikipedia.org/wiki/Rust_(programming_language)"
        );
    }

    #[test]
    fn unmapped_urls_are_reported() {
        let links = parse_saved_urls(REPORT);
        let mut m = IndexMap::new();
        m.insert("https://a.example/1".to_string(), "entry-a".to_string());
        let sel = resolve_entry_ids(&links, &m);
        assert_eq!(sel.entry_ids, vec!["entry-a"]);
        assert_eq!(sel.unmapped, vec!["https://c.example/3"]);
    }
}
