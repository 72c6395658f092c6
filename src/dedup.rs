// src/dedup.rs
//! Near-duplicate removal by normalized title.

use std::collections::HashMap;

/// Title/subtitle delimiters; the title is cut at the earliest one found.
pub const TITLE_SEPARATORS: [&str; 6] = [" | ", " - ", " -- ", "｜", "：", " :: "];

/// Maximum key length in characters.
pub const TITLE_KEY_LEN: usize = 50;

/// Dedup key: cut at the first separator, trim, keep 50 chars, trim.
pub fn normalize_title(title: &str) -> String {
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .unwrap_or(title.len());
    let head: String = title[..cut].trim().chars().take(TITLE_KEY_LEN).collect();
    head.trim().to_string()
}

/// Collapse items sharing a normalized title, keeping the one with the
/// strictly higher score (ties keep the first seen). Output order is the
/// order in which each key was first seen. Also returns how many items
/// were dropped.
pub fn deduplicate_by<T, F, S>(items: Vec<T>, title: F, score: S) -> (Vec<T>, usize)
where
    F: Fn(&T) -> &str,
    S: Fn(&T) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut dropped = 0usize;

    for item in items {
        let key = normalize_title(title(&item));
        match index.get(&key) {
            Some(&slot) => {
                dropped += 1;
                if score(&item) > score(&kept[slot]) {
                    kept[slot] = item;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(item);
            }
        }
    }
    (kept, dropped)
}
