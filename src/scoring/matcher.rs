// src/scoring/matcher.rs
//! Keyword matching over mixed Japanese/Latin text.
//!
//! Three tiers, checked in order:
//! 1. Keyword contains Japanese script → plain substring.
//! 2. Text contains Japanese and the keyword is a short (≤3) alphabetic
//!    token → match only where no ASCII letter touches either side. This is
//!    what lets "ai" hit `先進的AI利活用` but not `Zaim`.
//! 3. Otherwise → Unicode word-boundary match, so "ml" misses "html".

use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;

/// Hiragana, katakana or CJK unified ideographs.
pub fn is_japanese(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309f}' | '\u{30a0}'..='\u{30ff}' | '\u{4e00}'..='\u{9fff}')
}

pub fn contains_japanese(s: &str) -> bool {
    s.chars().any(is_japanese)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Substring,
    /// Short alphabetic keyword: isolated from ASCII letters when the text is
    /// Japanese, word boundary otherwise.
    ShortAlpha,
    WordBoundary,
}

/// A keyword compiled once and reused across many texts.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: String,
    rule: Rule,
    boundary: Option<Regex>,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        let keyword = keyword.to_lowercase();
        let rule = if contains_japanese(&keyword) {
            Rule::Substring
        } else if !keyword.is_empty()
            && keyword.chars().count() <= 3
            && keyword.chars().all(char::is_alphabetic)
        {
            Rule::ShortAlpha
        } else {
            Rule::WordBoundary
        };
        let boundary = match rule {
            Rule::Substring => None,
            _ => Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&keyword))).ok(),
        };
        Self {
            keyword,
            rule,
            boundary,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn is_match(&self, text: &MatchText) -> bool {
        if self.keyword.is_empty() {
            return false;
        }
        match self.rule {
            Rule::Substring => text.lower.contains(&self.keyword),
            Rule::ShortAlpha if text.has_japanese => isolated_from_latin(&text.lower, &self.keyword),
            _ => self
                .boundary
                .as_ref()
                .is_some_and(|re| re.is_match(&text.lower)),
        }
    }
}

/// A lowercased text with its script classification precomputed.
#[derive(Debug, Clone)]
pub struct MatchText {
    lower: String,
    has_japanese: bool,
}

impl MatchText {
    pub fn new(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has_japanese = contains_japanese(&lower);
        Self {
            lower,
            has_japanese,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

/// True if `needle` occurs somewhere in `hay` with no ASCII letter directly
/// before or after it. Every start position is tried, not only
/// non-overlapping ones.
fn isolated_from_latin(hay: &str, needle: &str) -> bool {
    hay.char_indices().any(|(i, _)| {
        if !hay[i..].starts_with(needle) {
            return false;
        }
        let before = hay[..i].chars().next_back();
        let after = hay[i + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphabetic())
            && !after.is_some_and(|c| c.is_ascii_alphabetic())
    })
}

/// One-shot convenience over `KeywordMatcher`.
pub fn is_word_match(keyword: &str, text: &str) -> bool {
    KeywordMatcher::new(keyword).is_match(&MatchText::new(text))
}

/// Matchers compiled up front for every configured keyword. Keywords that
/// were not known at build time are compiled on demand.
#[derive(Debug, Default)]
pub struct MatcherCache {
    compiled: HashMap<String, KeywordMatcher>,
}

impl MatcherCache {
    pub fn new<'a, I>(keywords: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut compiled = HashMap::new();
        for kw in keywords {
            let m = KeywordMatcher::new(kw);
            compiled.entry(m.keyword.clone()).or_insert(m);
        }
        Self { compiled }
    }

    pub fn get(&self, keyword: &str) -> Cow<'_, KeywordMatcher> {
        match self.compiled.get(keyword) {
            Some(m) => Cow::Borrowed(m),
            None => Cow::Owned(KeywordMatcher::new(keyword)),
        }
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_acronym_inside_latin_word_in_japanese_text() {
        assert!(!is_word_match("ai", "家計簿アプリZaimの新機能"));
    }

    #[test]
    fn short_acronym_between_kanji() {
        assert!(is_word_match("ai", "先進的AI利活用アドバイザリーボード"));
    }

    #[test]
    fn ml_not_in_html_english() {
        assert!(!is_word_match("ml", "How to write better html for email"));
        assert!(is_word_match("ml", "Practical ML at scale"));
    }

    #[test]
    fn japanese_keyword_is_substring() {
        assert!(is_word_match("生成ai", "最新の生成AIツールまとめ"));
        assert!(is_word_match("機械学習", "機械学習の基礎"));
    }

    #[test]
    fn short_alpha_in_japanese_text_with_punctuation() {
        assert!(is_word_match("llm", "「LLM」の活用事例"));
        assert!(!is_word_match("llm", "allmightyの活用事例"));
    }

    #[test]
    fn later_occurrence_can_qualify() {
        // first "ai" sits inside a Latin word, the second one is isolated
        assert!(is_word_match("ai", "zaimとAIの話"));
    }

    #[test]
    fn long_keyword_uses_word_boundary_even_in_japanese_text() {
        assert!(is_word_match("rust", "Rust 入門"));
        assert!(!is_word_match("rust", "trustの話"));
        // kana count as word characters, so no boundary between "t" and "で"
        assert!(!is_word_match("rust", "Rustで書くCLI"));
    }

    #[test]
    fn empty_keyword_never_matches() {
        assert!(!is_word_match("", "anything"));
    }

    #[test]
    fn cache_returns_owned_for_unknown() {
        let cache = MatcherCache::new(["Rust", "ai"]);
        assert_eq!(cache.len(), 2);
        assert!(matches!(cache.get("rust"), Cow::Borrowed(_)));
        assert!(matches!(cache.get("go"), Cow::Owned(_)));
    }
}
