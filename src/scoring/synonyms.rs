// src/scoring/synonyms.rs
//! Groups requested keywords into match-sets using configured synonym groups.

use std::collections::HashSet;

/// Interchangeable keywords, matched as one unit. Terms are lowercased and
/// kept in group order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSet {
    terms: Vec<String>,
}

impl MatchSet {
    pub fn single(keyword: &str) -> Self {
        Self {
            terms: vec![keyword.to_lowercase()],
        }
    }

    /// Group members not yet consumed by an earlier set.
    fn from_group(group: &[String], used: &HashSet<String>) -> Self {
        let mut terms: Vec<String> = Vec::with_capacity(group.len());
        for g in group {
            let t = g.trim().to_lowercase();
            if !t.is_empty() && !used.contains(&t) && !terms.contains(&t) {
                terms.push(t);
            }
        }
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }
}

/// Expand `keywords` (in order) into match-sets.
///
/// A keyword already consumed by an earlier set is skipped. Otherwise the
/// first group containing it (case-insensitive) is emitted and all its
/// members are consumed; a keyword in no group becomes a singleton. Members
/// already consumed by an earlier set are left out, so no term is ever in
/// two sets.
pub fn expand_with_synonyms(keywords: &[String], groups: &[Vec<String>]) -> Vec<MatchSet> {
    let mut out = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    for kw in keywords {
        let lower = kw.trim().to_lowercase();
        if lower.is_empty() || used.contains(&lower) {
            continue;
        }

        let group = groups
            .iter()
            .find(|g| g.iter().any(|m| m.trim().to_lowercase() == lower));

        match group {
            Some(g) => {
                let set = MatchSet::from_group(g, &used);
                used.extend(set.terms.iter().cloned());
                out.push(set);
            }
            None => {
                used.insert(lower.clone());
                out.push(MatchSet { terms: vec![lower] });
            }
        }
    }
    out
}
