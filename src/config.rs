// src/config.rs
//! Run configuration: keywords, synonym groups, trusted sources, paywall
//! domains, scoring weights/thresholds and fetch options.
//!
//! Loaded from JSON (default) or TOML (by `.toml` extension). Every field has
//! a documented default, so a partial file is always usable. Fields are read
//! one at a time: a value of the wrong shape falls back to that field's
//! default and list entries of the wrong shape are skipped, each with a
//! warning. A file that does not parse at all falls back to the defaults;
//! only a missing or unreadable file is an error.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "~/.feedly/config.json";
pub const DEFAULT_TOKEN_PATH: &str = "~/.feedly/token";
pub const ENV_CONFIG_PATH: &str = "FEEDLY_CONFIG_PATH";

fn default_token_file() -> String {
    DEFAULT_TOKEN_PATH.to_string()
}
fn default_fetch_count() -> u32 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_output_dir() -> String {
    "Daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default = "default_fetch_count")]
    pub fetch_count: u32,
    #[serde(default = "default_true")]
    pub unread_only: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub global_keywords: Vec<String>,
    /// Source-name fragment → trust fraction in [0,1]. Order matters: the
    /// first fragment found in a source name wins.
    #[serde(default)]
    pub trusted_sources: IndexMap<String, f64>,
    #[serde(default)]
    pub synonym_groups: Vec<Vec<String>>,
    #[serde(default)]
    pub paywalled_domains: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            fetch_count: default_fetch_count(),
            unread_only: true,
            output_dir: default_output_dir(),
            global_keywords: Vec::new(),
            trusted_sources: IndexMap::new(),
            synonym_groups: Vec::new(),
            paywalled_domains: Vec::new(),
            categories: Vec::new(),
            scoring: ScoringConfig::default(),
            social: SocialConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_w_engagement() -> f64 {
    0.30
}
fn default_w_relevance() -> f64 {
    0.40
}
fn default_w_freshness() -> f64 {
    0.20
}
fn default_w_source_trust() -> f64 {
    0.10
}

/// Component weights. Expected to sum to ~1.0; not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_w_engagement")]
    pub engagement: f64,
    #[serde(default = "default_w_relevance")]
    pub relevance: f64,
    #[serde(default = "default_w_freshness")]
    pub freshness: f64,
    #[serde(default = "default_w_source_trust")]
    pub source_trust: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            engagement: default_w_engagement(),
            relevance: default_w_relevance(),
            freshness: default_w_freshness(),
            source_trust: default_w_source_trust(),
        }
    }
}

fn default_must_read() -> f64 {
    80.0
}
fn default_should_read() -> f64 {
    60.0
}
fn default_optional() -> f64 {
    40.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_must_read")]
    pub must_read: f64,
    #[serde(default = "default_should_read")]
    pub should_read: f64,
    #[serde(default = "default_optional")]
    pub optional: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            must_read: default_must_read(),
            should_read: default_should_read(),
            optional: default_optional(),
        }
    }
}

fn default_workers() -> usize {
    10
}
fn default_timeout_secs() -> u64 {
    5
}

/// Social-signal fan-out options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Resolve the config path: explicit argument → `$FEEDLY_CONFIG_PATH` →
    /// `~/.feedly/config.json`.
    pub fn resolve_path(explicit: Option<&str>) -> PathBuf {
        let raw = explicit
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        expand_path(&raw)
    }

    /// Load from a file. Missing file is an error; unparsable content is not.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        Ok(Self::from_str_lenient(&content, is_toml))
    }

    /// Parse config text. Bad values fall back per field; text that does not
    /// parse at all yields the defaults.
    pub fn from_str_lenient(content: &str, is_toml: bool) -> Self {
        let parsed: std::result::Result<Value, String> = if is_toml {
            toml::from_str::<toml::Table>(content)
                .map_err(|e| e.to_string())
                .and_then(|t| serde_json::to_value(t).map_err(|e| e.to_string()))
        } else {
            serde_json::from_str::<Value>(content).map_err(|e| e.to_string())
        };
        let mut cfg = match parsed {
            Ok(root) if root.is_object() => Self::from_document(&root),
            Ok(_) => {
                warn!("config root is not a table, using defaults");
                Config::default()
            }
            Err(e) => {
                warn!(error = %e, "config did not parse, using defaults");
                Config::default()
            }
        };
        cfg.sanitize();
        cfg
    }

    fn from_document(root: &Value) -> Self {
        let d = Config::default();
        let (dw, dt, ds) = (d.scoring.weights, d.scoring.thresholds, d.social);
        let scoring = root.get("scoring");
        let weights = scoring.and_then(|s| s.get("weights"));
        let thresholds = scoring.and_then(|s| s.get("thresholds"));
        let social = root.get("social");
        let root = Some(root);

        Config {
            token_file: field(root, "token_file", d.token_file),
            fetch_count: field(root, "fetch_count", d.fetch_count),
            unread_only: field(root, "unread_only", d.unread_only),
            output_dir: field(root, "output_dir", d.output_dir),
            global_keywords: entries(root, "global_keywords"),
            trusted_sources: trust_table(root),
            synonym_groups: entries(root, "synonym_groups"),
            paywalled_domains: entries(root, "paywalled_domains"),
            categories: entries(root, "categories"),
            scoring: ScoringConfig {
                weights: Weights {
                    engagement: field(weights, "engagement", dw.engagement),
                    relevance: field(weights, "relevance", dw.relevance),
                    freshness: field(weights, "freshness", dw.freshness),
                    source_trust: field(weights, "source_trust", dw.source_trust),
                },
                thresholds: Thresholds {
                    must_read: field(thresholds, "must_read", dt.must_read),
                    should_read: field(thresholds, "should_read", dt.should_read),
                    optional: field(thresholds, "optional", dt.optional),
                },
            },
            social: SocialConfig {
                enabled: field(social, "enabled", ds.enabled),
                workers: field(social, "workers", ds.workers),
                timeout_secs: field(social, "timeout_secs", ds.timeout_secs),
            },
        }
    }

    /// Reset values that cannot be used as-is to their defaults.
    fn sanitize(&mut self) {
        let d = Weights::default();
        let w = &mut self.scoring.weights;
        fix_f64(&mut w.engagement, d.engagement, "weights.engagement");
        fix_f64(&mut w.relevance, d.relevance, "weights.relevance");
        fix_f64(&mut w.freshness, d.freshness, "weights.freshness");
        fix_f64(&mut w.source_trust, d.source_trust, "weights.source_trust");

        let d = Thresholds::default();
        let t = &mut self.scoring.thresholds;
        fix_f64(&mut t.must_read, d.must_read, "thresholds.must_read");
        fix_f64(&mut t.should_read, d.should_read, "thresholds.should_read");
        fix_f64(&mut t.optional, d.optional, "thresholds.optional");

        if self.social.workers == 0 {
            self.social.workers = 1;
        }
        if self.fetch_count == 0 {
            self.fetch_count = default_fetch_count();
        }
    }

    /// Category config whose display name equals `label`.
    pub fn category_by_name(&self, label: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.name == label)
    }

    pub fn token_path(&self) -> PathBuf {
        expand_path(&self.token_file)
    }
}

/// `section[key]` as `T`; absent, null or wrong-shaped values give `default`.
fn field<T: DeserializeOwned>(section: Option<&Value>, key: &str, default: T) -> T {
    match section.and_then(|s| s.get(key)) {
        None | Some(Value::Null) => default,
        Some(v) => match T::deserialize(v) {
            Ok(t) => t,
            Err(e) => {
                warn!(field = key, error = %e, "invalid config value, using default");
                default
            }
        },
    }
}

/// `section[key]` as a list; entries of the wrong shape are skipped.
fn entries<T: DeserializeOwned>(section: Option<&Value>, key: &str) -> Vec<T> {
    match section.and_then(|s| s.get(key)) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match T::deserialize(v) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(field = key, error = %e, "skipping invalid config entry");
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!(field = key, "expected a list, using default");
            Vec::new()
        }
    }
}

/// `trusted_sources` in file order; non-numeric fractions are skipped.
fn trust_table(root: Option<&Value>) -> IndexMap<String, f64> {
    match root.and_then(|r| r.get("trusted_sources")) {
        None | Some(Value::Null) => IndexMap::new(),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(name, v)| match v.as_f64() {
                Some(f) => Some((name.clone(), f)),
                None => {
                    warn!(source = %name, "trust fraction is not a number, skipping");
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!(field = "trusted_sources", "expected a table, using default");
            IndexMap::new()
        }
    }
}

fn fix_f64(v: &mut f64, default: f64, name: &str) {
    if !v.is_finite() || *v < 0.0 {
        warn!(field = name, value = %v, "invalid config value, using default");
        *v = default;
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_path(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let c = Config::from_str_lenient("{}", false);
        assert_eq!(c.scoring.weights, Weights::default());
        assert_eq!(c.scoring.thresholds, Thresholds::default());
        assert_eq!(c.output_dir, "Daily");
        assert_eq!(c.social.workers, 10);
        assert!(c.unread_only);
    }

    #[test]
    fn partial_weights_keep_other_defaults() {
        let c = Config::from_str_lenient(r#"{"scoring":{"weights":{"relevance":0.5}}}"#, false);
        assert!((c.scoring.weights.relevance - 0.5).abs() < 1e-9);
        assert!((c.scoring.weights.engagement - 0.30).abs() < 1e-9);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let c = Config::from_str_lenient("not json at all", false);
        assert!(c.global_keywords.is_empty());
        assert_eq!(c.scoring.thresholds.must_read, 80.0);
    }

    #[test]
    fn one_bad_value_keeps_the_rest() {
        let c = Config::from_str_lenient(
            r#"{"global_keywords":["rust", 7, "llm"],
                "paywalled_domains":["nikkei.com"],
                "trusted_sources":{"Publickey":0.9,"Broken":"high"},
                "social":{"workers":"many","timeout_secs":3},
                "scoring":{"weights":{"relevance":"high","freshness":0.25}}}"#,
            false,
        );
        assert_eq!(c.global_keywords, vec!["rust", "llm"]);
        assert_eq!(c.paywalled_domains, vec!["nikkei.com"]);
        assert_eq!(c.trusted_sources.len(), 1);
        assert_eq!(c.social.workers, 10);
        assert_eq!(c.social.timeout_secs, 3);
        assert_eq!(c.scoring.weights.relevance, 0.40);
        assert_eq!(c.scoring.weights.freshness, 0.25);
    }

    #[test]
    fn non_object_root_is_defaults() {
        let c = Config::from_str_lenient("[1, 2]", false);
        assert!(c.global_keywords.is_empty());
        assert_eq!(c.output_dir, "Daily");
    }

    #[test]
    fn negative_weight_is_reset() {
        let c = Config::from_str_lenient(r#"{"scoring":{"weights":{"freshness":-1}}}"#, false);
        assert!((c.scoring.weights.freshness - 0.20).abs() < 1e-9);
    }

    #[test]
    fn trusted_sources_keep_file_order() {
        let c = Config::from_str_lenient(
            r#"{"trusted_sources":{"zeta":0.9,"alpha":0.8,"mid":0.7}}"#,
            false,
        );
        let keys: Vec<_> = c.trusted_sources.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn toml_is_accepted() {
        let c = Config::from_str_lenient(
            r#"
global_keywords = ["rust", "llm"]
[scoring.thresholds]
must_read = 75
"#,
            true,
        );
        assert_eq!(c.global_keywords, vec!["rust", "llm"]);
        assert_eq!(c.scoring.thresholds.must_read, 75.0);
        assert_eq!(c.scoring.thresholds.optional, 40.0);
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/x/y"), home.join("x/y"));
        }
        assert_eq!(expand_path("/abs/p"), PathBuf::from("/abs/p"));
    }
}
