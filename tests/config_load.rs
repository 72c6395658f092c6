// tests/config_load.rs
use chrono::{TimeZone, Utc};
use feedly_intel::config::{Config, Thresholds, Weights, ENV_CONFIG_PATH};
use feedly_intel::{rank, Article, PriorityBucket};
use std::{env, fs};

#[test]
fn json_config_with_partial_sections() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("config.json");
    fs::write(
        &p,
        r#"{
            "global_keywords": ["Rust", "生成AI"],
            "trusted_sources": {"ITmedia": 0.8, "Publickey": 0.9},
            "synonym_groups": [["LLM", "GPT"]],
            "paywalled_domains": ["nikkei.com"],
            "categories": [{"name": "Tech News", "slug": "tech", "keywords": ["wasm"]}],
            "scoring": {"weights": {"relevance": 0.5}, "thresholds": {"must_read": 75}}
        }"#,
    )
    .unwrap();

    let c = Config::load_from(&p).unwrap();
    assert_eq!(c.global_keywords, vec!["Rust", "生成AI"]);
    assert_eq!(
        c.trusted_sources.keys().collect::<Vec<_>>(),
        vec!["ITmedia", "Publickey"]
    );
    assert_eq!(c.scoring.weights.relevance, 0.5);
    assert_eq!(c.scoring.weights.engagement, Weights::default().engagement);
    assert_eq!(c.scoring.thresholds.must_read, 75.0);
    assert_eq!(c.scoring.thresholds.should_read, Thresholds::default().should_read);
    assert_eq!(
        c.category_by_name("Tech News").and_then(|c| c.slug.as_deref()),
        Some("tech")
    );
}

#[test]
fn toml_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("config.toml");
    fs::write(
        &p,
        r#"
output_dir = "Reports"
global_keywords = ["kubernetes"]

[social]
enabled = false
workers = 4
"#,
    )
    .unwrap();
    let c = Config::load_from(&p).unwrap();
    assert_eq!(c.output_dir, "Reports");
    assert!(!c.social.enabled);
    assert_eq!(c.social.workers, 4);
}

#[test]
fn malformed_or_invalid_values_fall_back() {
    let c = Config::from_str_lenient("{ not json", false);
    assert_eq!(c.scoring.weights, Weights::default());

    let c = Config::from_str_lenient(
        r#"{"scoring": {"weights": {"freshness": -1.0}}, "social": {"workers": 0}, "fetch_count": 0}"#,
        false,
    );
    assert_eq!(c.scoring.weights.freshness, Weights::default().freshness);
    assert_eq!(c.social.workers, 1);
    assert_eq!(c.fetch_count, 1000);
}

#[test]
fn wrong_typed_weight_keeps_keywords_and_paywall() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("config.json");
    fs::write(
        &p,
        r#"{
            "global_keywords": ["rust"],
            "paywalled_domains": ["nikkei.com"],
            "scoring": {"weights": {"relevance": "high"}}
        }"#,
    )
    .unwrap();

    let c = Config::load_from(&p).unwrap();
    assert_eq!(c.global_keywords, vec!["rust"]);
    assert_eq!(c.paywalled_domains, vec!["nikkei.com"]);
    assert_eq!(c.scoring.weights, Weights::default());

    let now = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();
    let items = vec![
        Article {
            url: Some("https://www.nikkei.com/article/1".into()),
            ..Article::new("Rust in finance")
        },
        Article {
            url: Some("https://example.com/garden".into()),
            ..Article::new("Gardening")
        },
    ];
    let report = rank(items, &c, now);
    let bucket_of = |title: &str| {
        report
            .items
            .iter()
            .find(|s| s.article.title == title)
            .map(|s| s.bucket)
    };
    assert_eq!(bucket_of("Rust in finance"), Some(PriorityBucket::Paywalled));
    // keywords survived, so a non-matching article is judged irrelevant, not neutral
    let garden = report.items.iter().find(|s| s.article.title == "Gardening").unwrap();
    assert_eq!(garden.scores.relevance, 0.0);
}

#[test]
fn toml_trusted_sources_keep_file_order() {
    let c = Config::from_str_lenient(
        r#"
[trusted_sources]
zeta = 0.9
alpha = 0.8
mid = "oops"
beta = 0.5
"#,
        true,
    );
    assert_eq!(c.trusted_sources.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "beta"]);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load_from(&dir.path().join("absent.json")).is_err());
}

#[serial_test::serial]
#[test]
fn path_resolution_order() {
    let dir = tempfile::tempdir().unwrap();
    let from_env = dir.path().join("env.json");

    env::set_var(ENV_CONFIG_PATH, from_env.display().to_string());
    assert_eq!(Config::resolve_path(None), from_env);
    assert_eq!(
        Config::resolve_path(Some("/explicit/config.json")),
        std::path::PathBuf::from("/explicit/config.json")
    );

    env::remove_var(ENV_CONFIG_PATH);
    let fallback = Config::resolve_path(None);
    assert!(fallback.ends_with(".feedly/config.json"));
}
