// tests/input_formats.rs
use feedly_intel::ingest::feedly::{mapping_path_for, write_fetch_output};
use chrono::{TimeZone, Utc};
use feedly_intel::config::Config;
use feedly_intel::ingest::{load_articles, read_article_file, ArticleFile};
use feedly_intel::rank;
use serde_json::json;
use std::fs;

const CATEGORIZED: &str = r#"{
  "metadata": {"generated_at": "2026-02-03T09:00:00+09:00", "total_articles": 3, "categories_count": 2, "unread_only": true},
  "categories": {
    "ai": {
      "name": "AI News", "slug": "ai", "keywords": ["llm"],
      "articles": [
        {"id": "e1", "title": "LLM update", "url": "https://a.example/1", "published": 1770076800000,
         "content": "plain body", "engagement_rate": 3.5, "source": {"title": "Publickey"}},
        {"id": "e2", "title": "No url here", "content": "x"}
      ]
    },
    "dev": {
      "name": "Dev", "slug": "dev", "keywords": [],
      "articles": [{"id": "e3", "title": "Cargo tips", "url": "https://b.example/3"}]
    }
  }
}"#;

const LEGACY: &str = r#"{
  "items": [
    {"id": "r1", "title": "Raw entry", "canonicalUrl": "https://c.example/r1",
     "engagementRate": 2, "origin": {"title": "ITmedia"},
     "summary": {"content": "<p>Summary &amp; more</p>"}},
    {"id": "r2", "alternate": [{"href": "https://d.example/r2"}], "originId": "https://o.example/r2"}
  ]
}"#;

#[test]
fn categorized_file_keeps_category_order_and_keywords() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("articles.json");
    fs::write(&p, CATEGORIZED).unwrap();

    let arts = load_articles(&p).unwrap();
    assert_eq!(arts.len(), 3);
    assert_eq!(arts[0].keywords, vec!["llm"]);
    assert_eq!(arts[0].source.as_deref(), Some("Publickey"));
    assert_eq!(arts[0].engagement_rate, 3.5);
    assert_eq!(arts[0].body.as_deref(), Some("plain body"));
    assert_eq!(arts[1].url, None);
    assert_eq!(arts[2].category.as_deref(), Some("Dev"));
}

#[test]
fn legacy_file_reads_raw_entries() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("legacy.json");
    fs::write(&p, LEGACY).unwrap();

    let arts = load_articles(&p).unwrap();
    assert_eq!(arts.len(), 2);
    assert_eq!(arts[0].url.as_deref(), Some("https://c.example/r1"));
    assert_eq!(arts[0].source.as_deref(), Some("ITmedia"));
    assert_eq!(arts[0].engagement_rate, 2.0);
    assert_eq!(arts[0].body.as_deref(), Some("Summary & more"));
    assert_eq!(arts[1].url.as_deref(), Some("https://d.example/r2"));
    assert_eq!(arts[1].title, "No Title");
}

#[test]
fn entry_ids_for_mark_read() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("articles.json");
    fs::write(&p, CATEGORIZED).unwrap();
    assert_eq!(read_article_file(&p).unwrap().entry_ids(), vec!["e1", "e2", "e3"]);
}

#[test]
fn fetch_output_writes_mapping_alongside() {
    let file = match serde_json::from_str::<ArticleFile>(CATEGORIZED).unwrap() {
        ArticleFile::Categorized(f) => f,
        ArticleFile::Legacy(_) => panic!("expected categorized"),
    };
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("feedly.json");

    let mapping = write_fetch_output(&file, &out).unwrap();
    assert_eq!(mapping, mapping_path_for(&out));

    let m: serde_json::Value = serde_json::from_str(&fs::read_to_string(&mapping).unwrap()).unwrap();
    assert_eq!(m["https://a.example/1"], "e1");
    assert_eq!(m["https://b.example/3"], "e3");
    assert_eq!(m.as_object().unwrap().len(), 2);

    // the written file loads back as the same shape
    let again = load_articles(&out).unwrap();
    assert_eq!(again.len(), 3);
}

#[test]
fn keyword_deep_in_a_long_body_still_scores() {
    let body = format!("<p>{}kubernetes</p>", "lorem ".repeat(1000));
    let file = json!({"items": [{"id": "k1", "title": "Cluster notes", "content": {"content": body}}]});
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("legacy.json");
    fs::write(&p, file.to_string()).unwrap();

    let arts = load_articles(&p).unwrap();
    assert!(arts[0].body.as_deref().unwrap().ends_with("kubernetes"));

    let cfg = Config {
        global_keywords: vec!["kubernetes".into()],
        ..Config::default()
    };
    let now = Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap();
    let report = rank(arts, &cfg, now);
    let scores = &report.items[0].scores;
    assert!(scores.relevance >= 30.0, "relevance {}", scores.relevance);
    assert_eq!(scores.matched_keywords, vec!["kubernetes"]);
}
