// tests/pipeline_e2e.rs
// Five synthetic articles through score → dedup → sort → bucket.

use chrono::{DateTime, Duration, TimeZone, Utc};
use feedly_intel::config::Config;
use feedly_intel::{rank, Article, PriorityBucket};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap()
}

fn config() -> Config {
    let mut cfg = Config {
        global_keywords: vec!["rust".into(), "AI".into()],
        paywalled_domains: vec!["nikkei.com".into()],
        ..Config::default()
    };
    cfg.trusted_sources.insert("Publickey".into(), 0.9);
    cfg
}

fn articles() -> Vec<Article> {
    vec![
        Article {
            url: Some("https://www.publickey1.jp/blog/rust.html".into()),
            published: Some((now() - Duration::hours(1)).timestamp()),
            source: Some("Publickey".into()),
            body: Some("rust compiler internals".into()),
            engagement_rate: 4.0,
            ..Article::new("Rust 2026 roadmap")
        },
        Article {
            url: Some("https://example.com/ai".into()),
            published: Some((now() - Duration::hours(30)).timestamp_millis()),
            ..Article::new("AI news roundup")
        },
        Article {
            url: Some("https://example.com/weekly".into()),
            ..Article::new("Weekly digest")
        },
        Article {
            url: Some("https://www.nikkei.com/article/rust".into()),
            published: Some((now() - Duration::hours(1)).timestamp()),
            ..Article::new("Market Rust outlook")
        },
        Article {
            url: Some("https://example.com/other".into()),
            ..Article::new("Another digest")
        },
    ]
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn ranked_sorted_stable_and_bucketed() {
    let report = rank(articles(), &config(), now());
    assert_eq!(report.input_count, 5);
    assert_eq!(report.duplicates_removed, 0);
    assert_eq!(report.len(), 5);

    let titles: Vec<&str> = report.items.iter().map(|s| s.article.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Rust 2026 roadmap",
            "Market Rust outlook",
            "AI news roundup",
            "Weekly digest",
            "Another digest",
        ]
    );

    let totals: Vec<f64> = report.items.iter().map(|s| s.scores.total).collect();
    assert!(totals.windows(2).all(|w| w[0] >= w[1]));

    // 20*.3 + 65*.4 + 100*.2 + 90*.1
    assert!(approx(totals[0], 61.0));
    // 0 + 53.33*.4 + 100*.2 + 50*.1
    assert!(approx(totals[1], 46.3));
    // 0 + 53.33*.4 + 50*.2 + 50*.1
    assert!(approx(totals[2], 36.3));
    // relevance 0, freshness 25, trust 50
    assert!(approx(totals[3], 10.0));
    assert!(approx(totals[4], 10.0));

    let buckets: Vec<PriorityBucket> = report.items.iter().map(|s| s.bucket).collect();
    assert_eq!(
        buckets,
        vec![
            PriorityBucket::ShouldRead,
            PriorityBucket::Paywalled,
            PriorityBucket::Skip,
            PriorityBucket::Skip,
            PriorityBucket::Skip,
        ]
    );
}

#[test]
fn every_item_in_exactly_one_bucket() {
    let report = rank(articles(), &config(), now());
    let grouped: usize = report.by_bucket().iter().map(|(_, v)| v.len()).sum();
    assert_eq!(grouped, report.len());

    let counts = report.bucket_counts();
    assert_eq!(counts.iter().map(|(_, n)| *n).sum::<usize>(), report.len());
    let order: Vec<PriorityBucket> = report.by_bucket().into_iter().map(|(b, _)| b).collect();
    assert_eq!(
        order,
        vec![
            PriorityBucket::ShouldRead,
            PriorityBucket::Skip,
            PriorityBucket::Paywalled
        ]
    );
}

#[test]
fn near_duplicates_keep_higher_total() {
    let mut items = articles();
    items.push(Article {
        url: Some("https://mirror.example/rust".into()),
        ..Article::new("Rust 2026 roadmap | Mirror site")
    });
    let report = rank(items, &config(), now());
    assert_eq!(report.duplicates_removed, 1);
    let kept = report
        .items
        .iter()
        .find(|s| s.article.title.starts_with("Rust 2026"))
        .unwrap();
    assert_eq!(kept.article.title, "Rust 2026 roadmap");
}

#[test]
fn titles_equal_in_first_fifty_chars_keep_higher_total() {
    let prefix = "x".repeat(50);
    let cfg = Config::default();
    let stale = Article {
        url: Some("https://a.example/stale".into()),
        ..Article::new(format!("{prefix}B"))
    };
    let fresh = Article {
        url: Some("https://b.example/fresh".into()),
        published: Some((now() - Duration::hours(1)).timestamp()),
        ..Article::new(format!("{prefix}A"))
    };
    let report = rank(vec![stale, fresh], &cfg, now());

    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.len(), 1);
    // neutral relevance 50: fresh 0 + 20 + 20 + 5, stale 0 + 20 + 5 + 5
    assert_eq!(report.items[0].article.title, format!("{prefix}A"));
    assert!(approx(report.items[0].scores.total, 45.0));
}
