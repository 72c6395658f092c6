// src/report/mod.rs
//! Markdown rendering of a ranked run.

pub mod bookmarks;

use crate::article::SignalSource;
use crate::config::Config;
use crate::pipeline::{RankedReport, ScoredArticle};
use crate::scoring::engagement::{FEED_RATE_CEILING, FEED_RATE_MULTIPLIER};
use crate::social::{hackernews, hatena};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveDate, Weekday};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub use bookmarks::{parse_saved_urls, resolve_entry_ids, BookmarkSelection};

/// Maximum title length in a table row, in characters.
pub const TITLE_CELL_CHARS: usize = 50;
/// Matched keywords shown per row.
pub const KEYWORD_CELL_MAX: usize = 3;

pub fn japanese_weekday(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// `{output_dir}/YYYY-MM/YYYY-MM-DD（曜）_feeds-report.md`
pub fn default_output_path(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(date.format("%Y-%m").to_string()).join(format!(
        "{}（{}）_feeds-report.md",
        date.format("%Y-%m-%d"),
        japanese_weekday(date.weekday())
    ))
}

/// Title for a table cell: truncated, with table and link metacharacters
/// folded to their full-width forms.
pub fn table_title(title: &str) -> String {
    title
        .chars()
        .take(TITLE_CELL_CHARS)
        .map(|c| match c {
            '|' => '｜',
            '[' => '［',
            ']' => '］',
            c => c,
        })
        .collect()
}

fn pct(w: f64) -> String {
    format!("{}%", (w * 100.0).round() as i64)
}

fn write_front_matter(out: &mut String, generated: DateTime<Local>) {
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "createDate: {}", generated.format("%Y-%m-%d"));
    let _ = writeln!(out, "tags:");
    let _ = writeln!(out, "  - \"#feedly\"");
    let _ = writeln!(out, "  - \"#intelligence-report\"");
    let _ = writeln!(out, "---\n");
}

fn write_legend(out: &mut String, config: &Config) {
    let w = &config.scoring.weights;
    let t = &config.scoring.thresholds;
    let _ = writeln!(out, "## スコアリング基準\n");
    let _ = writeln!(out, "### 総合スコア\n");
    let _ = writeln!(
        out,
        "```\n総合スコア = 注目度×{} + 関連度×{} + 鮮度×{} + 信頼度×{}\n```\n",
        pct(w.engagement),
        pct(w.relevance),
        pct(w.freshness),
        pct(w.source_trust)
    );
    let _ = writeln!(
        out,
        "**ライン引き**: MUST READ≧{} / SHOULD READ≧{} / OPTIONAL≧{}\n",
        t.must_read, t.should_read, t.optional
    );
    let _ = writeln!(out, "### 注目度 (0-100)\n");
    let _ = writeln!(out, "| 指標 | 計算式 | 上限 |");
    let _ = writeln!(out, "|------|--------|------|");
    let _ = writeln!(
        out,
        "| Feedly | engagementRate × {} | {}点 |",
        FEED_RATE_MULTIPLIER, FEED_RATE_CEILING
    );
    let _ = writeln!(
        out,
        "| はてブ | ブックマーク数 × {} | {}点 |",
        SignalSource::Hatena.multiplier(),
        SignalSource::Hatena.ceiling()
    );
    let _ = writeln!(
        out,
        "| HN | points × {} | {}点 |\n",
        SignalSource::HackerNews.multiplier(),
        SignalSource::HackerNews.ceiling()
    );
    let _ = writeln!(out, "### 関連度 (0-100)\n");
    let _ = writeln!(out, "- キーワードマッチで計算（タイトルマッチは2倍の重み）");
    let _ = writeln!(out, "- 1つ以上マッチ: 基礎点30 + マッチ率に応じて最大70点追加");
    let _ = writeln!(out, "- マッチなし: 0点\n");
    let _ = writeln!(out, "### 鮮度 (0-100)\n");
    let _ = writeln!(out, "| 経過時間 | スコア |");
    let _ = writeln!(out, "|----------|--------|");
    let _ = writeln!(out, "| 24時間以内 | 100 |");
    let _ = writeln!(out, "| 48時間以内 | 50 |");
    let _ = writeln!(out, "| 72時間以内 | 35 |");
    let _ = writeln!(out, "| それ以上 | 25 |\n");
    let _ = writeln!(out, "### 信頼度 (0-100)\n");
    let _ = writeln!(out, "- 設定ファイルで定義されたソース: 定義値 × 100");
    let _ = writeln!(out, "- 未定義のソース: 50\n");
    let _ = writeln!(out, "---\n");
}

fn row(index: usize, item: &ScoredArticle) -> String {
    let s = &item.scores;
    let url = item.article.link();
    let title = table_title(&item.article.title);
    let title_cell = match url {
        Some(u) => format!("[{title}]({u})"),
        None => title,
    };

    let hatena_count = s
        .engagement_detail
        .signal(SignalSource::Hatena)
        .map(|x| x.count)
        .unwrap_or(0);
    let hatena_cell = match url {
        Some(u) if hatena_count > 0 => format!("[{hatena_count}]({})", hatena::entry_url(u)),
        _ => hatena_count.to_string(),
    };

    let hn = s.engagement_detail.signal(SignalSource::HackerNews);
    let hn_count = hn.map(|x| x.count).unwrap_or(0);
    let hn_cell = match hn.and_then(|x| x.item_id.as_deref()) {
        Some(id) if hn_count > 0 => format!("[{hn_count}]({})", hackernews::item_url(id)),
        _ => hn_count.to_string(),
    };

    let keywords = s
        .matched_keywords
        .iter()
        .take(KEYWORD_CELL_MAX)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
        .replace('|', "｜");

    format!(
        "| {index} | {title_cell} | **{:.1}** | {} | {} | {hatena_cell} | {hn_cell} | {} | {} | {keywords} | [ ] | [ ] |",
        s.total, s.engagement, s.engagement_detail.feed, s.relevance, s.freshness
    )
}

/// Full report document.
pub fn render_markdown(report: &RankedReport, config: &Config, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    write_front_matter(&mut out, generated);

    let _ = writeln!(out, "# Feedly インテリジェンスレポート\n");
    let _ = writeln!(out, "**生成日**: {}", generated.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "**記事数**: {}件（重複除去後）\n", report.len());

    write_legend(&mut out, config);

    for (bucket, items) in report.by_bucket() {
        let _ = writeln!(out, "## {} ({}件)\n", bucket.label(), items.len());
        let _ = writeln!(
            out,
            "| # | 記事 | スコア | 注目 | Feedly | はてブ | HN | 関連 | 鮮度 | マッチKW | 読了 | 保存 |"
        );
        let _ = writeln!(
            out,
            "|---|------|--------|------|--------|--------|-----|------|------|----------|------|------|"
        );
        for (i, item) in items.iter().enumerate() {
            let _ = writeln!(out, "{}", row(i + 1, item));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "---\n");
    let _ = writeln!(out, "## 統計\n");
    let _ = writeln!(out, "| 優先度 | 件数 |");
    let _ = writeln!(out, "|--------|------|");
    for (bucket, n) in report.bucket_counts() {
        let _ = writeln!(out, "| {} | {} |", bucket.label(), n);
    }
    if report.duplicates_removed > 0 {
        let _ = writeln!(out, "\n重複除去: {}件", report.duplicates_removed);
    }
    out
}

pub fn write_report(path: &Path, markdown: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    std::fs::write(path, markdown).with_context(|| format!("write report {}", path.display()))
}
