// src/lib.rs
// Public library surface for the CLI and integration tests.

pub mod article;
pub mod config;
pub mod dedup;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod scoring;
pub mod social;
pub mod zipcode;

// ---- Re-exports for stable public API ----
pub use article::{Article, SignalCount, SignalSource, SocialMetrics};
pub use config::Config;
pub use pipeline::{rank, rank_with_social, RankedReport, ScoredArticle};
pub use scoring::{PriorityBucket, ScoreBreakdown, Scorer};
