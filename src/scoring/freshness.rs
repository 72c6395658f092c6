// src/scoring/freshness.rs
//! Freshness: step function over hours since publication.

use chrono::{DateTime, Utc};

/// Epoch values above this are milliseconds.
const MILLIS_CUTOFF: i64 = 1_000_000_000_000;

/// Score for unknown or old timestamps.
pub const STALE_SCORE: f64 = 25.0;

/// Convert an epoch in seconds or milliseconds to fractional seconds.
/// `None` for missing/zero/negative values.
pub fn epoch_seconds(published: Option<i64>) -> Option<f64> {
    match published {
        Some(p) if p > MILLIS_CUTOFF => Some(p as f64 / 1000.0),
        Some(p) if p > 0 => Some(p as f64),
        _ => None,
    }
}

pub fn freshness_score(published: Option<i64>, now: DateTime<Utc>) -> f64 {
    let Some(secs) = epoch_seconds(published) else {
        return STALE_SCORE;
    };
    let now_secs = now.timestamp_millis() as f64 / 1000.0;
    let hours_ago = (now_secs - secs) / 3600.0;

    if hours_ago <= 24.0 {
        100.0
    } else if hours_ago <= 48.0 {
        50.0
    } else if hours_ago <= 72.0 {
        35.0
    } else {
        STALE_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 3, 9, 0, 0).unwrap()
    }

    fn hours_ago(h: i64) -> i64 {
        (now() - Duration::hours(h)).timestamp()
    }

    #[test]
    fn step_boundaries() {
        assert_eq!(freshness_score(Some(hours_ago(1)), now()), 100.0);
        assert_eq!(freshness_score(Some(hours_ago(24)), now()), 100.0);
        assert_eq!(freshness_score(Some(hours_ago(30)), now()), 50.0);
        assert_eq!(freshness_score(Some(hours_ago(48)), now()), 50.0);
        assert_eq!(freshness_score(Some(hours_ago(50)), now()), 35.0);
        assert_eq!(freshness_score(Some(hours_ago(100)), now()), 25.0);
    }

    #[test]
    fn missing_or_zero_is_stale() {
        assert_eq!(freshness_score(None, now()), 25.0);
        assert_eq!(freshness_score(Some(0), now()), 25.0);
    }

    #[test]
    fn millis_and_seconds_agree() {
        for h in [1, 30, 50, 100] {
            let s = hours_ago(h);
            assert_eq!(
                freshness_score(Some(s), now()),
                freshness_score(Some(s * 1000), now())
            );
        }
    }

    #[test]
    fn future_timestamp_is_fresh() {
        let t = (now() + Duration::hours(3)).timestamp();
        assert_eq!(freshness_score(Some(t), now()), 100.0);
    }
}
