//! # Source Trust
//!
//! Maps a publisher name to a trust score in `[0, 100]` using the configured
//! `{name fragment → trust fraction}` table.
//!
//! - Case-insensitive substring lookup ("The Verge" hits fragment "verge").
//! - Fragments are tried in configuration order; the first hit wins.
//! - Fractions outside `[0.0, 1.0]` are clamped.
//! - Unknown or missing sources get the neutral default.

use indexmap::IndexMap;

/// Score for sources not present in the table.
pub const NEUTRAL_TRUST: f64 = 50.0;

pub fn source_trust_score(source: Option<&str>, trusted: &IndexMap<String, f64>) -> f64 {
    let Some(name) = source.map(str::trim).filter(|s| !s.is_empty()) else {
        return NEUTRAL_TRUST;
    };
    let name = name.to_lowercase();

    for (fragment, &trust) in trusted {
        let f = fragment.trim().to_lowercase();
        if f.is_empty() {
            continue;
        }
        if name.contains(&f) {
            return clamp01(trust) * 100.0;
        }
    }
    NEUTRAL_TRUST
}

/// Clamp to [0.0, 1.0]; NaN counts as 0.
fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
