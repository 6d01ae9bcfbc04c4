//! Curve Selection

use crate::curve::RatingCurve;
use chrono::{DateTime, Utc};

/// Pick the curve that applies to a reading taken at `at`.
///
/// Candidates must be active and their effective window
/// `[effective_from, effective_to)` must contain the timestamp. When
/// calibration windows overlap, the curve with the latest
/// `effective_from` wins; equal starts fall back to the larger id so
/// the choice stays deterministic.
pub fn select_curve<'a>(curves: &'a [RatingCurve], at: DateTime<Utc>) -> Option<&'a RatingCurve> {
    curves
        .iter()
        .filter(|c| c.is_active && c.window_contains(at))
        .max_by(|a, b| {
            a.effective_from
                .cmp(&b.effective_from)
                .then(a.id.cmp(&b.id))
        })
}

/// Report pairs of active same-sensor curves whose effective windows
/// intersect. Intended for calibration review tooling; selection itself
/// tolerates overlaps via the tie-break in [`select_curve`].
pub fn find_overlaps(curves: &[RatingCurve]) -> Vec<(i64, i64)> {
    let mut pairs = Vec::new();
    for (i, a) in curves.iter().enumerate() {
        if !a.is_active {
            continue;
        }
        for b in curves.iter().skip(i + 1) {
            if !b.is_active || a.sensor_id != b.sensor_id {
                continue;
            }
            if windows_intersect(a, b) {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}

// Half-open intersection; an open end behaves as +infinity.
fn windows_intersect(a: &RatingCurve, b: &RatingCurve) -> bool {
    let a_before_b_ends = match b.effective_to {
        Some(end) => a.effective_from < end,
        None => true,
    };
    let b_before_a_ends = match a.effective_to {
        Some(end) => b.effective_from < end,
        None => true,
    };
    a_before_b_ends && b_before_a_ends
}
