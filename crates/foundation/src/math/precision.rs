//! Deterministic float ordering.
//!
//! Nearest-neighbour ranking and "closest candidate wins" decisions must not
//! depend on NaN payloads or the sign of zero, so every float comparison that
//! feeds an ordering goes through these helpers.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Rounds `v` to the nearest multiple of `step` and returns the multiple count.
///
/// Used to build structural cache keys from continuous positions. A
/// non-positive or non-finite `step` falls back to whole units.
pub fn quantize(v: f64, step: f64) -> i64 {
    let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
    (canonical_f64(v) / step).round() as i64
}
