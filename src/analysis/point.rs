//! Speedup from two independent point estimates.
//!
//! Cheaper than the paired estimator when both candidates were already
//! measured, but it inherits any drift between the two measurements.

use crate::result::{ComparisonResult, EstimateWarning, InfinityEstimate};

/// Fractional error of a ratio of two quantities with fractional errors
/// `frac_a` and `frac_b` whose errors have correlation `correlation`.
///
/// Positive correlation reduces the combined error.
pub fn frac_ratio(frac_a: f64, frac_b: f64, correlation: f64) -> f64 {
    let var = frac_a * frac_a + frac_b * frac_b - 2.0 * frac_a * frac_b * correlation;
    var.max(0.0).sqrt()
}

/// Percentage speedup of `a` over `b` from their per-call slopes.
///
/// With `r = slope_b / slope_a` and `σ = frac_ratio(err_a, err_b, ρ)` the
/// result is `(100(r(1−σ) − 1), 100(r − 1), 100(r(1+σ) − 1))`; the error is
/// applied multiplicatively to the ratio.
///
/// If either slope is not positive, or either estimate carries a
/// [`DegenerateMeasurement`](EstimateWarning::DegenerateMeasurement) warning,
/// the ratio means nothing and the result is the uninformative
/// `(−100%, 0%, +∞)`, which always straddles zero.
pub fn point_estimate_speedup(
    a: &InfinityEstimate,
    b: &InfinityEstimate,
    correlation: f64,
) -> ComparisonResult {
    if !is_usable(a) || !is_usable(b) {
        return ComparisonResult {
            min_percent: -100.0,
            median_percent: 0.0,
            max_percent: f64::INFINITY,
        };
    }

    let r = b.slope / a.slope;
    let sigma = frac_ratio(a.relative_error(), b.relative_error(), correlation);

    ComparisonResult {
        min_percent: 100.0 * (r * (1.0 - sigma) - 1.0),
        median_percent: 100.0 * (r - 1.0),
        max_percent: 100.0 * (r * (1.0 + sigma) - 1.0),
    }
}

fn is_usable(estimate: &InfinityEstimate) -> bool {
    estimate.slope > 0.0
        && !estimate
            .warnings
            .iter()
            .any(|w| matches!(w, EstimateWarning::DegenerateMeasurement { .. }))
}
