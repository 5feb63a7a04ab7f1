//! Least-absolute-deviation (L1) straight-line regression.
//!
//! Minimises `Σ |y_i − a − b·x_i|`. For a fixed slope `b` the optimal
//! intercept is `median(y − b·x)`, which leaves a convex piecewise-linear
//! objective in `b` alone whose breakpoints are the pairwise slopes
//! `(y_j − y_i)/(x_j − x_i)`. The minimum lies on a breakpoint, so a binary
//! search over the sorted breakpoints finds it exactly.
//!
//! The sample sets this is used on are small (tens of points), so the
//! quadratic breakpoint set is not a concern.

use serde::{Deserialize, Serialize};

use super::quantile::median;

/// Result of a LAD fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LadFit {
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Median absolute residual of the fit.
    pub mad: f64,
}

impl LadFit {
    /// Value of the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit `ys ≈ intercept + slope·xs` minimising absolute residuals.
///
/// Returns `None` when there are fewer than two points, the slices differ in
/// length, any value is non-finite, or every `x` is identical (slope is
/// undetermined).
pub fn fit_lad(xs: &[f64], ys: &[f64]) -> Option<LadFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return None;
    }

    let mut breakpoints = Vec::with_capacity(xs.len() * (xs.len() - 1) / 2);
    for i in 0..xs.len() {
        for j in (i + 1)..xs.len() {
            let dx = xs[j] - xs[i];
            if dx != 0.0 {
                breakpoints.push((ys[j] - ys[i]) / dx);
            }
        }
    }
    if breakpoints.is_empty() {
        return None;
    }
    breakpoints.sort_unstable_by(|a, b| a.total_cmp(b));
    breakpoints.dedup();

    let mut scratch = vec![0.0; xs.len()];

    // Convex objective: the minimum is at the first index whose successor is
    // not lower.
    let (mut lo, mut hi) = (0usize, breakpoints.len() - 1);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let here = profiled_cost(xs, ys, breakpoints[mid], &mut scratch).0;
        let next = profiled_cost(xs, ys, breakpoints[mid + 1], &mut scratch).0;
        if here <= next {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    let slope = breakpoints[lo];
    let (_, intercept) = profiled_cost(xs, ys, slope, &mut scratch);

    for (r, (&x, &y)) in scratch.iter_mut().zip(xs.iter().zip(ys)) {
        *r = (y - intercept - slope * x).abs();
    }
    let mad = median(&mut scratch);

    Some(LadFit {
        slope,
        intercept,
        mad,
    })
}

/// Objective value at slope `b` with the intercept profiled out.
/// Returns `(cost, intercept)`.
fn profiled_cost(xs: &[f64], ys: &[f64], b: f64, scratch: &mut [f64]) -> (f64, f64) {
    for (r, (&x, &y)) in scratch.iter_mut().zip(xs.iter().zip(ys)) {
        *r = y - b * x;
    }
    let a = median(scratch);
    let cost = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| (y - a - b * x).abs())
        .sum();
    (cost, a)
}
