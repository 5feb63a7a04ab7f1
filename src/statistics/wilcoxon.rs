//! Wilcoxon signed-rank test and Hodges–Lehmann confidence interval.
//!
//! Both are distribution-free: they only assume the paired differences are
//! symmetric about their centre, which makes them robust to the heavy upper
//! tail that preemption and burst load put on timing data.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::quantile::{median, order_statistic};

/// Outcome of a Wilcoxon signed-rank test (normal approximation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignedRankTest {
    /// Number of non-zero differences ranked.
    pub n: usize,
    /// Sum of ranks of positive differences.
    pub w_plus: f64,
    /// Sum of ranks of negative differences.
    pub w_minus: f64,
    /// Standardised statistic with tie-corrected variance.
    pub z: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Hodges–Lehmann location estimate with its signed-rank confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignedRankInterval {
    /// Lower confidence bound.
    pub lower: f64,
    /// Median of the Walsh averages.
    pub estimate: f64,
    /// Upper confidence bound.
    pub upper: f64,
    /// The accompanying test against a zero shift.
    pub test: SignedRankTest,
}

impl SignedRankInterval {
    /// Half the interval width.
    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }

    /// Whether the interval contains zero.
    pub fn contains_zero(&self) -> bool {
        self.lower <= 0.0 && self.upper >= 0.0
    }
}

/// Ranks of `values` (1-based), ties receiving the average of their ranks.
///
/// Also returns `Σ (t³ − t)` over tie groups for the variance correction.
pub fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_unstable_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start+1..=end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }
    (ranks, tie_term)
}

/// Signed-rank test of `diffs` against a zero shift.
///
/// Zero differences are dropped. With nothing left to rank the test is
/// uninformative (`z = 0`, `p = 1`).
pub fn signed_rank_test(diffs: &[f64]) -> SignedRankTest {
    let nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let n = nonzero.len();
    if n == 0 {
        return SignedRankTest {
            n: 0,
            w_plus: 0.0,
            w_minus: 0.0,
            z: 0.0,
            p_value: 1.0,
        };
    }

    let magnitudes: Vec<f64> = nonzero.iter().map(|d| d.abs()).collect();
    let (ranks, tie_term) = average_ranks(&magnitudes);

    let w_plus: f64 = nonzero
        .iter()
        .zip(&ranks)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| r)
        .sum();
    let nf = n as f64;
    let total = nf * (nf + 1.0) / 2.0;
    let w_minus = total - w_plus;

    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_term / 48.0;
    let z = if variance > 0.0 {
        (w_plus - total / 2.0) / variance.sqrt()
    } else {
        0.0
    };

    let p_value = Normal::new(0.0, 1.0)
        .map(|normal| (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0))
        .unwrap_or(1.0);

    SignedRankTest {
        n,
        w_plus,
        w_minus,
        z,
        p_value,
    }
}

/// Hodges–Lehmann estimate and confidence interval of the centre of `diffs`.
///
/// Forms the `M = n(n+1)/2` Walsh averages `(d_i + d_j)/2`, `i ≤ j`, and
/// takes the order statistics at the critical rank
/// `C = ⌊n(n+1)/4 − z·√(n(n+1)(2n+1)/24)⌋` and `M − 1 − C`, with
/// `z = Φ⁻¹((1 + confidence)/2)`. For very small `n` the interval falls back
/// to the full range of Walsh averages.
///
/// Returns `None` for an empty or non-finite input or a confidence level
/// outside (0, 1).
pub fn signed_rank_interval(diffs: &[f64], confidence: f64) -> Option<SignedRankInterval> {
    if diffs.is_empty() || diffs.iter().any(|d| !d.is_finite()) {
        return None;
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return None;
    }

    let n = diffs.len();
    let mut walsh = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in i..n {
            walsh.push((diffs[i] + diffs[j]) / 2.0);
        }
    }
    let m = walsh.len();

    let z = Normal::new(0.0, 1.0)
        .ok()?
        .inverse_cdf((1.0 + confidence) / 2.0);
    let nf = n as f64;
    let spread = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0).sqrt();
    let critical = (nf * (nf + 1.0) / 4.0 - z * spread).floor();
    let c = if critical > 0.0 {
        (critical as usize).min((m - 1) / 2)
    } else {
        0
    };

    let lower = order_statistic(&mut walsh, c);
    let upper = order_statistic(&mut walsh, m - 1 - c);
    let estimate = median(&mut walsh);

    Some(SignedRankInterval {
        lower,
        estimate,
        upper,
        test: signed_rank_test(diffs),
    })
}
