//! Result types returned by the estimators.

use serde::{Deserialize, Serialize};

use crate::statistics::SignedRankTest;
use crate::types::Sample;

/// Percentage speedup of A over B with a confidence range.
///
/// Positive values mean A is faster. Every field is a percentage:
/// `min_percent <= median_percent <= max_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Lower bound.
    pub min_percent: f64,
    /// Central estimate.
    pub median_percent: f64,
    /// Upper bound.
    pub max_percent: f64,
}

impl ComparisonResult {
    /// Whether the range includes "no difference".
    ///
    /// If it does, the two candidates are not distinguishable at the
    /// precision reached; tighten the precision target to resolve them.
    pub fn straddles_zero(&self) -> bool {
        self.min_percent <= 0.0 && self.max_percent >= 0.0
    }

    /// Width of the range in percentage points.
    pub fn width(&self) -> f64 {
        self.max_percent - self.min_percent
    }
}

/// A non-fatal problem with a finished estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EstimateWarning {
    /// The iteration or time budget ran out before the precision target was
    /// met. The estimate is the best available, not a converged one.
    NonConvergence {
        /// Relative precision reached, in percent; infinite when too few
        /// levels or pairs were timed to estimate it.
        achieved_percent: f64,
        /// Relative precision requested, in percent.
        target_percent: f64,
        /// Largest batch (or pair count) reached.
        iterations: u64,
        /// Wall time spent.
        elapsed_ms: u64,
    },

    /// The per-call cost is within twice the clock jitter; the estimate is
    /// dominated by measurement noise.
    DegenerateMeasurement {
        /// Estimated per-call cost in ticks.
        slope_ticks: f64,
        /// Calibrated clock jitter in ticks.
        jitter_sigma: f64,
    },
}

impl EstimateWarning {
    /// Whether the estimate should not be trusted at all.
    pub fn is_critical(&self) -> bool {
        matches!(self, EstimateWarning::DegenerateMeasurement { .. })
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            EstimateWarning::NonConvergence {
                achieved_percent,
                target_percent,
                iterations,
                elapsed_ms,
            } if achieved_percent.is_finite() => format!(
                "Did not converge: reached {:.2}% against a {:.2}% target after {} \
                 iterations in {} ms. Raise the iteration or time budget, or relax \
                 the precision target.",
                achieved_percent, target_percent, iterations, elapsed_ms
            ),
            EstimateWarning::NonConvergence {
                target_percent,
                iterations,
                elapsed_ms,
                ..
            } => format!(
                "Did not converge: no precision could be estimated against a {:.2}% \
                 target after {} iterations in {} ms. Raise the iteration or time \
                 budget.",
                target_percent, iterations, elapsed_ms
            ),
            EstimateWarning::DegenerateMeasurement {
                slope_ticks,
                jitter_sigma,
            } => format!(
                "Per-call cost of {:.2} ticks is within twice the clock jitter \
                 ({:.2} ticks); the operation is too fast for this clock.",
                slope_ticks, jitter_sigma
            ),
        }
    }

    pub(crate) fn log(&self) {
        tracing::warn!("{}", self.description());
    }
}

/// Measurement quality assessment based on relative precision reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MeasurementQuality {
    /// Better than 1%.
    Excellent,
    /// 1% to 5%.
    Good,
    /// 5% to 20%.
    Poor,
    /// Worse than 20%, or not a finite number.
    TooNoisy,
}

impl MeasurementQuality {
    /// Classify a relative precision given in percent.
    pub fn from_relative_error_percent(percent: f64) -> Self {
        if !percent.is_finite() || percent < 0.0 {
            return MeasurementQuality::TooNoisy;
        }

        if percent < 1.0 {
            MeasurementQuality::Excellent
        } else if percent < 5.0 {
            MeasurementQuality::Good
        } else if percent < 20.0 {
            MeasurementQuality::Poor
        } else {
            MeasurementQuality::TooNoisy
        }
    }
}

/// Point estimate of steady-state per-call cost.
///
/// All quantities are in clock ticks; convert with a
/// [`UnitConverter`](crate::UnitConverter) only for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfinityEstimate {
    /// Ticks per call (slope of elapsed against call count).
    pub slope: f64,
    /// Fixed cost per batch, including clock overhead.
    pub intercept: f64,
    /// Median absolute residual of the fit.
    pub mad: f64,
    /// Slope of log2(elapsed) against log2(calls) over the convergence
    /// window; 1.0 is perfect doubling.
    pub doubling_exponent: f64,
    /// Calibrated clock overhead used for [`net_intercept`](Self::net_intercept).
    pub overhead_mean: f64,
    /// Calibrated clock jitter.
    pub jitter_sigma: f64,
    /// Requested relative precision as a fraction.
    pub precision_target: f64,
    /// Every timed batch, in order of non-decreasing call count.
    pub samples: Vec<Sample>,
    /// Whether the doubling test passed within budget.
    pub converged: bool,
    /// Non-fatal problems with this estimate.
    pub warnings: Vec<EstimateWarning>,
}

impl InfinityEstimate {
    /// Fixed cost per batch with the clock overhead removed.
    pub fn net_intercept(&self) -> f64 {
        self.intercept - self.overhead_mean
    }

    /// Relative error of the slope as a fraction.
    ///
    /// The precision target when converged, otherwise the larger of the
    /// target and the measured deviation from perfect doubling.
    pub fn relative_error(&self) -> f64 {
        let achieved = (self.doubling_exponent - 1.0).abs();
        if self.converged {
            self.precision_target
        } else if achieved.is_nan() {
            f64::INFINITY
        } else {
            achieved.max(self.precision_target)
        }
    }

    /// `(low, estimate, high)` per-call cost at two relative errors either side.
    pub fn per_call_bounds(&self) -> (f64, f64, f64) {
        let p = self.relative_error();
        (self.slope * (1.0 - 2.0 * p), self.slope, self.slope * (1.0 + 2.0 * p))
    }

    /// Quality classification of the relative error.
    pub fn quality(&self) -> MeasurementQuality {
        MeasurementQuality::from_relative_error_percent(self.relative_error() * 100.0)
    }

    /// Largest batch size timed.
    pub fn max_iterations(&self) -> u64 {
        self.samples.last().map(|s| s.iterations).unwrap_or(0)
    }
}

/// Matched-pair speedup estimate of A over B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedSpeedup {
    /// Speedup percentages (positive means A is faster).
    pub interval: ComparisonResult,
    /// Matched pairs used.
    pub pairs: usize,
    /// Calls per timed trial.
    pub quantum: u64,
    /// Whether the interval reached the precision target.
    pub converged: bool,
    /// Confidence level of the interval.
    pub confidence_level: f64,
    /// Wilcoxon signed-rank test of the log ratios against zero.
    pub test: SignedRankTest,
    /// Non-fatal problems with this estimate.
    pub warnings: Vec<EstimateWarning>,
}

impl PairedSpeedup {
    /// Whether the difference is significant at the configured confidence.
    pub fn is_significant(&self) -> bool {
        !self.interval.straddles_zero()
    }
}
