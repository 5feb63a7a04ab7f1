//! Estimators built on top of calibrated clocks.
//!
//! This module implements the two measurement strategies:
//!
//! 1. **Infinity time**: doubling batch sizes and a least-absolute-deviation
//!    fit give the steady-state cost of one call.
//! 2. **Paired speedup**: randomized matched pairs summarised by a Wilcoxon
//!    signed-rank interval give the relative speed of two candidates.
//!
//! Two infinity-time estimates can also be combined into a speedup directly
//! (`point_estimate_speedup`), at the price of sensitivity to drift between
//! the two measurements.
//!
//! Estimators hold no state between calls; everything they need comes in
//! through the clock, its [`Calibration`](crate::measurement::Calibration)
//! and the [`Config`](crate::Config).

mod infinity;
mod paired;
mod point;

pub use infinity::estimate_infinity_time;
pub use paired::estimate_paired_speedup;
pub use point::{frac_ratio, point_estimate_speedup};

use crate::types::Tick;

/// `log2` of a tick count, treating zero as one tick.
#[inline]
pub(crate) fn log2_ticks(ticks: Tick) -> f64 {
    (ticks.max(1) as f64).log2()
}
