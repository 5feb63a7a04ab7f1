//! Upper-tail outlier trimming for calibration readings.
//!
//! Clock overhead readings are bounded below by the true read cost but have an
//! unbounded upper tail (interrupts, preemption, SMIs). A handful of those
//! readings would dominate the mean and standard deviation, so readings above
//! a high percentile are discarded before the statistics are accumulated.

use crate::statistics::compute_quantile;
use crate::types::Tick;

/// What trimming did to a set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierStats {
    /// Readings before trimming.
    pub total_samples: usize,
    /// Readings dropped for lying above the threshold.
    pub outliers_removed: usize,
    /// Largest reading kept; `Tick::MAX` when nothing was trimmed.
    pub threshold: Tick,
}

impl OutlierStats {
    /// Readings that survived.
    pub fn retained(&self) -> usize {
        self.total_samples - self.outliers_removed
    }

    /// Share of readings dropped, in [0, 1].
    pub fn outlier_fraction(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.outliers_removed as f64 / self.total_samples as f64
        }
    }
}

/// Drop readings above the `percentile` quantile (0.999 keeps the lowest
/// 99.9%). Survivors keep their original order.
///
/// A percentile of 1.0 or more disables trimming.
pub fn filter_outliers(samples: &[Tick], percentile: f64) -> (Vec<Tick>, OutlierStats) {
    if percentile >= 1.0 || samples.is_empty() {
        let stats = OutlierStats {
            total_samples: samples.len(),
            outliers_removed: 0,
            threshold: Tick::MAX,
        };
        return (samples.to_vec(), stats);
    }

    let mut scratch: Vec<f64> = samples.iter().map(|&t| t as f64).collect();
    // Rounded up so a quantile that lands between two equal ticks keeps both.
    let threshold = compute_quantile(&mut scratch, percentile.max(0.0)).ceil() as Tick;

    let kept: Vec<Tick> = samples.iter().copied().filter(|&t| t <= threshold).collect();
    let stats = OutlierStats {
        total_samples: samples.len(),
        outliers_removed: samples.len() - kept.len(),
        threshold,
    };
    (kept, stats)
}
