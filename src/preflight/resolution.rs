//! Clock resolution check.
//!
//! Runs on the raw overhead calibration readings. On a coarse counter
//! (e.g. the 24 MHz virtual timer on Apple Silicon) reading the clock is
//! cheaper than one tick, so most no-op readings are exactly zero and the
//! measured overhead and jitter say more about quantisation than about the
//! clock. The estimators still work, because they batch calls, but single
//! trials of fast operations are unreliable.

use serde::{Deserialize, Serialize};

use crate::types::Tick;

/// Warning from the resolution check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolutionWarning {
    /// Most no-op readings were zero: the clock ticks slower than it can be
    /// read.
    ///
    /// This is a critical warning.
    InsufficientResolution {
        /// Number of distinct readings observed.
        unique_values: usize,
        /// Total number of readings.
        total_samples: usize,
        /// Fraction of readings that were exactly zero.
        zero_fraction: f64,
    },

    /// Readings move in steps as large as the overhead itself.
    HighQuantization {
        /// Smallest positive difference between distinct readings.
        granularity: Tick,
        /// Median reading.
        median_reading: Tick,
    },
}

impl ResolutionWarning {
    /// Check if this warning indicates a critical issue.
    pub fn is_critical(&self) -> bool {
        matches!(self, ResolutionWarning::InsufficientResolution { .. })
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            ResolutionWarning::InsufficientResolution {
                unique_values,
                total_samples,
                zero_fraction,
            } => format!(
                "Clock is coarser than its own read cost: {} distinct values in {} \
                 no-op readings, {:.1}% of them zero. Batch more calls per trial.",
                unique_values,
                total_samples,
                zero_fraction * 100.0
            ),
            ResolutionWarning::HighQuantization {
                granularity,
                median_reading,
            } => format!(
                "Clock readings are quantised in steps of {} ticks against a median \
                 overhead of {} ticks; jitter estimates will be coarse.",
                granularity, median_reading
            ),
        }
    }
}

/// Fewest readings worth assessing.
const MIN_READINGS: usize = 100;

/// Fraction of zero readings that triggers the critical warning.
const CRITICAL_ZERO_FRACTION: f64 = 0.5;

/// Inspect calibration readings for signs of a coarse clock.
pub fn resolution_check(readings: &[Tick]) -> Option<ResolutionWarning> {
    if readings.len() < MIN_READINGS {
        return None;
    }

    let mut sorted = readings.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    let unique_values = sorted.len();

    let zero_count = readings.iter().filter(|&&t| t == 0).count();
    let zero_fraction = zero_count as f64 / readings.len() as f64;

    if zero_fraction > CRITICAL_ZERO_FRACTION {
        return Some(ResolutionWarning::InsufficientResolution {
            unique_values,
            total_samples: readings.len(),
            zero_fraction,
        });
    }

    let granularity = sorted.windows(2).map(|w| w[1] - w[0]).min()?;

    let mut all = readings.to_vec();
    let mid = all.len() / 2;
    let (_, &mut median_reading, _) = all.select_nth_unstable(mid);

    if granularity >= median_reading.max(1) {
        return Some(ResolutionWarning::HighQuantization {
            granularity,
            median_reading,
        });
    }

    None
}
