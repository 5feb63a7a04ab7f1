//! Configuration for a measurement session.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fewest calibration repetitions accepted.
///
/// At 1,000 repetitions the standard error of the overhead mean is about 3%
/// of the jitter itself.
pub const MIN_CALIBRATION_REPETITIONS: usize = 1_000;

/// Smallest `min_pairs` accepted by the paired estimator.
pub const MIN_PAIRS: usize = 4;

/// Largest `max_pairs` accepted; the interval needs n(n+1)/2 Walsh averages.
pub const MAX_PAIRS: usize = 4_096;

/// Configuration options for `SpeedupOracle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Acceptable relative error of an estimate, in percent (default: 10.0).
    pub precision_target_percent: f64,

    /// Confidence level of the paired speedup interval (default: 0.95).
    pub confidence_level: f64,

    /// Upper bound on calls in a single timed batch (default: 2^24).
    pub max_iterations: u64,

    /// Wall-time budget for one estimation in milliseconds (default: 10,000).
    pub max_duration_ms: u64,

    /// Batches timed at each iteration count by the doubling estimator (default: 3).
    pub samples_per_level: usize,

    /// Number of most recent doubling levels tested for convergence (default: 4).
    pub convergence_window: usize,

    /// No-op timings taken when calibrating overhead (default: 10,000).
    pub calibration_repetitions: usize,

    /// Percentile above which calibration readings are discarded (default: 0.999).
    /// Set to 1.0 to disable trimming.
    pub calibration_outlier_percentile: f64,

    /// Length of each frequency calibration busy-wait in milliseconds (default: 10).
    pub frequency_reference_ms: u64,

    /// Number of frequency calibration busy-waits (default: 5).
    pub frequency_rounds: usize,

    /// Untimed calls of each candidate before pairing starts (default: 100).
    pub warmup: usize,

    /// Pairs collected before the first interval is computed (default: 32).
    pub min_pairs: usize,

    /// Pairs after which the paired estimator gives up (default: 1,024).
    pub max_pairs: usize,

    /// Calls per timed trial in the paired estimator (default: Auto).
    pub quantum: Quantum,

    /// Assumed correlation between the errors of two point estimates when
    /// combining them into a speedup (default: 0.0).
    ///
    /// Positive correlation shrinks the combined error. The right value is
    /// machine dependent and has to be determined empirically.
    pub error_correlation: f64,

    /// Optional deterministic seed for pair ordering.
    pub measurement_seed: Option<u64>,
}

/// Calls per timed trial in the paired estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quantum {
    /// Double the call count until clock jitter is within the precision
    /// target of the overhead-corrected trial time.
    #[default]
    Auto,

    /// Use exactly N calls per trial.
    Fixed(u64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision_target_percent: 10.0,
            confidence_level: 0.95,
            max_iterations: 1 << 24,
            max_duration_ms: 10_000,
            samples_per_level: 3,
            convergence_window: 4,
            calibration_repetitions: 10_000,
            calibration_outlier_percentile: 0.999,
            frequency_reference_ms: 10,
            frequency_rounds: 5,
            warmup: 100,
            min_pairs: 32,
            max_pairs: 1_024,
            quantum: Quantum::Auto,
            error_correlation: 0.0,
            measurement_seed: None,
        }
    }
}

impl Config {
    /// Precision target as a fraction (10% -> 0.1).
    pub fn precision_fraction(&self) -> f64 {
        self.precision_target_percent / 100.0
    }

    /// Check every value before any measurement starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.precision_target_percent;
        if !p.is_finite() || p <= 0.0 || p >= 100.0 {
            return Err(ConfigError::PrecisionTarget(p));
        }

        let c = self.confidence_level;
        if !c.is_finite() || c <= 0.0 || c >= 1.0 {
            return Err(ConfigError::ConfidenceLevel(c));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::MaxIterations);
        }
        if self.max_duration_ms == 0 {
            return Err(ConfigError::MaxDuration);
        }

        if self.calibration_repetitions < MIN_CALIBRATION_REPETITIONS {
            return Err(ConfigError::CalibrationRepetitions {
                min: MIN_CALIBRATION_REPETITIONS,
                got: self.calibration_repetitions,
            });
        }

        let q = self.calibration_outlier_percentile;
        if !q.is_finite() || q <= 0.5 || q > 1.0 {
            return Err(ConfigError::OutlierPercentile(q));
        }

        if self.frequency_reference_ms == 0 || self.frequency_rounds == 0 {
            return Err(ConfigError::FrequencyReference);
        }

        if self.samples_per_level == 0 || self.convergence_window < 2 {
            return Err(ConfigError::DoublingSchedule {
                samples_per_level: self.samples_per_level,
                window: self.convergence_window,
            });
        }

        if self.min_pairs < MIN_PAIRS || self.min_pairs > self.max_pairs || self.max_pairs > MAX_PAIRS
        {
            return Err(ConfigError::PairCounts {
                min_pairs: self.min_pairs,
                max_pairs: self.max_pairs,
                min_allowed: MIN_PAIRS,
                max_allowed: MAX_PAIRS,
            });
        }

        if self.quantum == Quantum::Fixed(0) {
            return Err(ConfigError::Quantum);
        }

        let r = self.error_correlation;
        if !r.is_finite() || !(-1.0..=1.0).contains(&r) {
            return Err(ConfigError::ErrorCorrelation(r));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_non_positive_precision() {
        for p in [0.0, -5.0, f64::NAN, 100.0] {
            let config = Config {
                precision_target_percent: p,
                ..Config::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::PrecisionTarget(_))));
        }
    }

    #[test]
    fn test_rejects_zero_bounds() {
        let config = Config {
            max_iterations: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxIterations));

        let config = Config {
            max_duration_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxDuration));
    }

    #[test]
    fn test_rejects_inverted_pair_counts() {
        let config = Config {
            min_pairs: 64,
            max_pairs: 32,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PairCounts { .. })));
    }

    #[test]
    fn test_rejects_zero_quantum_and_bad_correlation() {
        let config = Config {
            quantum: Quantum::Fixed(0),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Quantum));

        let config = Config {
            error_correlation: 1.5,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ErrorCorrelation(1.5)));
    }

    #[test]
    fn test_precision_fraction() {
        let config = Config {
            precision_target_percent: 2.5,
            ..Config::default()
        };
        assert!((config.precision_fraction() - 0.025).abs() < 1e-12);
    }
}
