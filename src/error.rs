//! Error types.
//!
//! Only conditions that make measurement impossible are errors. Quality
//! problems with a finished estimate (no convergence, slope buried in clock
//! jitter) are reported as [`EstimateWarning`](crate::EstimateWarning)s on
//! the result instead.

use thiserror::Error;

/// Fatal errors from calibration or estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The session configuration was rejected before any measurement ran.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// The tick source is unusable (frozen, running backwards, or not
    /// advancing against the reference clock).
    #[error("clock failure ({clock}): {reason}")]
    ClockFailure {
        /// Name of the offending clock.
        clock: &'static str,
        /// What was observed.
        reason: String,
    },
}

/// A configuration value outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Precision target must be a finite percentage in (0, 100).
    #[error("precision target must be in (0, 100) percent, got {0}")]
    PrecisionTarget(f64),

    /// Confidence level must lie strictly between 0 and 1.
    #[error("confidence level must be in (0, 1), got {0}")]
    ConfidenceLevel(f64),

    /// Iteration bound must be positive.
    #[error("maximum iteration count must be positive")]
    MaxIterations,

    /// Time budget must be positive.
    #[error("maximum duration must be positive")]
    MaxDuration,

    /// Too few calibration repetitions for a stable mean.
    #[error("calibration needs at least {min} repetitions, got {got}")]
    CalibrationRepetitions {
        /// Minimum accepted.
        min: usize,
        /// Value supplied.
        got: usize,
    },

    /// Outlier percentile must lie in (0.5, 1].
    #[error("outlier percentile must be in (0.5, 1], got {0}")]
    OutlierPercentile(f64),

    /// Frequency calibration needs a positive reference window and rounds.
    #[error("frequency calibration needs positive reference duration and rounds")]
    FrequencyReference,

    /// Doubling estimator needs at least one sample per level and a window
    /// of at least two levels.
    #[error("need samples_per_level >= 1 and convergence_window >= 2, got {samples_per_level} and {window}")]
    DoublingSchedule {
        /// Samples per level supplied.
        samples_per_level: usize,
        /// Convergence window supplied.
        window: usize,
    },

    /// Pair counts out of range.
    #[error("pair counts must satisfy {min_allowed} <= min_pairs ({min_pairs}) <= max_pairs ({max_pairs}) <= {max_allowed}")]
    PairCounts {
        /// Configured minimum pairs.
        min_pairs: usize,
        /// Configured maximum pairs.
        max_pairs: usize,
        /// Smallest accepted minimum.
        min_allowed: usize,
        /// Largest accepted maximum.
        max_allowed: usize,
    },

    /// Fixed quantum of zero calls.
    #[error("fixed measurement quantum must be positive")]
    Quantum,

    /// Error correlation must be a finite value in [-1, 1].
    #[error("error correlation must be in [-1, 1], got {0}")]
    ErrorCorrelation(f64),

    /// Tick rate must be finite and positive.
    #[error("ticks per nanosecond must be finite and positive, got {0}")]
    TickRate(f64),

    /// A measurement buffer of size zero.
    #[error("measurement buffer size must be positive")]
    BufferSize,
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
