//! # speedup-oracle
//!
//! Answer "is A faster than B, and by how much?" with a confidence interval
//! that holds up under OS jitter, frequency scaling, cache effects and burst
//! load.
//!
//! This crate provides two estimators on top of a calibrated tick counter:
//! - **Infinity time**: the steady-state cost of one call, from a
//!   least-absolute-deviation fit of elapsed ticks against a doubling call
//!   count
//! - **Paired speedup**: a distribution-free (Wilcoxon signed-rank) interval
//!   on the percentage speedup of A over B from randomized matched pairs
//!
//! Everything is measured and compared in clock ticks. Conversion to
//! nanoseconds is available for display but is advisory only.
//!
//! ## Common Pitfall: Work Outside the Operation
//!
//! Anything a timed closure does is timed. Generate inputs and allocate
//! outputs beforehand; the [`helpers::MeasurementContext`] buffers make that
//! the easy path.
//!
//! ```ignore
//! // WRONG - string formatting is timed along with the parse
//! compare(|| format!("{}", n).parse::<u32>(), || atoi(&format!("{}", n)));
//!
//! // CORRECT - inputs prepared once, both closures do only the parse
//! let ctx = MeasurementContext::new(strings, 0u32)?;
//! compare(
//!     || ctx.run(|i, o| parse_all(i, o)),
//!     || ctx.run(|i, o| atoi_all(i, o)),
//! );
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use speedup_oracle::SpeedupOracle;
//!
//! let mut oracle = SpeedupOracle::new();
//! let data: Vec<u64> = (0..1_000).collect();
//!
//! let sum = oracle.measure_infinity_time(|| data.iter().sum::<u64>()).unwrap();
//! println!("sum: {:.1} ticks/call", sum.slope);
//!
//! let speedup = oracle
//!     .measure_percentage_speedup(
//!         || data.iter().sum::<u64>(),
//!         || data.iter().fold(0u64, |acc, x| acc.wrapping_add(*x)),
//!     )
//!     .unwrap();
//! println!(
//!     "sum vs fold: {:.1}% [{:.1}%, {:.1}%]",
//!     speedup.interval.median_percent,
//!     speedup.interval.min_percent,
//!     speedup.interval.max_percent
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod oracle;
mod result;
mod types;
mod units;

// Functional modules
pub mod analysis;
pub mod helpers;
pub mod measurement;
pub mod preflight;
pub mod statistics;

// Re-exports for public API
pub use config::{Config, Quantum, MAX_PAIRS, MIN_CALIBRATION_REPETITIONS, MIN_PAIRS};
pub use error::{ConfigError, Error, Result};
pub use measurement::{Calibration, ClockSource, ClockSpec, SystemClock};
pub use oracle::SpeedupOracle;
pub use result::{
    ComparisonResult, EstimateWarning, InfinityEstimate, MeasurementQuality, PairedSpeedup,
};
pub use types::{Candidate, PairTiming, Sample, Tick};
pub use units::UnitConverter;

// Re-export helpers for convenience
pub use helpers::MeasurementContext;

/// Percentage speedup of `a` over `b` with default configuration.
///
/// Positive means `a` is faster. Calibrates the platform clock on every
/// call; hold a [`SpeedupOracle`] to reuse one calibration across
/// comparisons.
pub fn compare<FA, FB, TA, TB>(a: FA, b: FB) -> Result<PairedSpeedup>
where
    FA: FnMut() -> TA,
    FB: FnMut() -> TB,
{
    SpeedupOracle::new().measure_percentage_speedup(a, b)
}

/// Steady-state ticks per call of `op` with default configuration.
pub fn infinity_time<F, T>(op: F) -> Result<InfinityEstimate>
where
    F: FnMut() -> T,
{
    SpeedupOracle::new().measure_infinity_time(op)
}
