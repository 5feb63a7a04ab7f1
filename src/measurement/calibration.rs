//! Clock calibration: read overhead, jitter, and tick rate.
//!
//! Overhead calibration times a no-op many times on the clock under test,
//! trims the upper tail of the readings and folds the rest into a mean and a
//! standard deviation. The mean is what gets subtracted from every timed
//! trial; the standard deviation is the noise floor below which an estimate
//! is meaningless.
//!
//! Frequency calibration relates ticks to `std::time::Instant`. It is
//! advisory only: on hardware with dynamic frequency scaling the ratio is
//! not stable over a session, so every comparison the estimators make stays
//! in the tick domain.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::clock::ClockSource;
use super::collector::time_batch;
use super::outlier::filter_outliers;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::statistics::{median, OnlineStats};
use crate::types::Tick;
use crate::units::UnitConverter;

/// Read overhead and jitter of a clock, measured once per session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Mean ticks reported for timing a no-op (never negative).
    pub overhead_mean: f64,
    /// Standard deviation of the no-op readings (never negative).
    pub jitter_sigma: f64,
    /// Smallest no-op reading seen.
    pub overhead_min: Tick,
    /// Readings taken.
    pub repetitions: usize,
    /// Readings discarded as outliers.
    pub outliers_trimmed: usize,
}

impl Calibration {
    /// Calibration of an ideal clock with no overhead and no jitter.
    pub fn ideal() -> Self {
        Self {
            overhead_mean: 0.0,
            jitter_sigma: 0.0,
            overhead_min: 0,
            repetitions: 0,
            outliers_trimmed: 0,
        }
    }

    /// Subtract the mean overhead from a trial, flooring at one tick.
    ///
    /// The floor keeps ratios and logarithms of net times finite.
    #[inline]
    pub fn net(&self, elapsed: Tick) -> f64 {
        (elapsed as f64 - self.overhead_mean).max(1.0)
    }
}

/// Measure read overhead and jitter of `clock`.
///
/// Times a no-op `config.calibration_repetitions` times, discards readings
/// above `config.calibration_outlier_percentile` and accumulates the rest.
pub fn calibrate_overhead<C>(clock: &C, config: &Config) -> Result<Calibration>
where
    C: ClockSource + ?Sized,
{
    measure_overhead(clock, config).map(|(calibration, _)| calibration)
}

/// As [`calibrate_overhead`], also returning the raw readings for the
/// resolution preflight.
pub(crate) fn measure_overhead<C>(clock: &C, config: &Config) -> Result<(Calibration, Vec<Tick>)>
where
    C: ClockSource + ?Sized,
{
    config.validate()?;

    let mut noop = || ();
    let readings: Vec<Tick> = (0..config.calibration_repetitions)
        .map(|_| time_batch(clock, 1, &mut noop))
        .collect();

    let (kept, outliers) = filter_outliers(&readings, config.calibration_outlier_percentile);

    let mut stats = OnlineStats::new();
    stats.extend(kept.iter().map(|&t| t as f64));
    let snapshot = stats.finalize();

    let calibration = Calibration {
        overhead_mean: snapshot.mean.max(0.0),
        jitter_sigma: snapshot.std_dev().max(0.0),
        overhead_min: readings.iter().copied().min().unwrap_or(0),
        repetitions: readings.len(),
        outliers_trimmed: outliers.outliers_removed,
    };

    tracing::info!(
        clock = clock.name(),
        overhead_mean = calibration.overhead_mean,
        jitter_sigma = calibration.jitter_sigma,
        overhead_min = calibration.overhead_min,
        outliers_trimmed = calibration.outliers_trimmed,
        outlier_fraction = outliers.outlier_fraction(),
        "calibrated clock overhead"
    );

    Ok((calibration, readings))
}

/// Estimate ticks per nanosecond of `clock` against `std::time::Instant`.
///
/// Runs `config.frequency_rounds` busy-waits of `config.frequency_reference_ms`
/// each and takes the median ratio. The result is advisory; see the module
/// documentation.
///
/// # Errors
///
/// [`Error::ClockFailure`] if the clock does not advance during any round.
pub fn calibrate_frequency<C>(clock: &C, config: &Config) -> Result<UnitConverter>
where
    C: ClockSource + ?Sized,
{
    config.validate()?;

    let reference = Duration::from_millis(config.frequency_reference_ms);
    let mut ratios = Vec::with_capacity(config.frequency_rounds);

    for _ in 0..config.frequency_rounds {
        let start_ticks = clock.now();
        let start_time = Instant::now();
        while start_time.elapsed() < reference {
            std::hint::spin_loop();
        }
        let end_ticks = clock.now();
        let elapsed_ns = start_time.elapsed().as_nanos() as f64;

        let ticks = clock.elapsed(start_ticks, end_ticks);
        if ticks > 0 && elapsed_ns > 0.0 {
            ratios.push(ticks as f64 / elapsed_ns);
        }
    }

    if ratios.is_empty() {
        return Err(Error::ClockFailure {
            clock: clock.name(),
            reason: format!(
                "no advance over {} busy-waits of {} ms",
                config.frequency_rounds, config.frequency_reference_ms
            ),
        });
    }

    let ticks_per_ns = median(&mut ratios);
    let converter = UnitConverter::from_ticks_per_ns(ticks_per_ns)?;

    tracing::info!(
        clock = clock.name(),
        ticks_per_ns,
        rounds = ratios.len(),
        "calibrated tick rate"
    );

    Ok(converter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{MonotonicClock, SimulatedClock};

    fn fast_config() -> Config {
        Config {
            calibration_repetitions: 2_000,
            frequency_reference_ms: 2,
            frequency_rounds: 3,
            ..Config::default()
        }
    }

    #[test]
    fn test_overhead_matches_read_cost() {
        let clock = SimulatedClock::new(25);
        let cal = calibrate_overhead(&clock, &fast_config()).unwrap();
        assert_eq!(cal.overhead_mean, 25.0);
        assert_eq!(cal.jitter_sigma, 0.0);
        assert_eq!(cal.overhead_min, 25);
        assert_eq!(cal.repetitions, 2_000);
    }

    #[test]
    fn test_jitter_is_recovered() {
        let clock = SimulatedClock::new(100).jitter(5.0).seed(11);
        let cal = calibrate_overhead(&clock, &fast_config()).unwrap();
        assert!((cal.overhead_mean - 100.0).abs() < 1.0, "mean = {}", cal.overhead_mean);
        assert!(cal.jitter_sigma > 3.0 && cal.jitter_sigma < 6.0, "sigma = {}", cal.jitter_sigma);
    }

    #[test]
    fn test_overhead_never_negative() {
        let clock = SimulatedClock::new(0).jitter(3.0).seed(5);
        let cal = calibrate_overhead(&clock, &fast_config()).unwrap();
        assert!(cal.overhead_mean >= 0.0);
        assert!(cal.jitter_sigma >= 0.0);
    }

    #[test]
    fn test_invalid_config_rejected_before_measuring() {
        let clock = SimulatedClock::new(10);
        let config = Config {
            calibration_repetitions: 10,
            ..Config::default()
        };
        let err = calibrate_overhead(&clock, &config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
        assert_eq!(clock.virtual_time(), 0);
    }

    #[test]
    fn test_frozen_clock_fails_frequency_calibration() {
        let clock = SimulatedClock::new(0);
        let err = calibrate_frequency(&clock, &fast_config()).unwrap_err();
        assert!(matches!(err, Error::ClockFailure { clock: "simulated", .. }));
    }

    #[test]
    fn test_monotonic_clock_runs_at_one_tick_per_ns() {
        let clock = MonotonicClock::new();
        let converter = calibrate_frequency(&clock, &fast_config()).unwrap();
        assert!(
            (converter.ticks_per_ns() - 1.0).abs() < 0.2,
            "ticks/ns = {}",
            converter.ticks_per_ns()
        );
    }

    #[test]
    fn test_net_floors_at_one_tick() {
        let cal = Calibration {
            overhead_mean: 50.0,
            ..Calibration::ideal()
        };
        assert_eq!(cal.net(30), 1.0);
        assert_eq!(cal.net(150), 100.0);
    }
}
