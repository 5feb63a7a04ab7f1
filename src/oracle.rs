//! Main `SpeedupOracle` entry point and builder.

use crate::analysis::{estimate_infinity_time, estimate_paired_speedup, point_estimate_speedup};
use crate::config::{Config, Quantum};
use crate::error::Result;
use crate::measurement::{
    calibrate_frequency, measure_overhead, Calibration, ClockSource, ClockSpec, SystemClock,
};
use crate::preflight::{check_clock, run_all_checks, PreflightResult};
use crate::result::{ComparisonResult, InfinityEstimate, PairedSpeedup};
use crate::units::UnitConverter;

/// Main entry point for benchmarking.
///
/// Owns a clock and its calibration for the length of a session. Configure
/// with the consuming builder methods, then measure; the clock is checked and
/// calibrated on first use if [`calibrate_overhead`](Self::calibrate_overhead)
/// was not called explicitly.
///
/// # Example
///
/// ```no_run
/// use speedup_oracle::SpeedupOracle;
///
/// let mut oracle = SpeedupOracle::new().precision_target_percent(5.0);
///
/// let speedup = oracle
///     .measure_percentage_speedup(|| "12345".parse::<u32>(), || "12345".parse::<u64>())
///     .unwrap();
/// println!(
///     "u32 vs u64: {:.1}% .. {:.1}% faster",
///     speedup.interval.min_percent, speedup.interval.max_percent
/// );
/// ```
///
/// # Clock Selection
///
/// [`SpeedupOracle::new`] uses the platform tick counter. Any other
/// [`ClockSource`], including a
/// [`SimulatedClock`](crate::measurement::SimulatedClock), can be supplied
/// with [`SpeedupOracle::with_clock`]:
///
/// ```
/// use speedup_oracle::{measurement::SimulatedClock, SpeedupOracle};
///
/// let clock = SimulatedClock::new(20);
/// let op = clock.operation(100);
/// let mut oracle = SpeedupOracle::with_clock(clock).calibration_repetitions(1_000);
/// let estimate = oracle.measure_infinity_time(op).unwrap();
/// assert!((estimate.slope - 100.0).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct SpeedupOracle<C: ClockSource = SystemClock> {
    clock: C,
    config: Config,
    calibration: Option<Calibration>,
    converter: Option<UnitConverter>,
    preflight: PreflightResult,
}

impl Default for SpeedupOracle<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedupOracle<SystemClock> {
    /// Create with default configuration on the platform tick counter.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::default())
    }

    /// Create with fast configuration for smoke tests.
    ///
    /// Settings:
    /// - 20% precision target (vs 10% default)
    /// - 2,000 calibration repetitions (vs 10,000 default)
    /// - 2 s time budget (vs 10 s default)
    /// - 16 to 256 pairs (vs 32 to 1,024 default)
    pub fn quick() -> Self {
        Self::new().config(Config {
            precision_target_percent: 20.0,
            calibration_repetitions: 2_000,
            max_duration_ms: 2_000,
            warmup: 20,
            min_pairs: 16,
            max_pairs: 256,
            ..Config::default()
        })
    }

    /// Create with a tight configuration for final numbers.
    ///
    /// Settings:
    /// - 2% precision target (vs 10% default)
    /// - 50,000 calibration repetitions
    /// - 5 samples per level over a 5-level window
    /// - 60 s time budget, up to 4,096 pairs
    pub fn precise() -> Self {
        Self::new().config(Config {
            precision_target_percent: 2.0,
            calibration_repetitions: 50_000,
            samples_per_level: 5,
            convergence_window: 5,
            max_duration_ms: 60_000,
            warmup: 1_000,
            max_pairs: crate::config::MAX_PAIRS,
            ..Config::default()
        })
    }

    /// Select which real clock to use.
    ///
    /// Replacing the clock discards any calibration.
    pub fn clock_spec(mut self, spec: ClockSpec) -> Self {
        self.replace_clock(spec.create_clock());
        self
    }
}

impl<C: ClockSource> SpeedupOracle<C> {
    /// Create with default configuration on the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            config: Config::default(),
            calibration: None,
            converter: None,
            preflight: PreflightResult::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the acceptable relative error in percent.
    pub fn precision_target_percent(mut self, percent: f64) -> Self {
        self.config.precision_target_percent = percent;
        self
    }

    /// Set the confidence level of paired intervals.
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.config.confidence_level = level;
        self
    }

    /// Set the largest batch of calls.
    pub fn max_iterations(mut self, n: u64) -> Self {
        self.config.max_iterations = n;
        self
    }

    /// Set the wall-time budget per estimate in milliseconds.
    pub fn max_duration_ms(mut self, ms: u64) -> Self {
        self.config.max_duration_ms = ms;
        self
    }

    /// Set batches per level and the convergence window of the doubling
    /// estimator.
    pub fn doubling_schedule(mut self, samples_per_level: usize, convergence_window: usize) -> Self {
        self.config.samples_per_level = samples_per_level;
        self.config.convergence_window = convergence_window;
        self
    }

    /// Set the number of no-op timings used for overhead calibration.
    pub fn calibration_repetitions(mut self, n: usize) -> Self {
        self.config.calibration_repetitions = n;
        self
    }

    /// Set untimed warmup calls per candidate.
    pub fn warmup(mut self, n: usize) -> Self {
        self.config.warmup = n;
        self
    }

    /// Set the starting and maximum number of matched pairs.
    pub fn pairs(mut self, min: usize, max: usize) -> Self {
        self.config.min_pairs = min;
        self.config.max_pairs = max;
        self
    }

    /// Set calls per paired trial.
    pub fn quantum(mut self, quantum: Quantum) -> Self {
        self.config.quantum = quantum;
        self
    }

    /// Set the assumed error correlation for point-estimate speedups.
    pub fn error_correlation(mut self, correlation: f64) -> Self {
        self.config.error_correlation = correlation;
        self
    }

    /// Set a deterministic seed for pair ordering.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.measurement_seed = Some(seed);
        self
    }

    /// The clock in use.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current configuration.
    pub fn current_config(&self) -> &Config {
        &self.config
    }

    /// Overhead calibration, if it has been performed.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Tick rate, if frequency calibration has been performed.
    pub fn unit_converter(&self) -> Option<&UnitConverter> {
        self.converter.as_ref()
    }

    /// Warnings from the preflight checks of the last calibration.
    pub fn preflight(&self) -> &PreflightResult {
        &self.preflight
    }

    /// Swap in a different clock, discarding calibration tied to the old one.
    pub fn replace_clock(&mut self, clock: C) -> C {
        self.calibration = None;
        self.converter = None;
        self.preflight = PreflightResult::new();
        std::mem::replace(&mut self.clock, clock)
    }

    /// Check the clock and measure its read overhead and jitter.
    ///
    /// Recalibrates even if a calibration already exists.
    pub fn calibrate_overhead(&mut self) -> Result<Calibration> {
        self.config.validate()?;
        check_clock(&self.clock)?;

        let (calibration, readings) = measure_overhead(&self.clock, &self.config)?;
        self.preflight = run_all_checks(&readings);
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    /// Measure the clock's tick rate against wall time.
    ///
    /// Advisory only; see [`UnitConverter`].
    pub fn calibrate_frequency(&mut self) -> Result<UnitConverter> {
        let converter = calibrate_frequency(&self.clock, &self.config)?;
        self.converter = Some(converter);
        Ok(converter)
    }

    /// Steady-state cost of one call of `op`, in ticks.
    pub fn measure_infinity_time<F, T>(&mut self, op: F) -> Result<InfinityEstimate>
    where
        F: FnMut() -> T,
    {
        let calibration = self.ensure_calibrated()?;
        estimate_infinity_time(&self.clock, &calibration, &self.config, op)
    }

    /// Percentage speedup of `a` over `b` from randomized matched pairs.
    pub fn measure_percentage_speedup<FA, FB, TA, TB>(
        &mut self,
        a: FA,
        b: FB,
    ) -> Result<PairedSpeedup>
    where
        FA: FnMut() -> TA,
        FB: FnMut() -> TB,
    {
        let calibration = self.ensure_calibrated()?;
        estimate_paired_speedup(&self.clock, &calibration, &self.config, a, b)
    }

    /// Percentage speedup of `a` over `b` from two point estimates, using the
    /// configured error correlation.
    pub fn point_estimate_speedup(
        &self,
        a: &InfinityEstimate,
        b: &InfinityEstimate,
    ) -> ComparisonResult {
        point_estimate_speedup(a, b, self.config.error_correlation)
    }

    /// Convert ticks to nanoseconds, calibrating the tick rate on first use.
    pub fn nanoseconds(&mut self, ticks: f64) -> Result<f64> {
        let converter = match self.converter {
            Some(converter) => converter,
            None => self.calibrate_frequency()?,
        };
        Ok(converter.ticks_to_nanoseconds(ticks))
    }

    fn ensure_calibrated(&mut self) -> Result<Calibration> {
        match self.calibration {
            Some(calibration) => {
                self.config.validate()?;
                Ok(calibration)
            }
            None => self.calibrate_overhead(),
        }
    }
}
