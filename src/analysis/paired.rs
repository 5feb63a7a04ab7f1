//! Matched-pairs speedup with a distribution-free confidence interval.
//!
//! Each pair times A and B back to back (in random order) over the same
//! quantum of calls, so anything that drifts slowly (frequency, cache state,
//! background load) hits both sides of a pair alike. The per-pair log ratio
//! `ln(net_b / net_a)` is then summarised by the Hodges–Lehmann estimator with
//! the Wilcoxon signed-rank interval, which tolerates the heavy right tail of
//! timing noise without assuming normality.

use std::time::{Duration, Instant};

use crate::config::{Config, Quantum};
use crate::error::{Error, Result};
use crate::measurement::{time_batch, Calibration, ClockSource, Collector};
use crate::result::{ComparisonResult, EstimateWarning, PairedSpeedup};
use crate::statistics::{median, signed_rank_interval, SignedRankInterval};
use crate::types::PairTiming;

/// Trials per candidate when sizing an automatic quantum.
const QUANTUM_PROBE_TRIALS: usize = 5;

/// Estimate the percentage speedup of `a` over `b`.
///
/// Warms both candidates up, picks the calls per trial (see
/// [`Quantum`]), then collects `min_pairs` matched pairs and doubles the
/// pair count until the interval's half-width in log space is within
/// `ln(1 + precision)` or `max_pairs`/`max_duration_ms` is reached.
///
/// The reported percentages are `100·(exp(x) − 1)` of the interval bounds
/// and estimate; positive means A is faster.
pub fn estimate_paired_speedup<C, FA, FB, TA, TB>(
    clock: &C,
    calibration: &Calibration,
    config: &Config,
    mut a: FA,
    mut b: FB,
) -> Result<PairedSpeedup>
where
    C: ClockSource + ?Sized,
    FA: FnMut() -> TA,
    FB: FnMut() -> TB,
{
    config.validate()?;

    let precision = config.precision_fraction();
    let budget = Duration::from_millis(config.max_duration_ms);
    let started = Instant::now();
    let mut collector = Collector::new(clock, config.measurement_seed);

    collector.warmup(config.warmup, &mut a, &mut b);

    let quantum = match config.quantum {
        Quantum::Fixed(k) => k,
        Quantum::Auto => {
            choose_quantum(clock, calibration, config, precision, started, &mut a, &mut b)
        }
    };

    let tolerance = (1.0 + precision).ln();
    let mut target = config.min_pairs;
    let mut pairs: Vec<PairTiming> = Vec::with_capacity(config.max_pairs);

    let (interval, converged) = loop {
        let needed = target - pairs.len();
        pairs.extend(collector.collect_pairs(needed, quantum, &mut a, &mut b));

        let diffs: Vec<f64> = pairs
            .iter()
            .map(|p| (calibration.net(p.b) / calibration.net(p.a)).ln())
            .collect();
        let interval = interval_of(clock, &diffs, config.confidence_level)?;
        let half_width = interval.half_width();

        tracing::debug!(
            pairs = pairs.len(),
            quantum,
            estimate = interval.estimate,
            half_width,
            "paired round"
        );

        if half_width <= tolerance {
            break (interval, true);
        }
        if target >= config.max_pairs || started.elapsed() >= budget {
            break (interval, false);
        }
        target = (target * 2).min(config.max_pairs);
    };

    let mut warnings = Vec::new();
    if !converged {
        warnings.push(EstimateWarning::NonConvergence {
            achieved_percent: 100.0 * interval.half_width().exp_m1(),
            target_percent: config.precision_target_percent,
            iterations: pairs.len() as u64,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }

    let mut trial_times: Vec<f64> = pairs
        .iter()
        .map(|p| calibration.net(p.a).min(calibration.net(p.b)))
        .collect();
    let typical_trial = median(&mut trial_times);
    if typical_trial <= 2.0 * calibration.jitter_sigma {
        warnings.push(EstimateWarning::DegenerateMeasurement {
            slope_ticks: typical_trial / quantum as f64,
            jitter_sigma: calibration.jitter_sigma,
        });
    }
    for warning in &warnings {
        warning.log();
    }

    Ok(PairedSpeedup {
        interval: ComparisonResult {
            min_percent: 100.0 * interval.lower.exp_m1(),
            median_percent: 100.0 * interval.estimate.exp_m1(),
            max_percent: 100.0 * interval.upper.exp_m1(),
        },
        pairs: pairs.len(),
        quantum,
        converged,
        confidence_level: config.confidence_level,
        test: interval.test,
        warnings,
    })
}

fn interval_of<C: ClockSource + ?Sized>(
    clock: &C,
    diffs: &[f64],
    confidence: f64,
) -> Result<SignedRankInterval> {
    signed_rank_interval(diffs, confidence).ok_or_else(|| Error::ClockFailure {
        clock: clock.name(),
        reason: "paired timings produced non-finite log ratios".to_string(),
    })
}

/// Double the calls per trial from one until the clock jitter is within the
/// precision target of the shorter candidate's median net trial time.
fn choose_quantum<C, FA, FB, TA, TB>(
    clock: &C,
    calibration: &Calibration,
    config: &Config,
    precision: f64,
    started: Instant,
    a: &mut FA,
    b: &mut FB,
) -> u64
where
    C: ClockSource + ?Sized,
    FA: FnMut() -> TA,
    FB: FnMut() -> TB,
{
    let budget = Duration::from_millis(config.max_duration_ms);
    let mut quantum: u64 = 1;
    loop {
        let mut ta: Vec<f64> = (0..QUANTUM_PROBE_TRIALS)
            .map(|_| calibration.net(time_batch(clock, quantum, a)))
            .collect();
        let mut tb: Vec<f64> = (0..QUANTUM_PROBE_TRIALS)
            .map(|_| calibration.net(time_batch(clock, quantum, b)))
            .collect();
        let trial = median(&mut ta).min(median(&mut tb));

        if calibration.jitter_sigma <= precision * trial {
            break;
        }
        let next = quantum.saturating_mul(2);
        if next > config.max_iterations || started.elapsed() >= budget {
            break;
        }
        quantum = next;
    }
    tracing::debug!(quantum, "chose measurement quantum");
    quantum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{calibrate_overhead, SimulatedClock};

    fn config(seed: u64) -> Config {
        Config {
            calibration_repetitions: 2_000,
            measurement_seed: Some(seed),
            ..Config::default()
        }
    }

    #[test]
    fn test_noiseless_speedup_is_exact() {
        let clock = SimulatedClock::new(20);
        let cal = calibrate_overhead(&clock, &config(1)).unwrap();
        let result = estimate_paired_speedup(
            &clock,
            &cal,
            &config(1),
            clock.operation(100),
            clock.operation(120),
        )
        .unwrap();

        assert!(result.converged);
        assert_eq!(result.pairs, 32);
        assert_eq!(result.quantum, 1);
        assert!((result.interval.median_percent - 20.0).abs() < 1e-9);
        assert!((result.interval.min_percent - 20.0).abs() < 1e-9);
        assert!(result.is_significant());
    }

    #[test]
    fn test_slower_a_is_negative() {
        let clock = SimulatedClock::new(20).jitter(2.0).seed(8);
        let cal = calibrate_overhead(&clock, &config(2)).unwrap();
        let result = estimate_paired_speedup(
            &clock,
            &cal,
            &config(2),
            clock.operation(200),
            clock.operation(100),
        )
        .unwrap();
        assert!(result.interval.max_percent < 0.0);
        assert!((result.interval.median_percent + 50.0).abs() < 5.0);
    }

    #[test]
    fn test_auto_quantum_grows_with_jitter() {
        let clock = SimulatedClock::new(50).jitter(40.0).seed(3);
        let cal = calibrate_overhead(&clock, &config(3)).unwrap();
        let result = estimate_paired_speedup(
            &clock,
            &cal,
            &config(3),
            clock.operation(10),
            clock.operation(10),
        )
        .unwrap();
        // 40 ticks of jitter at 10% precision needs ~400 ticks per trial
        assert!(result.quantum >= 32, "quantum = {}", result.quantum);
    }

    #[test]
    fn test_pair_budget_exhaustion_warns() {
        let clock = SimulatedClock::new(20).jitter(50.0).seed(5);
        let cal = calibrate_overhead(&clock, &config(5)).unwrap();
        let tight = Config {
            quantum: Quantum::Fixed(1),
            min_pairs: 8,
            max_pairs: 8,
            ..config(5)
        };
        let result = estimate_paired_speedup(
            &clock,
            &cal,
            &tight,
            clock.operation(100),
            clock.operation(100),
        )
        .unwrap();
        assert_eq!(result.pairs, 8);
        assert!(!result.converged);
        assert!(matches!(
            result.warnings[0],
            EstimateWarning::NonConvergence { iterations: 8, .. }
        ));
    }
}
