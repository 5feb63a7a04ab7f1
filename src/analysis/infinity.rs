//! Steady-state per-call cost by batch doubling.
//!
//! Timing `n` back-to-back calls gives `elapsed ≈ intercept + slope·n`, where
//! the intercept collects clock overhead and one-off costs (cold caches, the
//! loop prologue) and the slope is the cost of one call once those are
//! amortised: the "infinity time". The estimator keeps doubling `n` until the
//! last few levels scale the way a linear cost must, i.e. doubling the call
//! count doubles the elapsed time.

use std::time::{Duration, Instant};

use super::log2_ticks;
use crate::config::Config;
use crate::error::Result;
use crate::measurement::{Calibration, ClockSource, Collector};
use crate::result::{EstimateWarning, InfinityEstimate};
use crate::statistics::{fit_lad, median, LadFit};
use crate::types::Sample;

/// Estimate the steady-state cost of one call of `op`, in ticks.
///
/// Starting from a single call, times `samples_per_level` batches at each
/// call count, fits elapsed against count by least absolute deviations over
/// every batch so far, and tests the last `convergence_window` levels for
/// ideal doubling: the LAD slope of `log2(elapsed)` against `log2(n)` must be
/// within the precision target of 1 while the linear slope is positive. The
/// window's median relative residual from the linear fit must also be within
/// the precision target, and so must the clock jitter relative to the net
/// time of the largest batch. Otherwise the count doubles, up to
/// `max_iterations` and `max_duration_ms`.
///
/// Running out of budget is not an error; the best-effort fit is returned
/// with an [`EstimateWarning::NonConvergence`].
pub fn estimate_infinity_time<C, F, T>(
    clock: &C,
    calibration: &Calibration,
    config: &Config,
    mut op: F,
) -> Result<InfinityEstimate>
where
    C: ClockSource + ?Sized,
    F: FnMut() -> T,
{
    config.validate()?;

    let precision = config.precision_fraction();
    let budget = Duration::from_millis(config.max_duration_ms);
    let started = Instant::now();
    let collector = Collector::new(clock, config.measurement_seed);

    let mut samples: Vec<Sample> = Vec::new();
    let mut iterations: u64 = 1;
    let mut levels = 0usize;
    let mut doubling_exponent = f64::NAN;
    let mut spread: f64;
    let mut converged = false;

    loop {
        samples.extend(collector.collect_level(iterations, config.samples_per_level, &mut op));
        levels += 1;

        let window = levels.min(config.convergence_window);
        let recent = &samples[samples.len() - window * config.samples_per_level..];
        if window >= 2 {
            doubling_exponent = doubling_slope(recent).unwrap_or(f64::NAN);
        }

        let linear = fit_samples(&samples);
        spread = linear.map_or(f64::INFINITY, |f| relative_spread(recent, &f));
        let top = &samples[samples.len() - config.samples_per_level..];
        let top_net = median_net(top, calibration);

        tracing::debug!(
            iterations,
            doubling_exponent,
            spread,
            top_net,
            slope = linear.map(|f| f.slope),
            "timed doubling level"
        );

        // A clean doubling exponent alone is not enough: spikes on the
        // largest batches can drag the whole line with them.
        if levels >= config.convergence_window
            && (doubling_exponent - 1.0).abs() <= precision
            && linear.is_some_and(|f| f.slope > 0.0)
            && spread <= precision
            && calibration.jitter_sigma <= precision * top_net
        {
            converged = true;
            break;
        }

        let next = iterations.saturating_mul(2);
        if next > config.max_iterations || started.elapsed() >= budget {
            break;
        }
        iterations = next;
    }

    let fit = fit_samples(&samples).unwrap_or_else(|| single_level_fit(&samples, calibration));

    let mut warnings = Vec::new();
    if !converged {
        warnings.push(EstimateWarning::NonConvergence {
            achieved_percent: achieved_precision(doubling_exponent, spread) * 100.0,
            target_percent: config.precision_target_percent,
            iterations,
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
    }
    if fit.slope <= 2.0 * calibration.jitter_sigma {
        warnings.push(EstimateWarning::DegenerateMeasurement {
            slope_ticks: fit.slope,
            jitter_sigma: calibration.jitter_sigma,
        });
    }
    for warning in &warnings {
        warning.log();
    }

    Ok(InfinityEstimate {
        slope: fit.slope,
        intercept: fit.intercept,
        mad: fit.mad,
        doubling_exponent,
        overhead_mean: calibration.overhead_mean,
        jitter_sigma: calibration.jitter_sigma,
        precision_target: precision,
        samples,
        converged,
        warnings,
    })
}

/// LAD fit of elapsed ticks against call count.
fn fit_samples(samples: &[Sample]) -> Option<LadFit> {
    let xs: Vec<f64> = samples.iter().map(|s| s.iterations as f64).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.elapsed as f64).collect();
    fit_lad(&xs, &ys)
}

/// Worse of the doubling deviation and the residual spread; infinite while
/// the doubling exponent is undefined.
fn achieved_precision(doubling_exponent: f64, spread: f64) -> f64 {
    let deviation = (doubling_exponent - 1.0).abs();
    if deviation.is_nan() {
        f64::INFINITY
    } else {
        deviation.max(spread)
    }
}

/// Median of `|elapsed − fit(n)| / fit(n)` over `samples`. A non-positive
/// prediction counts as an infinite deviation.
fn relative_spread(samples: &[Sample], fit: &LadFit) -> f64 {
    let mut deviations: Vec<f64> = samples
        .iter()
        .map(|s| {
            let predicted = fit.predict(s.iterations as f64);
            if predicted > 0.0 {
                (s.elapsed as f64 - predicted).abs() / predicted
            } else {
                f64::INFINITY
            }
        })
        .collect();
    if deviations.is_empty() {
        return f64::INFINITY;
    }
    median(&mut deviations)
}

/// Median overhead-corrected elapsed ticks of one level.
fn median_net(level: &[Sample], calibration: &Calibration) -> f64 {
    let mut net: Vec<f64> = level.iter().map(|s| calibration.net(s.elapsed)).collect();
    if net.is_empty() {
        return 0.0;
    }
    median(&mut net)
}

/// LAD slope of `log2(elapsed)` against `log2(iterations)`.
fn doubling_slope(samples: &[Sample]) -> Option<f64> {
    let xs: Vec<f64> = samples.iter().map(|s| (s.iterations as f64).log2()).collect();
    let ys: Vec<f64> = samples.iter().map(|s| log2_ticks(s.elapsed)).collect();
    fit_lad(&xs, &ys).map(|f| f.slope)
}

/// Fallback when every sample has the same call count (a budget of one
/// level): attribute the calibrated overhead to the intercept and the rest
/// to the calls.
fn single_level_fit(samples: &[Sample], calibration: &Calibration) -> LadFit {
    let iterations = samples.first().map(|s| s.iterations).unwrap_or(1) as f64;
    let mut elapsed: Vec<f64> = samples.iter().map(|s| s.elapsed as f64).collect();
    if elapsed.is_empty() {
        return LadFit {
            slope: 0.0,
            intercept: calibration.overhead_mean,
            mad: 0.0,
        };
    }
    let centre = median(&mut elapsed);
    let mut deviations: Vec<f64> = elapsed.iter().map(|e| (e - centre).abs()).collect();
    LadFit {
        slope: (centre - calibration.overhead_mean).max(0.0) / iterations,
        intercept: calibration.overhead_mean,
        mad: median(&mut deviations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{calibrate_overhead, SimulatedClock};

    fn config() -> Config {
        Config {
            calibration_repetitions: 2_000,
            max_duration_ms: 5_000,
            ..Config::default()
        }
    }

    #[test]
    fn test_noiseless_linear_cost() {
        let clock = SimulatedClock::new(40);
        let cal = calibrate_overhead(&clock, &config()).unwrap();
        let est = estimate_infinity_time(&clock, &cal, &config(), clock.operation(250)).unwrap();

        assert!(est.converged);
        assert!(est.warnings.is_empty());
        assert!((est.slope - 250.0).abs() < 1e-6, "slope = {}", est.slope);
        assert!((est.intercept - 40.0).abs() < 1e-6);
        assert!(est.net_intercept().abs() < 1e-6);
        assert!(est.samples.windows(2).all(|w| w[0].iterations <= w[1].iterations));
        assert!(est.samples.len() >= config().convergence_window * config().samples_per_level);
    }

    #[test]
    fn test_budget_exhaustion_is_a_warning() {
        let clock = SimulatedClock::new(1_000);
        let cal = calibrate_overhead(&clock, &config()).unwrap();
        let tight = Config {
            max_iterations: 4,
            ..config()
        };
        // Overhead dominates at four calls, so doubling never looks linear
        let est = estimate_infinity_time(&clock, &cal, &tight, clock.operation(1)).unwrap();

        assert!(!est.converged);
        assert!(matches!(
            est.warnings[0],
            EstimateWarning::NonConvergence { iterations: 4, .. }
        ));
        assert_eq!(est.max_iterations(), 4);
    }

    #[test]
    fn test_single_level_budget_falls_back() {
        let clock = SimulatedClock::new(10);
        let cal = calibrate_overhead(&clock, &config()).unwrap();
        let one = Config {
            max_iterations: 1,
            ..config()
        };
        let est = estimate_infinity_time(&clock, &cal, &one, clock.operation(90)).unwrap();
        assert!(!est.converged);
        assert!((est.slope - 90.0).abs() < 1e-9);
        assert!(est.doubling_exponent.is_nan());
        match est.warnings[0] {
            EstimateWarning::NonConvergence {
                achieved_percent, ..
            } => assert_eq!(achieved_percent, f64::INFINITY),
            ref other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn test_spikes_on_largest_batches_do_not_converge_early() {
        // Mean cost per call is 250 + 0.02 * 5000 = 350 ticks.
        let spiky = Config {
            max_iterations: 1 << 16,
            ..config()
        };
        for seed in (0..40).chain([48]) {
            let clock = SimulatedClock::new(40).jitter(20.0).seed(seed);
            let cal = calibrate_overhead(&clock, &spiky).unwrap();
            let op = clock.spiky_operation(250, 0.02, 5_000);
            let est = estimate_infinity_time(&clock, &cal, &spiky, op).unwrap();

            if est.converged {
                assert!(
                    (est.slope - 350.0).abs() < 175.0,
                    "seed {}: converged on slope {:.1} (intercept {:.1})",
                    seed,
                    est.slope,
                    est.intercept
                );
            }
        }
    }

    #[test]
    fn test_relative_spread() {
        let fit = LadFit {
            slope: 100.0,
            intercept: 0.0,
            mad: 0.0,
        };
        let samples = [Sample::new(1, 110), Sample::new(2, 200), Sample::new(4, 380)];
        assert!((relative_spread(&samples, &fit) - 0.05).abs() < 1e-12);

        let below_zero = LadFit {
            slope: 100.0,
            intercept: -500.0,
            mad: 0.0,
        };
        assert_eq!(relative_spread(&samples, &below_zero), f64::INFINITY);
    }

    #[test]
    fn test_jitter_dominated_operation_is_degenerate() {
        let clock = SimulatedClock::new(20).jitter(10.0).seed(4);
        let cal = calibrate_overhead(&clock, &config()).unwrap();
        let short = Config {
            max_iterations: 1 << 12,
            ..config()
        };
        let est = estimate_infinity_time(&clock, &cal, &short, clock.operation(0)).unwrap();
        assert!(est
            .warnings
            .iter()
            .any(|w| matches!(w, EstimateWarning::DegenerateMeasurement { .. })));
    }
}
