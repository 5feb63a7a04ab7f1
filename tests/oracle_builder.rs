//! Tests for the `SpeedupOracle` builder API and result serialization.

use speedup_oracle::measurement::SimulatedClock;
use speedup_oracle::{
    ClockSpec, Config, ConfigError, Error, Quantum, SpeedupOracle, MAX_PAIRS,
};

// ===========================================================================
// Builder
// ===========================================================================

#[test]
fn builder_sets_config() {
    let oracle = SpeedupOracle::new()
        .precision_target_percent(5.0)
        .confidence_level(0.99)
        .max_iterations(1 << 20)
        .max_duration_ms(3_000)
        .doubling_schedule(5, 6)
        .calibration_repetitions(4_000)
        .warmup(7)
        .pairs(16, 512)
        .quantum(Quantum::Fixed(8))
        .error_correlation(0.5)
        .seed(42);

    let config = oracle.current_config();
    assert_eq!(config.precision_target_percent, 5.0);
    assert_eq!(config.confidence_level, 0.99);
    assert_eq!(config.max_iterations, 1 << 20);
    assert_eq!(config.max_duration_ms, 3_000);
    assert_eq!(config.samples_per_level, 5);
    assert_eq!(config.convergence_window, 6);
    assert_eq!(config.calibration_repetitions, 4_000);
    assert_eq!(config.warmup, 7);
    assert_eq!((config.min_pairs, config.max_pairs), (16, 512));
    assert_eq!(config.quantum, Quantum::Fixed(8));
    assert_eq!(config.error_correlation, 0.5);
    assert_eq!(config.measurement_seed, Some(42));
    assert!(config.validate().is_ok());
}

#[test]
fn presets_are_valid() {
    for oracle in [
        SpeedupOracle::new(),
        SpeedupOracle::quick(),
        SpeedupOracle::precise(),
    ] {
        assert!(oracle.current_config().validate().is_ok());
    }
    assert_eq!(SpeedupOracle::precise().current_config().max_pairs, MAX_PAIRS);
    assert_eq!(
        SpeedupOracle::default().current_config(),
        &Config::default()
    );
}

#[test]
fn clock_spec_selects_clock() {
    let oracle = SpeedupOracle::new().clock_spec(ClockSpec::Monotonic);
    assert_eq!(speedup_oracle::ClockSource::name(oracle.clock()), "instant");
}

#[test]
fn invalid_pairs_are_rejected() {
    let clock = SimulatedClock::new(10);
    let a = clock.operation(1);
    let b = clock.operation(2);
    let mut oracle = SpeedupOracle::with_clock(clock).pairs(2, 8);

    let err = oracle.measure_percentage_speedup(a, b).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidConfiguration(ConfigError::PairCounts { min_pairs: 2, .. })
    ));
    assert!(err.to_string().contains("invalid configuration"));
}

// ===========================================================================
// Session
// ===========================================================================

#[test]
fn calibration_is_reused_across_measurements() {
    let clock = SimulatedClock::new(25).jitter(1.0).seed(1);
    let a = clock.operation(80);
    let b = clock.operation(160);
    let mut oracle = SpeedupOracle::with_clock(clock)
        .calibration_repetitions(1_000)
        .seed(1);

    let first = oracle.calibrate_overhead().unwrap();
    oracle.measure_percentage_speedup(a, b).unwrap();
    assert_eq!(oracle.calibration(), Some(&first));
}

#[test]
fn point_estimate_agrees_with_paired() {
    let clock = SimulatedClock::new(25).jitter(2.0).seed(3);
    let mut oracle = SpeedupOracle::with_clock(clock.clone())
        .calibration_repetitions(1_000)
        .seed(3);

    let fast = oracle.measure_infinity_time(clock.operation(300)).unwrap();
    let slow = oracle.measure_infinity_time(clock.operation(450)).unwrap();
    let point = oracle.point_estimate_speedup(&fast, &slow);
    assert!((point.median_percent - 50.0).abs() < 5.0, "{:?}", point);
    assert!(point.min_percent < point.median_percent);

    let paired = oracle
        .measure_percentage_speedup(clock.operation(300), clock.operation(450))
        .unwrap();
    assert!((paired.interval.median_percent - point.median_percent).abs() < 5.0);
}

// ===========================================================================
// Serialization
// ===========================================================================

#[test]
fn results_serialize_to_json() {
    let clock = SimulatedClock::new(20).jitter(1.0).seed(5);
    let mut oracle = SpeedupOracle::with_clock(clock.clone())
        .calibration_repetitions(1_000)
        .seed(5);

    let estimate = oracle.measure_infinity_time(clock.operation(100)).unwrap();
    let json = serde_json::to_string(&estimate).expect("should serialize");
    assert!(json.contains("\"slope\""));
    assert!(json.contains("\"samples\""));

    let speedup = oracle
        .measure_percentage_speedup(clock.operation(100), clock.operation(110))
        .unwrap();
    let json = serde_json::to_string(&speedup).expect("should serialize");
    assert!(json.contains("median_percent"));
    assert!(json.contains("p_value"));

    let config_json = serde_json::to_string(oracle.current_config()).unwrap();
    let config: Config = serde_json::from_str(&config_json).unwrap();
    assert_eq!(&config, oracle.current_config());
}

// ===========================================================================
// Convenience functions on the platform clock
// ===========================================================================

#[test]
fn convenience_functions_run() {
    let data: Vec<u32> = (0..128).collect();

    let estimate = speedup_oracle::infinity_time(|| data.iter().map(|x| x ^ 0x55).sum::<u32>())
        .unwrap();
    assert!(estimate.slope.is_finite());
    assert!(!estimate.samples.is_empty());

    let speedup = speedup_oracle::compare(
        || data.iter().sum::<u32>(),
        || data.iter().rev().sum::<u32>(),
    )
    .unwrap();
    assert!(speedup.pairs >= Config::default().min_pairs);
}
