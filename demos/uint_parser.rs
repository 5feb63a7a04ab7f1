//! Race three ways of parsing unsigned integers from decimal strings.
//!
//! Inputs are generated once into a shared `MeasurementContext`, so each
//! candidate does nothing but parse. Run with `RUST_LOG=debug` to watch the
//! estimators work.

use rand::Rng;
use speedup_oracle::{ClockSource, MeasurementContext, PairedSpeedup, SpeedupOracle};
use tracing_subscriber::EnvFilter;

const BUFFER_SIZE: usize = 1_000;

type Context = MeasurementContext<String, u32>;

/// `str::parse`, the standard library parser.
fn std_parse(ctx: &Context) {
    ctx.run(|inputs, outputs| {
        for (s, out) in inputs.iter().zip(outputs.iter_mut()) {
            *out = s.parse().unwrap_or(0);
        }
    })
}

/// Accumulate digits with no validation.
fn digit_loop(ctx: &Context) {
    ctx.run(|inputs, outputs| {
        for (s, out) in inputs.iter().zip(outputs.iter_mut()) {
            let mut v = 0u32;
            for b in s.bytes() {
                v = v.wrapping_mul(10).wrapping_add(u32::from(b.wrapping_sub(b'0')));
            }
            *out = v;
        }
    })
}

/// Parse into a wider type, then narrow.
fn wide_parse(ctx: &Context) {
    ctx.run(|inputs, outputs| {
        for (s, out) in inputs.iter().zip(outputs.iter_mut()) {
            *out = s.parse::<u64>().map_or(0, |v| v as u32);
        }
    })
}

fn report(label: &str, speedup: &PairedSpeedup) {
    let r = &speedup.interval;
    println!(
        "{:<24}: {:>7.2}% {:>7.2}% {:>7.2}%  (pairs={}, quantum={}, p={:.3})",
        label, r.min_percent, r.median_percent, r.max_percent, speedup.pairs, speedup.quantum,
        speedup.test.p_value
    );
    for warning in &speedup.warnings {
        println!("  warning: {}", warning.description());
    }
}

fn main() -> speedup_oracle::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("initializing input strings...");
    let mut rng = rand::rng();
    let ctx = MeasurementContext::from_fn(
        BUFFER_SIZE,
        |_| rng.random_range(0..u32::MAX).to_string(),
        0u32,
    )?;

    let mut oracle = SpeedupOracle::new();

    println!("calibrating overhead...");
    let cal = oracle.calibrate_overhead()?;
    println!("  clock          : {}", oracle.clock().name());
    println!("  overhead (t_c) ~= {:.1} ticks", cal.overhead_mean);
    println!("  jitter         ~= {:.1} ticks", cal.jitter_sigma);
    for warning in &oracle.preflight().warnings.resolution {
        println!("  warning: {}", warning.description());
    }
    for warning in &oracle.preflight().warnings.system {
        println!("  warning: {}", warning.description());
    }

    println!("\ninfinity time per call:");
    let candidates: [(&str, fn(&Context)); 3] = [
        ("str::parse", std_parse),
        ("digit loop", digit_loop),
        ("u64 parse", wide_parse),
    ];
    let mut estimates = Vec::with_capacity(candidates.len());
    for (label, f) in candidates {
        let estimate = oracle.measure_infinity_time(|| f(&ctx))?;
        let (lo, mid, hi) = estimate.per_call_bounds();
        println!(
            "  {:<12}: {:.0} ticks [{:.0}, {:.0}] ~ {:.1} ns ({:?})",
            label,
            mid,
            lo,
            hi,
            oracle.nanoseconds(mid)?,
            estimate.quality()
        );
        estimates.push(estimate);
    }

    println!("\npoint-estimate speedups (min median max):");
    let point = oracle.point_estimate_speedup(&estimates[1], &estimates[0]);
    println!(
        "  digit loop vs str::parse: {:.2}% {:.2}% {:.2}%",
        point.min_percent, point.median_percent, point.max_percent
    );
    let point = oracle.point_estimate_speedup(&estimates[2], &estimates[0]);
    println!(
        "  u64 parse vs str::parse : {:.2}% {:.2}% {:.2}%",
        point.min_percent, point.median_percent, point.max_percent
    );

    println!("\npaired speedups (min median max):");
    report(
        "digit loop vs str::parse",
        &oracle.measure_percentage_speedup(|| digit_loop(&ctx), || std_parse(&ctx))?,
    );
    report(
        "u64 parse vs str::parse",
        &oracle.measure_percentage_speedup(|| wide_parse(&ctx), || std_parse(&ctx))?,
    );
    report(
        "digit loop vs u64 parse",
        &oracle.measure_percentage_speedup(|| digit_loop(&ctx), || wide_parse(&ctx))?,
    );
    // An operation raced against itself should straddle zero.
    report(
        "str::parse vs str::parse",
        &oracle.measure_percentage_speedup(|| std_parse(&ctx), || std_parse(&ctx))?,
    );

    println!("\nchecking results...");
    for (label, f) in candidates {
        ctx.reset();
        f(&ctx);
        match ctx.first_mismatch(|s, &v| s.parse::<u32>() == Ok(v)) {
            None => println!("  {} is behaving itself", label),
            Some(i) => println!("  {} is broken at input {}", label, i),
        }
    }

    Ok(())
}
