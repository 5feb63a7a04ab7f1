use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use speedup_oracle::measurement::{time_batch, Collector, SimulatedClock};
use speedup_oracle::statistics::{fit_lad, signed_rank_interval};
use speedup_oracle::SpeedupOracle;

fn noisy_line(n: usize, rng: &mut Xoshiro256PlusPlus) -> (Vec<f64>, Vec<f64>) {
    let xs: Vec<f64> = (0..n).map(|i| (1u64 << (i % 20)) as f64).collect();
    let ys = xs
        .iter()
        .map(|x| 250.0 * x + 40.0 + rng.random_range(-20.0..20.0))
        .collect();
    (xs, ys)
}

fn bench_statistics(c: &mut Criterion) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);

    let mut group = c.benchmark_group("lad");
    for n in [12usize, 48, 192] {
        let (xs, ys) = noisy_line(n, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(fit_lad(&xs, &ys)));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("signed_rank_interval");
    for n in [32usize, 256, 1_024] {
        let diffs: Vec<f64> = (0..n).map(|_| rng.random_range(-0.1..0.3)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(signed_rank_interval(&diffs, 0.95)));
        });
    }
    group.finish();
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection");
    group.sample_size(20);

    let clock = SimulatedClock::new(20).jitter(3.0).seed(1);
    let mut op = clock.operation(100);
    group.bench_function("time_batch_1024", |b| {
        b.iter(|| black_box(time_batch(&clock, 1_024, &mut op)));
    });

    let mut a = clock.operation(100);
    let mut other = clock.operation(120);
    group.bench_function("collect_pairs_256", |b| {
        let mut collector = Collector::new(&clock, Some(3));
        b.iter(|| black_box(collector.collect_pairs(256, 4, &mut a, &mut other)));
    });
    group.finish();
}

fn bench_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimators");
    group.sample_size(10);

    group.bench_function("paired_simulated", |b| {
        b.iter(|| {
            // Small pair counts keep each iteration short.
            let clock = SimulatedClock::new(20).jitter(5.0).seed(11);
            let fast = clock.operation(100);
            let slow = clock.operation(120);
            let mut oracle = SpeedupOracle::with_clock(clock)
                .calibration_repetitions(1_000)
                .pairs(32, 64)
                .seed(11);
            black_box(oracle.measure_percentage_speedup(fast, slow).ok())
        });
    });

    group.bench_function("infinity_simulated", |b| {
        b.iter(|| {
            let clock = SimulatedClock::new(40).jitter(1.0).seed(5);
            let op = clock.operation(250);
            let mut oracle = SpeedupOracle::with_clock(clock).calibration_repetitions(1_000);
            black_box(oracle.measure_infinity_time(op).ok().map(|e| e.slope))
        });
    });
    group.finish();
}

criterion_group!(benches, bench_statistics, bench_collection, bench_estimators);
criterion_main!(benches);
