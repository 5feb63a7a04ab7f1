//! Sample collection: timed batches and randomized matched pairs.
//!
//! Paired trials time candidate A and candidate B back to back, with the
//! order inside each pair drawn at random so slow drift cannot systematically
//! favour either side:
//! - CPU frequency scaling and thermal throttling
//! - Cache warming/cooling
//! - Branch predictor state

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::clock::ClockSource;
use super::timer::black_box;
use crate::types::{Candidate, PairTiming, Sample, Tick};

/// Time `iterations` back-to-back calls of `op` on `clock`.
///
/// The result includes one clock read's worth of overhead; callers subtract
/// the calibrated overhead where it matters.
#[inline]
pub fn time_batch<C, F, T>(clock: &C, iterations: u64, op: &mut F) -> Tick
where
    C: ClockSource + ?Sized,
    F: FnMut() -> T,
{
    let start = clock.now();
    for _ in 0..iterations {
        black_box(op());
    }
    let end = clock.now();
    clock.elapsed(start, end)
}

/// Collector for gathering timings with a randomized paired design.
#[derive(Debug)]
pub struct Collector<'c, C: ClockSource + ?Sized> {
    clock: &'c C,
    rng: Xoshiro256PlusPlus,
}

impl<'c, C: ClockSource + ?Sized> Collector<'c, C> {
    /// Create a collector. Without a seed the pair order is seeded from the
    /// thread RNG.
    pub fn new(clock: &'c C, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        Self {
            clock,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// The clock being read.
    pub fn clock(&self) -> &C {
        self.clock
    }

    /// Run untimed calls of both candidates.
    ///
    /// This helps stabilize CPU frequency, warm caches, and train branch
    /// predictors before actual measurements begin.
    pub fn warmup<FA, FB, TA, TB>(&self, iterations: usize, a: &mut FA, b: &mut FB)
    where
        FA: FnMut() -> TA,
        FB: FnMut() -> TB,
    {
        for _ in 0..iterations {
            black_box(a());
            black_box(b());
        }
    }

    /// Time `samples` batches of `iterations` calls.
    pub fn collect_level<F, T>(&self, iterations: u64, samples: usize, op: &mut F) -> Vec<Sample>
    where
        F: FnMut() -> T,
    {
        (0..samples)
            .map(|_| Sample::new(iterations, time_batch(self.clock, iterations, &mut *op)))
            .collect()
    }

    /// Collect `count` matched pairs, each trial covering `quantum` calls.
    ///
    /// The order within each pair is a fair coin flip.
    pub fn collect_pairs<FA, FB, TA, TB>(
        &mut self,
        count: usize,
        quantum: u64,
        a: &mut FA,
        b: &mut FB,
    ) -> Vec<PairTiming>
    where
        FA: FnMut() -> TA,
        FB: FnMut() -> TB,
    {
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            let first = if self.rng.random_bool(0.5) {
                Candidate::A
            } else {
                Candidate::B
            };
            let (ta, tb) = match first {
                Candidate::A => {
                    let ta = time_batch(self.clock, quantum, a);
                    let tb = time_batch(self.clock, quantum, b);
                    (ta, tb)
                }
                Candidate::B => {
                    let tb = time_batch(self.clock, quantum, b);
                    let ta = time_batch(self.clock, quantum, a);
                    (ta, tb)
                }
            };
            pairs.push(PairTiming { a: ta, b: tb, first });
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::SimulatedClock;

    #[test]
    fn test_time_batch_counts_calls() {
        let clock = SimulatedClock::new(7);
        let mut op = clock.operation(3);
        assert_eq!(time_batch(&clock, 10, &mut op), 37);
    }

    #[test]
    fn test_collect_level_shapes_samples() {
        let clock = SimulatedClock::new(1);
        let collector = Collector::new(&clock, Some(1));
        assert_eq!(collector.clock().read_cost(), 1);
        let mut op = clock.operation(5);
        let samples = collector.collect_level(8, 3, &mut op);
        assert_eq!(samples.len(), 3);
        for s in samples {
            assert_eq!(s.iterations, 8);
            assert_eq!(s.elapsed, 41);
        }
    }

    #[test]
    fn test_pairs_are_randomized_and_matched() {
        let clock = SimulatedClock::new(0);
        let mut collector = Collector::new(&clock, Some(99));
        let mut a = clock.operation(10);
        let mut b = clock.operation(30);
        let pairs = collector.collect_pairs(200, 2, &mut a, &mut b);

        assert_eq!(pairs.len(), 200);
        assert!(pairs.iter().all(|p| p.a == 20 && p.b == 60));

        let a_first = pairs.iter().filter(|p| p.first == Candidate::A).count();
        assert!((60..=140).contains(&a_first), "a_first = {}", a_first);
    }
}
