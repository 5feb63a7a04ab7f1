//! Type aliases and common types.

use serde::{Deserialize, Serialize};

/// Raw reading of a [`ClockSource`](crate::measurement::ClockSource).
///
/// Ticks are opaque: they are only guaranteed to be monotonically
/// non-decreasing (modulo counter width) and are not assumed to map linearly
/// to wall-clock time.
pub type Tick = u64;

/// Which of the two candidates in a paired comparison a timing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Candidate {
    /// First operation; a positive speedup means this one is faster.
    A,
    /// Second operation, the reference for the speedup.
    B,
}

/// One timed batch: `iterations` back-to-back calls took `elapsed` ticks.
///
/// Samples for a single estimation are kept in the order they were taken,
/// which is also the order of non-decreasing iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Number of calls in the batch (always positive).
    pub iterations: u64,
    /// Ticks elapsed across the batch, including clock overhead.
    pub elapsed: Tick,
}

impl Sample {
    /// Create a new sample.
    ///
    /// A zero iteration count is bumped to one; a batch always contains at
    /// least one call.
    pub fn new(iterations: u64, elapsed: Tick) -> Self {
        Self {
            iterations: iterations.max(1),
            elapsed,
        }
    }

    /// Elapsed ticks per call, overhead included.
    pub fn ticks_per_call(&self) -> f64 {
        self.elapsed as f64 / self.iterations as f64
    }
}

/// Timings of one matched pair, each covering `quantum` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTiming {
    /// Ticks for candidate A.
    pub a: Tick,
    /// Ticks for candidate B.
    pub b: Tick,
    /// Which candidate was timed first in this pair.
    pub first: Candidate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_at_least_one_call() {
        let s = Sample::new(0, 90);
        assert_eq!(s.iterations, 1);
        assert_eq!(s.ticks_per_call(), 90.0);
    }

    #[test]
    fn test_ticks_per_call() {
        let s = Sample::new(8, 1_000);
        assert_eq!(s.ticks_per_call(), 125.0);
    }
}
