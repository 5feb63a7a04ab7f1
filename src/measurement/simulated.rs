//! Deterministic virtual clock for exercising the estimators.
//!
//! A `SimulatedClock` keeps virtual time in a shared cell. Reading the clock
//! costs `read_cost` ticks plus Gaussian jitter, and synthetic operations
//! created from the clock advance it by their configured cost. Because the
//! estimators only see `now`/`elapsed`, they cannot tell this clock from
//! hardware, which makes their statistical properties testable with known
//! ground truth.
//!
//! Clones share the same virtual time. The clock is `!Send`, matching the
//! single-session measurement model.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::clock::ClockSource;
use crate::types::Tick;

#[derive(Debug)]
struct SimState {
    now: Cell<Tick>,
    rng: RefCell<Xoshiro256PlusPlus>,
}

/// Virtual clock with configurable read overhead, jitter, and counter width.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    read_cost: u64,
    jitter_sigma: f64,
    mask: u64,
    state: Rc<SimState>,
}

impl SimulatedClock {
    /// Create a clock whose reads cost `read_cost` ticks and have no jitter.
    pub fn new(read_cost: u64) -> Self {
        Self {
            read_cost,
            jitter_sigma: 0.0,
            mask: u64::MAX,
            state: Rc::new(SimState {
                now: Cell::new(0),
                rng: RefCell::new(Xoshiro256PlusPlus::seed_from_u64(0)),
            }),
        }
    }

    /// Add zero-mean Gaussian jitter with this standard deviation (ticks) to
    /// every read. The advance per read is clamped at zero, so time never
    /// runs backwards.
    pub fn jitter(mut self, sigma: f64) -> Self {
        self.jitter_sigma = sigma.max(0.0);
        self
    }

    /// Reseed the jitter/spike generator.
    pub fn seed(self, seed: u64) -> Self {
        *self.state.rng.borrow_mut() = Xoshiro256PlusPlus::seed_from_u64(seed);
        self
    }

    /// Emulate a counter only `bits` wide (1..=64); readings wrap.
    pub fn counter_bits(mut self, bits: u32) -> Self {
        let bits = bits.clamp(1, 64);
        self.mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        self
    }

    /// Start virtual time at `ticks` (useful with narrow counters).
    pub fn starting_at(self, ticks: Tick) -> Self {
        self.state.now.set(ticks);
        self
    }

    /// Advance virtual time without a read.
    pub fn advance(&self, ticks: u64) {
        let now = self.state.now.get();
        self.state.now.set(now.wrapping_add(ticks));
    }

    /// Current virtual time, unmasked and without read cost.
    pub fn virtual_time(&self) -> Tick {
        self.state.now.get()
    }

    /// Configured read cost in ticks.
    pub fn read_cost(&self) -> u64 {
        self.read_cost
    }

    /// Configured jitter standard deviation in ticks.
    pub fn jitter_sigma(&self) -> f64 {
        self.jitter_sigma
    }

    /// A synthetic operation that costs exactly `cost` ticks per call.
    ///
    /// The returned value is the virtual time after the call, so results are
    /// observable like any real candidate's.
    pub fn operation(&self, cost: u64) -> impl FnMut() -> Tick {
        let clock = self.clone();
        move || {
            clock.advance(cost);
            clock.virtual_time()
        }
    }

    /// A synthetic operation of `cost` ticks that, with probability
    /// `spike_probability`, is delayed by an extra `spike_ticks`, imitating
    /// preemption or burst load.
    pub fn spiky_operation(
        &self,
        cost: u64,
        spike_probability: f64,
        spike_ticks: u64,
    ) -> impl FnMut() -> Tick {
        let clock = self.clone();
        let p = spike_probability.clamp(0.0, 1.0);
        move || {
            let spike = clock.state.rng.borrow_mut().random_bool(p);
            clock.advance(if spike { cost + spike_ticks } else { cost });
            clock.virtual_time()
        }
    }

    fn read_advance(&self) -> u64 {
        if self.jitter_sigma == 0.0 {
            return self.read_cost;
        }
        let z: f64 = StandardNormal.sample(&mut *self.state.rng.borrow_mut());
        (self.read_cost as f64 + self.jitter_sigma * z).round().max(0.0) as u64
    }
}

impl ClockSource for SimulatedClock {
    fn now(&self) -> Tick {
        self.advance(self.read_advance());
        self.state.now.get() & self.mask
    }

    fn elapsed(&self, start: Tick, end: Tick) -> Tick {
        end.wrapping_sub(start) & self.mask
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cost_without_jitter() {
        let clock = SimulatedClock::new(20);
        let start = clock.now();
        let end = clock.now();
        assert_eq!(clock.elapsed(start, end), 20);
    }

    #[test]
    fn test_operation_advances_clock() {
        let clock = SimulatedClock::new(10);
        let mut op = clock.operation(100);
        let start = clock.now();
        op();
        op();
        let end = clock.now();
        assert_eq!(clock.elapsed(start, end), 210);
    }

    #[test]
    fn test_jitter_never_goes_backwards() {
        let clock = SimulatedClock::new(5).jitter(50.0).seed(3);
        let mut last = clock.now();
        for _ in 0..10_000 {
            let next = clock.now();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn test_narrow_counter_wraps() {
        let clock = SimulatedClock::new(0).counter_bits(16).starting_at(65_530);
        let start = clock.now();
        clock.advance(20);
        let end = clock.now();
        assert!(end < start, "reading should have wrapped");
        assert_eq!(clock.elapsed(start, end), 20);
    }

    #[test]
    fn test_spikes_add_delay() {
        let clock = SimulatedClock::new(0).seed(1);
        let mut always = clock.spiky_operation(10, 1.0, 1_000);
        let start = clock.now();
        always();
        assert_eq!(clock.elapsed(start, clock.now()), 1_010);
    }
}
