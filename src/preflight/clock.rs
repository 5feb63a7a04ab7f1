//! Clock sanity check.
//!
//! A clock that never advances or that steps backwards makes every estimate
//! meaningless, so unlike the other preflight checks this one is fatal.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::measurement::ClockSource;

/// Wall-time window in which the clock must advance at least once.
pub const ADVANCE_WINDOW: Duration = Duration::from_millis(50);

/// Consecutive reads inspected for backward steps.
pub const CONSECUTIVE_READS: usize = 1_000;

/// Verify that `clock` advances and never runs backwards.
///
/// A reading lower than its predecessor is accepted as a counter wrap when
/// the wrapped-forward distance reported by [`ClockSource::elapsed`] is
/// shorter than the backward distance; anything else is a backward step.
///
/// # Errors
///
/// [`Error::ClockFailure`] if the clock is frozen for [`ADVANCE_WINDOW`] or
/// steps backwards within [`CONSECUTIVE_READS`] reads.
pub fn check_clock<C: ClockSource + ?Sized>(clock: &C) -> Result<()> {
    let start = clock.now();
    let wall = Instant::now();
    loop {
        let now = clock.now();
        if clock.elapsed(start, now) > 0 {
            break;
        }
        if wall.elapsed() >= ADVANCE_WINDOW {
            return Err(Error::ClockFailure {
                clock: clock.name(),
                reason: format!("did not advance within {:?}", ADVANCE_WINDOW),
            });
        }
        std::hint::spin_loop();
    }

    let mut previous = clock.now();
    for read in 1..CONSECUTIVE_READS {
        let current = clock.now();
        if current < previous {
            let forward = clock.elapsed(previous, current);
            let backward = previous - current;
            if forward >= backward {
                return Err(Error::ClockFailure {
                    clock: clock.name(),
                    reason: format!(
                        "stepped backwards by {} ticks at read {} ({} -> {})",
                        backward, read, previous, current
                    ),
                });
            }
        }
        previous = current;
    }

    tracing::debug!(clock = clock.name(), "clock passed sanity check");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{MonotonicClock, SimulatedClock, SystemClock};
    use crate::types::Tick;
    use std::cell::Cell;

    struct Sawtooth {
        next: Cell<Tick>,
    }

    impl ClockSource for Sawtooth {
        fn now(&self) -> Tick {
            let t = self.next.get();
            // Drops back by 500 every 100 reads
            let step = if t % 1_000 == 990 { 0u64.wrapping_sub(500) } else { 10 };
            self.next.set(t.wrapping_add(step));
            t
        }

        fn name(&self) -> &'static str {
            "sawtooth"
        }
    }

    #[test]
    fn test_real_clocks_pass() {
        check_clock(&MonotonicClock::new()).unwrap();
        check_clock(&SystemClock::default()).unwrap();
    }

    #[test]
    fn test_frozen_clock_fails() {
        let clock = SimulatedClock::new(0);
        let err = check_clock(&clock).unwrap_err();
        assert!(matches!(err, Error::ClockFailure { clock: "simulated", .. }));
    }

    #[test]
    fn test_wrapping_counter_passes() {
        let clock = SimulatedClock::new(30).counter_bits(16).starting_at(60_000);
        check_clock(&clock).unwrap();
    }

    #[test]
    fn test_backward_step_fails() {
        let clock = Sawtooth {
            next: Cell::new(0),
        };
        let err = check_clock(&clock).unwrap_err();
        match err {
            Error::ClockFailure { clock, reason } => {
                assert_eq!(clock, "sawtooth");
                assert!(reason.contains("backwards"), "{}", reason);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
