//! Clock abstraction shared by every estimator.
//!
//! This module provides:
//! - `ClockSource` - the `now`/`elapsed` contract the estimators depend on
//! - `SystemClock` - an enum wrapping the real clock implementations
//! - `ClockSpec` - specification for which real clock to use
//!
//! Clock implementations:
//! - `CycleClock` - hardware tick counter (rdtsc/cntvct_el0)
//! - `MonotonicClock` - coarse `std::time::Instant` fallback
//! - `SimulatedClock` - deterministic virtual clock for tests

use super::timer::{CycleClock, MonotonicClock};
use crate::types::Tick;

/// A monotonic tick counter.
///
/// Estimators only ever call `now` and `elapsed`, so any implementation can be
/// swapped in without touching estimator logic, including a coarse system
/// clock or a simulated one.
pub trait ClockSource {
    /// Read the counter. Must not have side effects beyond reading
    /// hardware/OS state.
    fn now(&self) -> Tick;

    /// Ticks between two readings taken in order.
    ///
    /// The default uses wrapping subtraction, which gives the right answer
    /// for a full-width counter that wrapped once between the readings.
    /// Narrower counters override this to mask the result.
    #[inline]
    fn elapsed(&self, start: Tick, end: Tick) -> Tick {
        end.wrapping_sub(start)
    }

    /// Short name for diagnostics and logs.
    fn name(&self) -> &'static str;
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    #[inline]
    fn now(&self) -> Tick {
        (**self).now()
    }

    #[inline]
    fn elapsed(&self, start: Tick, end: Tick) -> Tick {
        (**self).elapsed(start, end)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// A real clock that can be any of the supported implementations.
///
/// This enum-based approach keeps `SpeedupOracle` free of a type parameter
/// in the common case while still dispatching without a vtable.
#[derive(Debug, Clone, Copy)]
pub enum SystemClock {
    /// Hardware tick counter.
    Cycle(CycleClock),
    /// `std::time::Instant` in nanoseconds.
    Monotonic(MonotonicClock),
}

impl ClockSource for SystemClock {
    #[inline]
    fn now(&self) -> Tick {
        match self {
            SystemClock::Cycle(c) => c.now(),
            SystemClock::Monotonic(c) => c.now(),
        }
    }

    #[inline]
    fn elapsed(&self, start: Tick, end: Tick) -> Tick {
        match self {
            SystemClock::Cycle(c) => c.elapsed(start, end),
            SystemClock::Monotonic(c) => c.elapsed(start, end),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SystemClock::Cycle(c) => c.name(),
            SystemClock::Monotonic(c) => c.name(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        ClockSpec::Auto.create_clock()
    }
}

/// Specification for which real clock to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClockSpec {
    /// Hardware counter where one exists (x86_64, aarch64), otherwise
    /// `Instant`.
    #[default]
    Auto,

    /// Always the hardware counter path (falls back to `Instant` internally
    /// on unsupported architectures).
    CycleCounter,

    /// Always `std::time::Instant`. Much coarser; estimates take longer to
    /// converge but the result should not change.
    Monotonic,
}

impl ClockSpec {
    /// Create a clock based on this specification.
    pub fn create_clock(&self) -> SystemClock {
        match self {
            ClockSpec::Auto => {
                if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
                    SystemClock::Cycle(CycleClock::new())
                } else {
                    SystemClock::Monotonic(MonotonicClock::new())
                }
            }
            ClockSpec::CycleCounter => SystemClock::Cycle(CycleClock::new()),
            ClockSpec::Monotonic => SystemClock::Monotonic(MonotonicClock::new()),
        }
    }
}

impl std::fmt::Display for ClockSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockSpec::Auto => write!(f, "Auto"),
            ClockSpec::CycleCounter => write!(f, "CycleCounter"),
            ClockSpec::Monotonic => write!(f, "Monotonic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Tick);

    impl ClockSource for Fixed {
        fn now(&self) -> Tick {
            self.0
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_default_elapsed_wraps() {
        let clock = Fixed(0);
        assert_eq!(clock.elapsed(u64::MAX - 4, 5), 10);
        assert_eq!(clock.elapsed(100, 150), 50);
    }

    #[test]
    fn test_reference_forwards() {
        let clock = Fixed(42);
        let by_ref: &dyn ClockSource = &clock;
        assert_eq!((&by_ref).now(), 42);
        assert_eq!((&clock).name(), "fixed");
    }

    #[test]
    fn test_spec_creates_requested_clock() {
        assert_eq!(ClockSpec::Monotonic.create_clock().name(), "instant");
        assert!(matches!(
            ClockSpec::CycleCounter.create_clock(),
            SystemClock::Cycle(_)
        ));
        assert_eq!(ClockSpec::default().to_string(), "Auto");
    }
}
