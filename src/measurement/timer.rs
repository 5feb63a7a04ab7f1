//! Platform-specific tick counters.
//!
//! Provides tick-accurate clocks using:
//! - x86_64: `lfence; rdtsc` with compiler fence
//! - aarch64: `isb; mrs cntvct_el0`
//! - Fallback: `std::time::Instant` for other platforms

use std::hint::black_box as std_black_box;
use std::time::Instant;

use super::clock::ClockSource;
use crate::types::Tick;

/// Wrapper around `std::hint::black_box` for preventing compiler optimizations.
///
/// Every result returned by a timed operation goes through this, so the
/// compiler cannot discard the call as dead code or move it across the clock
/// reads.
#[inline]
pub fn black_box<T>(x: T) -> T {
    std_black_box(x)
}

/// Read the CPU tick counter with appropriate serialization.
///
/// On x86_64, this uses `lfence; rdtsc` to ensure all prior instructions
/// complete before reading the timestamp counter.
///
/// On aarch64, this uses `isb; mrs cntvct_el0` for the virtual timer count.
///
/// On other platforms, falls back to nanoseconds since the first call.
#[inline]
pub fn read_counter() -> Tick {
    #[cfg(target_arch = "x86_64")]
    {
        rdtsc_x86_64()
    }

    #[cfg(target_arch = "aarch64")]
    {
        cntvct_aarch64()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        counter_fallback()
    }
}

/// x86_64 implementation using lfence + rdtsc.
#[cfg(target_arch = "x86_64")]
#[inline]
fn rdtsc_x86_64() -> Tick {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let ticks: u64;
    unsafe {
        // lfence serializes instruction execution
        // rdtsc reads the timestamp counter
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") ticks,
            out("rdx") _,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    ticks
}

/// aarch64 implementation using isb + mrs cntvct_el0.
#[cfg(target_arch = "aarch64")]
#[inline]
fn cntvct_aarch64() -> Tick {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    let ticks: u64;
    unsafe {
        // isb ensures all prior instructions are complete
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) ticks,
            options(nostack, nomem),
        );
    }

    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);

    ticks
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
#[inline]
fn counter_fallback() -> Tick {
    use std::sync::OnceLock;
    static START: OnceLock<Instant> = OnceLock::new();

    let start = START.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

/// The hardware tick counter (`rdtsc` / `cntvct_el0`).
///
/// On x86_64 the TSC is 64 bits wide and never wraps in practice; elapsed
/// time still uses wrapping subtraction so a wrap would be harmless.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleClock;

impl CycleClock {
    /// Create the hardware clock.
    pub fn new() -> Self {
        Self
    }
}

impl ClockSource for CycleClock {
    #[inline]
    fn now(&self) -> Tick {
        read_counter()
    }

    fn name(&self) -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            "rdtsc"
        }
        #[cfg(target_arch = "aarch64")]
        {
            "cntvct_el0"
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            "instant-fallback"
        }
    }
}

/// Coarse fallback clock: nanoseconds since the clock was created.
///
/// Lower resolution and higher read cost than [`CycleClock`], but available
/// everywhere. Ticks are nanoseconds, so a converter with one tick per
/// nanosecond is exact for this clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    #[inline]
    fn now(&self) -> Tick {
        self.origin.elapsed().as_nanos() as u64
    }

    fn name(&self) -> &'static str {
        "instant"
    }
}
