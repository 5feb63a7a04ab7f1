//! Measurement infrastructure for benchmarking.
//!
//! This module provides:
//! - The `ClockSource` abstraction and its hardware, OS and simulated clocks
//! - Clock calibration (read overhead, jitter, advisory tick rate)
//! - Timed batches and randomized matched-pair collection
//! - Upper-tail outlier trimming for calibration readings
//!
//! # Clock Selection
//!
//! By default, timing uses platform tick counters:
//! - **x86_64**: serialized `rdtsc` (invariant TSC on modern parts)
//! - **aarch64**: `cntvct_el0` virtual timer (resolution varies by SoC)
//!
//! ARM64 counter frequency depends on the SoC:
//! - ARMv8.6+ (Graviton4): 1 GHz
//! - Apple Silicon: 24 MHz
//! - Raspberry Pi 4: 54 MHz
//!
//! On coarse counters a single call is often shorter than one tick; the
//! paired estimator's automatic quantum batches calls until the clock
//! jitter is small against the trial time.

mod calibration;
mod clock;
mod collector;
mod outlier;
mod simulated;
mod timer;

pub use calibration::{calibrate_frequency, calibrate_overhead, Calibration};
pub(crate) use calibration::measure_overhead;
pub use clock::{ClockSource, ClockSpec, SystemClock};
pub use collector::{time_batch, Collector};
pub use outlier::{filter_outliers, OutlierStats};
pub use simulated::SimulatedClock;
pub use timer::{black_box, read_counter, CycleClock, MonotonicClock};
