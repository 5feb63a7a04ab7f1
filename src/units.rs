//! Tick to nanosecond conversion.
//!
//! # Fidelity
//!
//! Conversion is advisory. The tick rate is measured once against
//! `std::time::Instant`, but on hardware with dynamic frequency scaling the
//! relationship between ticks and seconds can drift during a session.
//! Comparisons should be made in the tick domain (ratios of tick counts are
//! unaffected by the conversion factor); use nanoseconds only for the final,
//! human-facing report. The estimators never convert internally.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Converts tick counts to nanoseconds using a calibrated tick rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    ticks_per_ns: f64,
}

impl UnitConverter {
    /// Create a converter from a known tick rate.
    ///
    /// Useful for simulated clocks or when calibration has already been done.
    pub fn from_ticks_per_ns(ticks_per_ns: f64) -> Result<Self, ConfigError> {
        if !ticks_per_ns.is_finite() || ticks_per_ns <= 0.0 {
            return Err(ConfigError::TickRate(ticks_per_ns));
        }
        Ok(Self { ticks_per_ns })
    }

    /// Ticks per nanosecond (a 3 GHz TSC gives about 3.0).
    pub fn ticks_per_ns(&self) -> f64 {
        self.ticks_per_ns
    }

    /// Ticks per second.
    pub fn frequency_hz(&self) -> f64 {
        self.ticks_per_ns * 1e9
    }

    /// Convert a (possibly fractional) tick count to nanoseconds.
    #[inline]
    pub fn ticks_to_nanoseconds(&self, ticks: f64) -> f64 {
        ticks / self.ticks_per_ns
    }

    /// Convert nanoseconds back to ticks.
    #[inline]
    pub fn nanoseconds_to_ticks(&self, ns: f64) -> f64 {
        ns * self.ticks_per_ns
    }
}
