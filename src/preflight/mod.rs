//! Preflight checks run before a session starts measuring.
//!
//! # Checks Performed
//!
//! - **Clock**: the tick source advances and never steps backwards (fatal)
//! - **Resolution**: calibration readings are not dominated by quantisation
//! - **System**: platform conditions that make the tick rate drift
//!   (e.g., CPU governor on Linux)
//!
//! Only the clock check can fail a session. The others collect warnings in a
//! [`PreflightResult`] that is logged and kept on the oracle for inspection.

mod clock;
mod resolution;
mod system;

pub use clock::{check_clock, ADVANCE_WINDOW, CONSECUTIVE_READS};
pub use resolution::{resolution_check, ResolutionWarning};
pub use system::{system_check, SystemWarning};

use serde::{Deserialize, Serialize};

use crate::types::Tick;

/// Result of running the non-fatal preflight checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightResult {
    /// All warnings collected from preflight checks.
    pub warnings: PreflightWarnings,

    /// Whether any critical warnings were found.
    pub has_critical: bool,
}

impl PreflightResult {
    /// Create a new empty preflight result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resolution warning.
    pub fn add_resolution_warning(&mut self, warning: ResolutionWarning) {
        if warning.is_critical() {
            self.has_critical = true;
        }
        tracing::warn!(check = "resolution", "{}", warning.description());
        self.warnings.resolution.push(warning);
    }

    /// Add a system warning.
    pub fn add_system_warning(&mut self, warning: SystemWarning) {
        tracing::warn!(check = "system", "{}", warning.description());
        self.warnings.system.push(warning);
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Collection of all warnings from preflight checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreflightWarnings {
    /// Warnings from the calibration-reading resolution check.
    pub resolution: Vec<ResolutionWarning>,

    /// Warnings from system checks.
    pub system: Vec<SystemWarning>,
}

impl PreflightWarnings {
    /// Get total number of warnings.
    pub fn count(&self) -> usize {
        self.resolution.len() + self.system.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Run the non-fatal checks against overhead calibration readings.
pub fn run_all_checks(calibration_readings: &[Tick]) -> PreflightResult {
    let mut result = PreflightResult::new();

    if let Some(warning) = resolution_check(calibration_readings) {
        result.add_resolution_warning(warning);
    }

    for warning in system_check() {
        result.add_system_warning(warning);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_resolution_marks_result() {
        let mut result = PreflightResult::new();
        assert!(!result.has_warnings());

        result.add_resolution_warning(ResolutionWarning::InsufficientResolution {
            unique_values: 2,
            total_samples: 1000,
            zero_fraction: 0.9,
        });
        assert!(result.has_critical);
        assert_eq!(result.warnings.count(), 1);
    }

    #[test]
    fn test_system_warnings_are_not_critical() {
        let mut result = PreflightResult::new();
        result.add_system_warning(SystemWarning::TurboBoostEnabled);
        assert!(result.has_warnings());
        assert!(!result.has_critical);
    }

    #[test]
    fn test_run_all_checks_flags_coarse_readings() {
        let result = run_all_checks(&[0; 1000]);
        assert!(result.has_critical);
        assert_eq!(result.warnings.resolution.len(), 1);
    }
}
