//! System-level preflight checks.
//!
//! Looks for configurations that make the tick rate or the per-call cost
//! drift during a session. None of them prevent measurement; the paired
//! estimator's randomized ordering absorbs slow drift, but point estimates
//! taken minutes apart may disagree.

use serde::{Deserialize, Serialize};

/// Warning from system checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SystemWarning {
    /// CPU frequency scaling is not pinned.
    CpuGovernorNotPerformance {
        /// Current governor setting.
        current: String,
    },

    /// Turbo boost is enabled.
    TurboBoostEnabled,

    /// Running under a hypervisor.
    VirtualMachineDetected,

    /// Other work is competing for the CPU.
    HighSystemLoad {
        /// One-minute load average.
        load_average: f64,
        /// Threshold exceeded.
        threshold: f64,
    },
}

impl SystemWarning {
    /// System warnings are informational only.
    pub fn is_critical(&self) -> bool {
        false
    }

    /// Get a human-readable description of the warning.
    pub fn description(&self) -> String {
        match self {
            SystemWarning::CpuGovernorNotPerformance { current } => format!(
                "CPU frequency governor is '{}'; per-call cost will drift with clock \
                 speed. Set with: sudo cpupower frequency-set -g performance",
                current
            ),
            SystemWarning::TurboBoostEnabled => {
                "Turbo boost is enabled; the core clock varies with thermal headroom \
                 and long runs slow down."
                    .to_string()
            }
            SystemWarning::VirtualMachineDetected => {
                "Running under a hypervisor; steal time and virtualised counters add \
                 jitter."
                    .to_string()
            }
            SystemWarning::HighSystemLoad {
                load_average,
                threshold,
            } => format!(
                "System load is {:.2} (threshold {:.2}); expect preemption spikes.",
                load_average, threshold
            ),
        }
    }
}

/// Load average above which a warning is raised.
const LOAD_THRESHOLD: f64 = 1.0;

/// Perform all system checks.
///
/// On platforms other than Linux, returns an empty vector.
pub fn system_check() -> Vec<SystemWarning> {
    #[cfg(target_os = "linux")]
    {
        [
            linux::cpu_governor(),
            linux::turbo_boost(),
            linux::hypervisor(),
            linux::load_average(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::{SystemWarning, LOAD_THRESHOLD};

    fn read_sys(path: &str) -> Option<String> {
        std::fs::read_to_string(path)
            .ok()
            .map(|s| s.trim().to_lowercase())
    }

    pub(super) fn cpu_governor() -> Option<SystemWarning> {
        let current = read_sys("/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor")?;
        (current != "performance").then_some(SystemWarning::CpuGovernorNotPerformance { current })
    }

    pub(super) fn turbo_boost() -> Option<SystemWarning> {
        if let Some(no_turbo) = read_sys("/sys/devices/system/cpu/intel_pstate/no_turbo") {
            return (no_turbo == "0").then_some(SystemWarning::TurboBoostEnabled);
        }
        let boost = read_sys("/sys/devices/system/cpu/cpufreq/boost")?;
        (boost == "1").then_some(SystemWarning::TurboBoostEnabled)
    }

    pub(super) fn hypervisor() -> Option<SystemWarning> {
        let cpuinfo = read_sys("/proc/cpuinfo")?;
        cpuinfo
            .contains("hypervisor")
            .then_some(SystemWarning::VirtualMachineDetected)
    }

    pub(super) fn load_average() -> Option<SystemWarning> {
        let loadavg = read_sys("/proc/loadavg")?;
        let load: f64 = loadavg.split_whitespace().next()?.parse().ok()?;
        (load > LOAD_THRESHOLD).then_some(SystemWarning::HighSystemLoad {
            load_average: load,
            threshold: LOAD_THRESHOLD,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_check_runs() {
        let warnings = system_check();
        assert!(warnings.iter().all(|w| !w.is_critical()));
    }

    #[test]
    fn test_warning_descriptions() {
        let warning = SystemWarning::CpuGovernorNotPerformance {
            current: "powersave".to_string(),
        };
        assert!(warning.description().contains("powersave"));

        let warning = SystemWarning::HighSystemLoad {
            load_average: 2.5,
            threshold: 1.0,
        };
        assert!(warning.description().contains("2.50"));
    }
}
