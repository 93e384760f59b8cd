//! Best-effort resident memory sampling.
//!
//! Samples are for the whole process. Under thread isolation every concurrent
//! task shares one address space, so a delta attributes everyone's
//! allocations to whichever task happened to be measuring; only process
//! isolation gives per-task numbers.

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Source of resident-memory samples.
pub trait MemoryProbe: Send + Sync {
    /// Current resident set size in MB, or `None` if unavailable.
    fn resident_mb(&self) -> Option<f64>;
}

/// Probe that never samples.
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn resident_mb(&self) -> Option<f64> {
        None
    }
}

/// Probe reading this process's RSS through `sysinfo`.
pub struct ProcessMemoryProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemoryProbe {
    #[must_use]
    pub fn new() -> Self {
        let pid = sysinfo::get_current_pid().ok();
        if pid.is_none() {
            tracing::warn!("cannot determine current pid, memory sampling disabled");
        }
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    #[allow(clippy::cast_precision_loss)]
    fn resident_mb(&self) -> Option<f64> {
        let pid = self.pid?;
        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::new().with_memory(),
        );
        system
            .process(pid)
            .map(|process| process.memory() as f64 / BYTES_PER_MB)
    }
}

/// Difference between two samples; absent if either side is.
#[must_use]
pub fn memory_delta(before: Option<f64>, after: Option<f64>) -> Option<f64> {
    Some(after? - before?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_requires_both_samples() {
        assert_eq!(memory_delta(Some(10.0), Some(12.5)), Some(2.5));
        assert_eq!(memory_delta(None, Some(12.5)), None);
        assert_eq!(memory_delta(Some(10.0), None), None);
    }

    #[test]
    fn no_probe_is_absent() {
        assert!(NoMemoryProbe.resident_mb().is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_probe_reads_own_rss() {
        let probe = ProcessMemoryProbe::new();
        let first = probe.resident_mb().expect("rss of the test process");
        assert!(first > 0.0);
        // Repeated refreshes of the same pid keep working.
        assert!(probe.resident_mb().is_some());
    }

    #[test]
    fn process_probe_samples_or_reports_absent() {
        let probe = ProcessMemoryProbe::new();
        if let Some(mb) = probe.resident_mb() {
            assert!(mb > 0.0);
        }
    }
}
