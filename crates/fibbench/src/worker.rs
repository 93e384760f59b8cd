//! Process isolation: one child process per task.
//!
//! The parent re-executes its own binary with the hidden `--worker` flag. The
//! child computes a single task, samples its own memory and prints one
//! `WorkerReport` as JSON on stdout.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use num_bigint::BigUint;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use fibbench_core::calculator::FibError;
use fibbench_core::constants::{exit_codes, WORKER_STACK_SIZE};
use fibbench_core::registry::{CalculatorFactory, DefaultFactory};
use fibbench_orchestration::interfaces::{ResultRecord, TaskRequest, TaskRunner};
use fibbench_orchestration::memory::{MemoryProbe, NoMemoryProbe, ProcessMemoryProbe};
use fibbench_orchestration::worker::execute_task;

use crate::config::AppConfig;

/// What a child process reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub value: Option<String>,
    pub error: Option<FibError>,
    pub elapsed_secs: f64,
    pub memory_mb: Option<f64>,
}

impl From<&ResultRecord> for WorkerReport {
    fn from(record: &ResultRecord) -> Self {
        Self {
            value: record.value().map(ToString::to_string),
            error: record.error().cloned(),
            elapsed_secs: record.elapsed.as_secs_f64(),
            memory_mb: record.memory_mb,
        }
    }
}

impl WorkerReport {
    /// Turn the report into a record for `request`.
    #[must_use]
    pub fn into_record(self, request: &TaskRequest) -> ResultRecord {
        let elapsed = Duration::try_from_secs_f64(self.elapsed_secs).unwrap_or_default();
        let outcome = match (self.value, self.error) {
            (_, Some(error)) => Err(error),
            (Some(value), None) => BigUint::parse_bytes(value.as_bytes(), 10)
                .ok_or_else(|| FibError::Worker(format!("unparseable value {value:?}"))),
            (None, None) => Err(FibError::Worker("empty worker report".into())),
        };
        ResultRecord {
            slot: request.slot,
            label: request.label.clone(),
            algorithm: request.calculator.name().to_string(),
            kind: request.kind(),
            n: request.n,
            outcome,
            elapsed,
            memory_mb: self.memory_mb,
        }
    }
}

/// Runs each task in a fresh child process.
///
/// Children still running are tracked by pid so a round that misses its
/// deadline can kill them.
pub struct ProcessRunner {
    exe: PathBuf,
    recursion_cap: u64,
    sample_memory: bool,
    pin: bool,
    live: Mutex<HashMap<u32, Child>>,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(exe: PathBuf, recursion_cap: u64, sample_memory: bool, pin: bool) -> Self {
        Self {
            exe,
            recursion_cap,
            sample_memory,
            pin,
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Runner that re-executes the current binary.
    pub fn current_exe(recursion_cap: u64, sample_memory: bool, pin: bool) -> Result<Self> {
        let exe = std::env::current_exe().context("cannot locate the current executable")?;
        Ok(Self::new(exe, recursion_cap, sample_memory, pin))
    }

    /// Pids of children that have not finished yet.
    #[must_use]
    pub fn live_workers(&self) -> Vec<u32> {
        self.live.lock().keys().copied().collect()
    }

    fn command(&self, request: &TaskRequest) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.arg("--worker")
            .arg(request.kind().cli_name())
            .arg(format!("--n={}", request.n))
            .arg(format!("--recursive-limit={}", self.recursion_cap))
            .arg(format!("--slot={}", request.slot))
            .arg(format!("--label={}", request.label))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if !self.sample_memory {
            cmd.arg("--no-memory");
        }
        if self.pin {
            cmd.arg("--pin");
        }
        cmd
    }
}

impl TaskRunner for ProcessRunner {
    fn run(&self, request: &TaskRequest) -> ResultRecord {
        let started = Instant::now();

        // Spawn and register under one lock so a cancel never misses a child.
        let spawned = {
            let mut live = self.live.lock();
            self.command(request).spawn().map(|mut child| {
                let stdout = child.stdout.take();
                let pid = child.id();
                live.insert(pid, child);
                (pid, stdout)
            })
        };
        let (pid, stdout) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                error!(label = %request.label, "failed to spawn worker: {e}");
                return ResultRecord::failed(
                    request,
                    FibError::Worker(format!("failed to spawn worker: {e}")),
                    started.elapsed(),
                );
            }
        };

        let mut output = Vec::new();
        if let Some(mut stdout) = stdout {
            if let Err(e) = stdout.read_to_end(&mut output) {
                warn!(label = %request.label, pid, "reading worker output failed: {e}");
            }
        }

        let Some(mut child) = self.live.lock().remove(&pid) else {
            return ResultRecord::failed(
                request,
                FibError::Worker("worker killed after the round deadline".into()),
                started.elapsed(),
            );
        };
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                error!(label = %request.label, pid, "waiting for worker failed: {e}");
                return ResultRecord::failed(
                    request,
                    FibError::Worker(format!("waiting for worker failed: {e}")),
                    started.elapsed(),
                );
            }
        };

        match serde_json::from_slice::<WorkerReport>(&output) {
            Ok(report) => {
                debug!(label = %request.label, %status, "worker reported");
                report.into_record(request)
            }
            Err(e) => {
                let reason = if status.success() {
                    format!("malformed worker report: {e}")
                } else {
                    format!("worker exited with {status}")
                };
                error!(label = %request.label, "{reason}");
                ResultRecord::failed(request, FibError::Worker(reason), started.elapsed())
            }
        }
    }

    fn cancel_pending(&self) {
        for (pid, mut child) in self.live.lock().drain() {
            warn!(pid, "killing worker still running after the round deadline");
            if let Err(e) = child.kill() {
                debug!(pid, "kill failed: {e}");
            }
            if let Err(e) = child.wait() {
                debug!(pid, "reaping killed worker failed: {e}");
            }
        }
    }
}

impl Drop for ProcessRunner {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Child side: compute the one task named by `--worker` and print its report.
///
/// The task runs on a thread with the same stack size as the worker pool, so
/// deep recursion behaves the same under either isolation.
pub fn run_child(config: &AppConfig, method: &str) -> Result<i32> {
    let factory = DefaultFactory::new(config.recursive_limit);
    let calculator = factory.get(method)?;

    let label = config
        .label
        .clone()
        .unwrap_or_else(|| format!("{}-worker", calculator.kind().cli_name()));
    let request = TaskRequest::new(calculator, config.n, label, config.slot);

    let probe: Arc<dyn MemoryProbe> = if config.no_memory {
        Arc::new(NoMemoryProbe)
    } else {
        Arc::new(ProcessMemoryProbe::new())
    };

    let pin = config.pin.then_some(config.slot);
    let record = std::thread::Builder::new()
        .name("fibbench-worker".into())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || {
            if let Some(slot) = pin {
                pin_to_slot(slot);
            }
            execute_task(&request, probe.as_ref())
        })
        .context("failed to start worker thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &WorkerReport::from(&record))?;
    writeln!(stdout)?;
    Ok(exit_codes::SUCCESS)
}

fn pin_to_slot(slot: usize) {
    let Some(cores) = core_affinity::get_core_ids().filter(|c| !c.is_empty()) else {
        debug!("core ids unavailable, not pinning");
        return;
    };
    let core = cores[slot % cores.len()];
    if !core_affinity::set_for_current(core) {
        debug!(core = core.id, "cpu pinning not supported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TaskRequest {
        let factory = DefaultFactory::default();
        TaskRequest::new(factory.get("iterative").unwrap(), 20, "iterative-worker", 4)
    }

    #[test]
    fn report_into_record_value() {
        let report = WorkerReport {
            value: Some("6765".into()),
            error: None,
            elapsed_secs: 0.25,
            memory_mb: Some(1.0),
        };
        let record = report.into_record(&request());
        assert_eq!(record.value(), Some(&BigUint::from(6765u32)));
        assert_eq!(record.slot, 4);
        assert_eq!(record.elapsed, Duration::from_millis(250));
        assert_eq!(record.memory_mb, Some(1.0));
    }

    #[test]
    fn report_into_record_keeps_error_variant() {
        let report = WorkerReport {
            value: None,
            error: Some(FibError::InvalidInput(-1)),
            elapsed_secs: 0.0,
            memory_mb: None,
        };
        let record = report.into_record(&request());
        assert_eq!(record.error(), Some(&FibError::InvalidInput(-1)));
        assert_eq!(
            record.error().unwrap().to_string(),
            "invalid input: index -1 is negative"
        );
    }

    #[test]
    fn report_json_round_trip_from_failed_record() {
        let factory = DefaultFactory::new(10);
        let request = TaskRequest::new(factory.get("recursive").unwrap(), 12, "recursive-worker", 0);
        let record = execute_task(&request, &NoMemoryProbe);
        let json = serde_json::to_string(&WorkerReport::from(&record)).unwrap();
        let back: WorkerReport = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.into_record(&request).error(),
            Some(&FibError::RecursionBudgetExceeded { n: 12, cap: 10 })
        );
    }

    #[test]
    fn report_json_round_trip_from_record() {
        let record = execute_task(&request(), &NoMemoryProbe);
        let json = serde_json::to_string(&WorkerReport::from(&record)).unwrap();
        let back: WorkerReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value.as_deref(), Some("6765"));
        assert!(back.error.is_none());
    }

    #[test]
    fn spawn_failure_is_a_record() {
        let runner = ProcessRunner::new(PathBuf::from("/nonexistent/fibbench"), 30, false, false);
        let record = runner.run(&request());
        assert!(matches!(record.error(), Some(FibError::Worker(msg)) if msg.contains("spawn")));
        assert!(runner.live_workers().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn cancel_kills_running_workers() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("stuck-worker");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = Arc::new(ProcessRunner::new(script, 30, false, false));
        let worker = {
            let runner = Arc::clone(&runner);
            std::thread::spawn(move || runner.run(&request()))
        };

        let deadline = Instant::now() + Duration::from_secs(10);
        let pid = loop {
            if let Some(&pid) = runner.live_workers().first() {
                break pid;
            }
            assert!(Instant::now() < deadline, "worker never started");
            std::thread::sleep(Duration::from_millis(10));
        };

        runner.cancel_pending();
        let record = worker.join().unwrap();
        assert!(matches!(record.error(), Some(FibError::Worker(msg)) if msg.contains("deadline")));
        assert!(runner.live_workers().is_empty());
        #[cfg(target_os = "linux")]
        assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
        let _ = pid;
    }

    #[test]
    fn child_command_line() {
        let runner = ProcessRunner::new(PathBuf::from("fibbench"), 25, false, true);
        let cmd = runner.command(&request());
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "--worker",
                "iterative",
                "--n=20",
                "--recursive-limit=25",
                "--slot=4",
                "--label=iterative-worker",
                "--no-memory",
                "--pin",
            ]
        );
    }
}
