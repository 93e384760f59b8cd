//! Worker task: one measured invocation per request.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error};

use fibbench_core::calculator::FibError;

use crate::interfaces::{ResultRecord, TaskRequest, TaskRunner};
use crate::memory::{memory_delta, MemoryProbe, NoMemoryProbe};

/// Run `request` once, timing only the calculation itself.
///
/// A panic inside the calculator becomes a `FibError::Worker` record rather
/// than taking down the round.
pub fn execute_task(request: &TaskRequest, probe: &dyn MemoryProbe) -> ResultRecord {
    let before = probe.resident_mb();

    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        request.calculator.calculate(request.n)
    }));
    let elapsed = start.elapsed();

    let after = probe.resident_mb();

    let outcome = outcome.unwrap_or_else(|payload| {
        Err(FibError::Worker(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    });

    match &outcome {
        Ok(_) => debug!(
            label = %request.label,
            n = request.n,
            elapsed_us = elapsed.as_micros(),
            "task finished"
        ),
        Err(e) => error!(label = %request.label, n = request.n, "task failed: {e}"),
    }

    ResultRecord {
        slot: request.slot,
        label: request.label.clone(),
        algorithm: request.calculator.name().to_string(),
        kind: request.kind(),
        n: request.n,
        outcome,
        elapsed,
        memory_mb: memory_delta(before, after),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs tasks on the calling thread.
pub struct InProcessRunner {
    probe: Arc<dyn MemoryProbe>,
}

impl InProcessRunner {
    #[must_use]
    pub fn new(probe: Arc<dyn MemoryProbe>) -> Self {
        Self { probe }
    }

    /// Runner that never samples memory.
    #[must_use]
    pub fn without_memory() -> Self {
        Self::new(Arc::new(NoMemoryProbe))
    }
}

impl TaskRunner for InProcessRunner {
    fn run(&self, request: &TaskRequest) -> ResultRecord {
        execute_task(request, self.probe.as_ref())
    }
}
