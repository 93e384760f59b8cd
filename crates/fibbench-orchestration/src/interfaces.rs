//! Orchestration interfaces and the records that flow between them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use num_bigint::BigUint;

use fibbench_core::calculator::{Calculator, FibError, StrategyKind};

use crate::benchmark::BenchmarkSummary;
use crate::calculator_selection::RecursionClamp;

/// One unit of work: run `calculator` on `n`.
#[derive(Clone)]
pub struct TaskRequest {
    /// The strategy to invoke.
    pub calculator: Arc<dyn Calculator>,
    /// Input index, already clamped to the calculator's cap.
    pub n: i64,
    /// Worker label shown in reports.
    pub label: String,
    /// Slot id, unique within a round.
    pub slot: usize,
}

impl TaskRequest {
    #[must_use]
    pub fn new(calculator: Arc<dyn Calculator>, n: i64, label: impl Into<String>, slot: usize) -> Self {
        Self {
            calculator,
            n,
            label: label.into(),
            slot,
        }
    }

    /// Strategy kind of the wrapped calculator.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        self.calculator.kind()
    }
}

impl fmt::Debug for TaskRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRequest")
            .field("algorithm", &self.calculator.name())
            .field("n", &self.n)
            .field("label", &self.label)
            .field("slot", &self.slot)
            .finish()
    }
}

/// Result of a single task.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    /// Slot id of the request this answers.
    pub slot: usize,
    /// Worker label.
    pub label: String,
    /// Algorithm name.
    pub algorithm: String,
    /// Strategy kind.
    pub kind: StrategyKind,
    /// Input index actually computed.
    pub n: i64,
    /// The computed value or a structured error.
    pub outcome: Result<BigUint, FibError>,
    /// Wall-clock time around the calculation.
    pub elapsed: Duration,
    /// Resident memory delta in MB, when it could be sampled.
    pub memory_mb: Option<f64>,
}

impl ResultRecord {
    /// A record for `request` that carries `error` instead of a value.
    #[must_use]
    pub fn failed(request: &TaskRequest, error: FibError, elapsed: Duration) -> Self {
        Self {
            slot: request.slot,
            label: request.label.clone(),
            algorithm: request.calculator.name().to_string(),
            kind: request.kind(),
            n: request.n,
            outcome: Err(error),
            elapsed,
            memory_mb: None,
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&BigUint> {
        self.outcome.as_ref().ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&FibError> {
        self.outcome.as_ref().err()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs one task and reports exactly one record for it.
pub trait TaskRunner: Send + Sync {
    fn run(&self, request: &TaskRequest) -> ResultRecord;

    /// Stop whatever is still running after a round missed its deadline.
    fn cancel_pending(&self) {}
}

/// Trait for presenting results to the user.
pub trait ResultPresenter {
    /// Announce a round or benchmark before it starts.
    fn present_start(&self, n: i64, rounds: Option<usize>);

    /// Report that the recursion cap replaced the requested input.
    fn present_clamp(&self, clamp: &RecursionClamp);

    /// Present the records of one round, already sorted.
    fn present_round(&self, records: &[ResultRecord]);

    /// Present benchmark summaries, already sorted.
    fn present_benchmark(&self, summaries: &[BenchmarkSummary]);

    /// Present a non-fatal warning.
    fn present_warning(&self, message: &str);

    /// Present an error.
    fn present_error(&self, error: &str);
}
