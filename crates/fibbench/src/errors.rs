//! Error handling and exit codes.

use fibbench_core::calculator::FibError;
use fibbench_core::constants::exit_codes;
use fibbench_orchestration::benchmark::BenchmarkReport;
use fibbench_orchestration::interfaces::ResultRecord;

/// Map a calculation error to its exit code.
pub fn handle_error(err: &FibError) -> i32 {
    match err {
        FibError::InvalidInput(_)
        | FibError::RecursionBudgetExceeded { .. }
        | FibError::Overflow(_)
        | FibError::Calculation(_)
        | FibError::Worker(_) => exit_codes::ERROR_GENERIC,
        FibError::Config(_) => exit_codes::ERROR_CONFIG,
        FibError::Timeout(_) => exit_codes::ERROR_TIMEOUT,
        FibError::Divergent { .. } | FibError::Mismatch => exit_codes::ERROR_MISMATCH,
    }
}

/// Exit code for an error that aborted the run.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FibError>()
        .map_or(exit_codes::ERROR_GENERIC, handle_error)
}

/// Exit code for a completed single round: the most severe task error,
/// or a mismatch between strategies.
pub fn round_exit_code(records: &[ResultRecord], mismatch: bool) -> i32 {
    if mismatch {
        return exit_codes::ERROR_MISMATCH;
    }
    records
        .iter()
        .filter_map(ResultRecord::error)
        .map(handle_error)
        .max_by_key(|&code| severity(code))
        .unwrap_or(exit_codes::SUCCESS)
}

/// Exit code for a completed benchmark.
pub fn benchmark_exit_code(report: &BenchmarkReport) -> i32 {
    if !report.divergences.is_empty() {
        exit_codes::ERROR_MISMATCH
    } else if report.summaries.iter().any(|s| !s.failures.is_empty()) {
        exit_codes::ERROR_GENERIC
    } else {
        exit_codes::SUCCESS
    }
}

fn severity(code: i32) -> u8 {
    match code {
        exit_codes::ERROR_MISMATCH => 3,
        exit_codes::ERROR_TIMEOUT => 2,
        exit_codes::SUCCESS => 0,
        _ => 1,
    }
}
