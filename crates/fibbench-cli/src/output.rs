//! Fixed-width report formatting.

use std::fmt::Write as _;
use std::time::Duration;

use num_bigint::BigUint;

use fibbench_orchestration::benchmark::BenchmarkSummary;
use fibbench_orchestration::interfaces::ResultRecord;

/// Digits kept on each side when a value is truncated.
const TRUNCATE_KEEP: usize = 8;
/// Longest value printed in full without `verbose`.
const TRUNCATE_ABOVE: usize = 20;

/// Fits a truncated value such as `25974069...28746875 (20899 digits) (!)`.
const RESULT_WIDTH: usize = 40;

const ROUND_WIDTH: usize = 120;
const BENCH_WIDTH: usize = 136;

/// Format a `BigUint` for display, potentially truncating.
#[must_use]
pub fn format_result(value: &BigUint, verbose: bool) -> String {
    let s = value.to_string();
    if !verbose && s.len() > TRUNCATE_ABOVE {
        format!(
            "{}...{} ({} digits)",
            &s[..TRUNCATE_KEEP],
            &s[s.len() - TRUNCATE_KEEP..],
            s.len()
        )
    } else {
        s
    }
}

/// Seconds with six decimals.
#[must_use]
pub fn format_seconds(d: Duration) -> String {
    format!("{:.6}", d.as_secs_f64())
}

fn format_optional_seconds(d: Option<Duration>) -> String {
    d.map_or_else(|| "-".to_string(), format_seconds)
}

/// Megabytes with six decimals, or `-` when not sampled.
#[must_use]
pub fn format_memory(mb: Option<f64>) -> String {
    mb.map_or_else(|| "-".to_string(), |mb| format!("{mb:.6}"))
}

/// Render one round's records as a table, in the order given.
#[must_use]
pub fn render_round(records: &[ResultRecord], verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:-<ROUND_WIDTH$}", "");
    let _ = writeln!(
        out,
        "{:<20} {:<20} {:<6} {:<RESULT_WIDTH$} {:<14} {:<14}",
        "Worker", "Method", "n", "Result", "Time (s)", "Memory (MB)"
    );
    let _ = writeln!(out, "{:-<ROUND_WIDTH$}", "");

    for r in records {
        let result = r
            .value()
            .map_or_else(|| "ERROR".to_string(), |v| format_result(v, verbose));
        let _ = writeln!(
            out,
            "{:<20} {:<20} {:<6} {:<RESULT_WIDTH$} {:<14} {:<14}",
            r.label,
            r.algorithm,
            r.n,
            result,
            format_seconds(r.elapsed),
            format_memory(r.memory_mb),
        );
    }

    let failures: Vec<&ResultRecord> = records.iter().filter(|r| !r.is_ok()).collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for r in failures {
            if let Some(e) = r.error() {
                let _ = writeln!(out, "  {}: {e}", r.label);
            }
        }
    }

    out
}

/// Render benchmark summaries as a table, in the order given.
#[must_use]
pub fn render_benchmark(summaries: &[BenchmarkSummary], verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:-<BENCH_WIDTH$}", "");
    let _ = writeln!(
        out,
        "{:<20} {:<6} {:<RESULT_WIDTH$} {:<14} {:<14} {:<14} {:<14} {:<6}",
        "Method", "n", "Result", "Mean (s)", "Min (s)", "Max (s)", "Memory (MB)", "Runs"
    );
    let _ = writeln!(out, "{:-<BENCH_WIDTH$}", "");

    for s in summaries {
        let mut result = s
            .value
            .as_ref()
            .map_or_else(|| "ERROR".to_string(), |v| format_result(v, verbose));
        if s.divergent {
            result.push_str(" (!)");
        }
        let _ = writeln!(
            out,
            "{:<20} {:<6} {:<RESULT_WIDTH$} {:<14} {:<14} {:<14} {:<14} {:<6}",
            s.algorithm,
            s.n,
            result,
            format_optional_seconds(s.mean),
            format_optional_seconds(s.min),
            format_optional_seconds(s.max),
            format_memory(s.mean_memory_mb),
            s.rounds,
        );
    }

    let failed: Vec<&BenchmarkSummary> =
        summaries.iter().filter(|s| !s.failures.is_empty()).collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for s in failed {
            for f in &s.failures {
                let _ = writeln!(out, "  {}: {f}", s.label);
            }
        }
    }

    out
}
