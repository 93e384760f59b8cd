//! JSON export of a report.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use fibbench_orchestration::benchmark::{BenchmarkReport, BenchmarkSummary};
use fibbench_orchestration::interfaces::ResultRecord;

#[derive(Debug, Serialize)]
struct RecordJson<'a> {
    label: &'a str,
    algorithm: &'a str,
    method: &'static str,
    n: i64,
    value: Option<String>,
    error: Option<String>,
    elapsed_secs: f64,
    memory_mb: Option<f64>,
}

impl<'a> From<&'a ResultRecord> for RecordJson<'a> {
    fn from(r: &'a ResultRecord) -> Self {
        Self {
            label: &r.label,
            algorithm: &r.algorithm,
            method: r.kind.cli_name(),
            n: r.n,
            value: r.value().map(ToString::to_string),
            error: r.error().map(ToString::to_string),
            elapsed_secs: r.elapsed.as_secs_f64(),
            memory_mb: r.memory_mb,
        }
    }
}

#[derive(Debug, Serialize)]
struct SummaryJson<'a> {
    algorithm: &'a str,
    method: &'static str,
    n: i64,
    value: Option<String>,
    rounds: usize,
    mean_secs: Option<f64>,
    min_secs: Option<f64>,
    max_secs: Option<f64>,
    mean_memory_mb: Option<f64>,
    failures: &'a [String],
    divergent: bool,
}

impl<'a> From<&'a BenchmarkSummary> for SummaryJson<'a> {
    fn from(s: &'a BenchmarkSummary) -> Self {
        Self {
            algorithm: &s.algorithm,
            method: s.kind.cli_name(),
            n: s.n,
            value: s.value.as_ref().map(ToString::to_string),
            rounds: s.rounds,
            mean_secs: s.mean.map(|d| d.as_secs_f64()),
            min_secs: s.min.map(|d| d.as_secs_f64()),
            max_secs: s.max.map(|d| d.as_secs_f64()),
            mean_memory_mb: s.mean_memory_mb,
            failures: &s.failures,
            divergent: s.divergent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
enum ReportJson<'a> {
    Single {
        n: i64,
        records: Vec<RecordJson<'a>>,
    },
    Benchmark {
        n: i64,
        rounds: usize,
        summaries: Vec<SummaryJson<'a>>,
    },
}

fn write_json(path: &Path, report: &ReportJson<'_>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    debug!(path = %path.display(), "report written");
    Ok(())
}

/// Write one round's records to `path`.
pub fn write_round(path: &Path, n: i64, records: &[ResultRecord]) -> io::Result<()> {
    let report = ReportJson::Single {
        n,
        records: records.iter().map(RecordJson::from).collect(),
    };
    write_json(path, &report)
}

/// Write benchmark summaries to `path`.
pub fn write_benchmark(path: &Path, n: i64, report: &BenchmarkReport) -> io::Result<()> {
    let report = ReportJson::Benchmark {
        n,
        rounds: report.rounds,
        summaries: report.summaries.iter().map(SummaryJson::from).collect(),
    };
    write_json(path, &report)
}
