//! Application configuration from CLI flags and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use fibbench_core::calculator::FibError;
use fibbench_core::constants::{DEFAULT_BENCHMARK_ROUNDS, DEFAULT_N, DEFAULT_RECURSION_CAP};

/// How tasks are isolated from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Isolation {
    /// One worker thread per task, sharing this process.
    Thread,
    /// One child process per task; memory deltas are per task.
    Process,
}

/// Benchmark classical Fibonacci algorithms side by side.
#[derive(Parser, Debug)]
#[command(name = "fibbench", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Fibonacci index to compute.
    #[arg(short, long, default_value_t = DEFAULT_N, env = "FIBBENCH_N", allow_negative_numbers = true)]
    pub n: i64,

    /// Methods to run: recursive, memoization, iterative, matrix, formula, dp, or all.
    #[arg(short, long, num_args = 1.., value_delimiter = ',', default_value = "all")]
    pub methods: Vec<String>,

    /// Largest index the recursive method computes; larger inputs are capped.
    #[arg(short, long, default_value_t = DEFAULT_RECURSION_CAP)]
    pub recursive_limit: u64,

    /// Number of concurrent workers (default: one per method).
    #[arg(short, long)]
    pub processes: Option<usize>,

    /// Repeat the run and report mean/min/max per method.
    #[arg(short, long)]
    pub benchmark: bool,

    /// Rounds in benchmark mode.
    #[arg(short = 'c', long, default_value_t = DEFAULT_BENCHMARK_ROUNDS)]
    pub benchmark_count: usize,

    /// Run each task in a worker thread or in its own process.
    #[arg(long, value_enum, default_value_t = Isolation::Thread)]
    pub isolation: Isolation,

    /// Give up on a round after this long (e.g. "500ms", "30s", "5m").
    #[arg(long)]
    pub timeout: Option<String>,

    /// Skip resident memory sampling.
    #[arg(long)]
    pub no_memory: bool,

    /// Pin each worker to a CPU core.
    #[arg(long)]
    pub pin: bool,

    /// Print full values instead of truncating long ones.
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write the report as JSON to this path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,

    /// Run a single task and print its report as JSON (used by process isolation).
    #[arg(long, hide = true)]
    pub worker: Option<String>,

    /// Slot id of the worker task.
    #[arg(long, hide = true, default_value_t = 0)]
    pub slot: usize,

    /// Label of the worker task.
    #[arg(long, hide = true)]
    pub label: Option<String>,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Reject values that parse but make no sense.
    pub fn validate(&self) -> Result<(), FibError> {
        if self.processes == Some(0) {
            return Err(FibError::Config("--processes must be at least 1".into()));
        }
        if self.benchmark_count == 0 {
            return Err(FibError::Config("--benchmark-count must be at least 1".into()));
        }
        self.timeout_duration()?;
        Ok(())
    }

    /// Parse the timeout string, if any.
    pub fn timeout_duration(&self) -> Result<Option<Duration>, FibError> {
        self.timeout
            .as_deref()
            .map(|s| {
                parse_duration(s)
                    .ok_or_else(|| FibError::Config(format!("invalid timeout: {s:?}")))
            })
            .transpose()
    }
}

/// Parse a duration string like "5m", "1h", "30s", "250ms".
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let n: u64 = ms.parse().ok()?;
        Some(Duration::from_millis(n))
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(60)?))
    } else if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().ok()?;
        Some(Duration::from_secs(n.checked_mul(3600)?))
    } else if let Some(secs) = s.strip_suffix('s') {
        let n: u64 = secs.parse().ok()?;
        Some(Duration::from_secs(n))
    } else {
        let n: u64 = s.parse().ok()?;
        Some(Duration::from_secs(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        AppConfig::try_parse_from(std::iter::once("fibbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_duration_formats() {
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("12"), Some(Duration::from_secs(12)));
    }

    #[test]
    fn parse_duration_ms() {
        assert_eq!(parse_duration("1ms"), Some(Duration::from_millis(1)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("-1s"), None);
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.n, 35);
        assert_eq!(config.methods, ["all"]);
        assert_eq!(config.recursive_limit, 30);
        assert_eq!(config.processes, None);
        assert!(!config.benchmark);
        assert_eq!(config.benchmark_count, 3);
        assert_eq!(config.isolation, Isolation::Thread);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn methods_space_or_comma_separated() {
        assert_eq!(parse(&["-m", "iterative", "matrix"]).methods, ["iterative", "matrix"]);
        assert_eq!(parse(&["--methods", "dp,formula"]).methods, ["dp", "formula"]);
    }

    #[test]
    fn negative_index_parses() {
        assert_eq!(parse(&["-n", "-5"]).n, -5);
    }

    #[test]
    fn benchmark_flags() {
        let config = parse(&["-b", "-c", "5", "-p", "2"]);
        assert!(config.benchmark);
        assert_eq!(config.benchmark_count, 5);
        assert_eq!(config.processes, Some(2));
    }

    #[test]
    fn validate_rejects_zeroes() {
        assert!(matches!(
            parse(&["-p", "0"]).validate(),
            Err(FibError::Config(_))
        ));
        assert!(matches!(
            parse(&["-c", "0"]).validate(),
            Err(FibError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_timeout() {
        assert!(parse(&["--timeout", "later"]).validate().is_err());
        assert_eq!(
            parse(&["--timeout", "2s"]).timeout_duration().unwrap(),
            Some(Duration::from_secs(2))
        );
    }
}
