//! # fibbench-orchestration
//!
//! Worker tasks, concurrent round dispatch, result collection and benchmark
//! aggregation.

pub mod benchmark;
pub mod calculator_selection;
pub mod interfaces;
pub mod memory;
pub mod orchestrator;
pub mod worker;

pub use benchmark::{run_benchmark, BenchmarkCollector, BenchmarkReport, BenchmarkSummary};
pub use calculator_selection::{build_requests, get_calculators_to_run, RoundPlan};
pub use interfaces::{ResultPresenter, ResultRecord, TaskRequest, TaskRunner};
pub use orchestrator::{analyze_comparison_results, Dispatcher, DispatcherConfig};
