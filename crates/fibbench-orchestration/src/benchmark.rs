//! Benchmark mode: repeat rounds and aggregate per algorithm.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

use num_bigint::BigUint;
use tracing::error;

use fibbench_core::calculator::{FibError, StrategyKind};

use crate::interfaces::{ResultRecord, TaskRequest};
use crate::orchestrator::Dispatcher;

/// Samples for one algorithm, folded round by round.
#[derive(Debug, Clone)]
pub struct BenchmarkAggregate {
    pub algorithm: String,
    pub label: String,
    pub kind: StrategyKind,
    pub n: i64,
    /// Value from the latest successful round.
    pub value: Option<BigUint>,
    /// Elapsed time of every successful round, in round order.
    pub times: Vec<Duration>,
    /// Memory delta of every successful round that sampled one, in round order.
    pub memories: Vec<f64>,
    pub failures: Vec<FibError>,
    pub divergences: Vec<FibError>,
}

impl BenchmarkAggregate {
    fn new(record: &ResultRecord) -> Self {
        Self {
            algorithm: record.algorithm.clone(),
            label: record.label.clone(),
            kind: record.kind,
            n: record.n,
            value: None,
            times: Vec::new(),
            memories: Vec::new(),
            failures: Vec::new(),
            divergences: Vec::new(),
        }
    }

    /// Fold one record in. Returns the divergence if its value differs from
    /// the previous round's.
    fn fold(&mut self, record: ResultRecord) -> Option<FibError> {
        let value = match record.outcome {
            Ok(value) => value,
            Err(e) => {
                self.failures.push(e);
                return None;
            }
        };

        self.times.push(record.elapsed);
        if let Some(memory) = record.memory_mb {
            self.memories.push(memory);
        }

        let divergence = match &self.value {
            Some(previous) if *previous != value => Some(FibError::Divergent {
                algorithm: self.algorithm.clone(),
                previous: previous.to_string(),
                current: value.to_string(),
            }),
            _ => None,
        };
        self.value = Some(value);

        if let Some(d) = &divergence {
            error!("{d}");
            self.divergences.push(d.clone());
        }
        divergence
    }

    /// Arithmetic mean of the successful round times.
    #[must_use]
    pub fn mean_time(&self) -> Option<Duration> {
        let count = u32::try_from(self.times.len()).ok().filter(|&c| c > 0)?;
        Some(self.times.iter().sum::<Duration>() / count)
    }

    #[must_use]
    pub fn min_time(&self) -> Option<Duration> {
        self.times.iter().min().copied()
    }

    #[must_use]
    pub fn max_time(&self) -> Option<Duration> {
        self.times.iter().max().copied()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_memory(&self) -> Option<f64> {
        if self.memories.is_empty() {
            return None;
        }
        Some(self.memories.iter().sum::<f64>() / self.memories.len() as f64)
    }
}

/// Rendered statistics for one algorithm.
#[derive(Debug, Clone)]
pub struct BenchmarkSummary {
    pub algorithm: String,
    pub label: String,
    pub kind: StrategyKind,
    pub n: i64,
    pub value: Option<BigUint>,
    /// Successful rounds.
    pub rounds: usize,
    pub mean: Option<Duration>,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
    pub mean_memory_mb: Option<f64>,
    pub failures: Vec<String>,
    pub divergent: bool,
}

impl From<&BenchmarkAggregate> for BenchmarkSummary {
    fn from(agg: &BenchmarkAggregate) -> Self {
        Self {
            algorithm: agg.algorithm.clone(),
            label: agg.label.clone(),
            kind: agg.kind,
            n: agg.n,
            value: agg.value.clone(),
            rounds: agg.times.len(),
            mean: agg.mean_time(),
            min: agg.min_time(),
            max: agg.max_time(),
            mean_memory_mb: agg.mean_memory(),
            failures: agg.failures.iter().map(ToString::to_string).collect(),
            divergent: !agg.divergences.is_empty(),
        }
    }
}

/// Aggregates keyed by algorithm name.
#[derive(Debug, Default)]
pub struct BenchmarkCollector {
    aggregates: BTreeMap<String, BenchmarkAggregate>,
}

impl BenchmarkCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a record into its algorithm's aggregate.
    ///
    /// The record is always kept; a value that differs from the previous
    /// round is returned as `FibError::Divergent`.
    pub fn fold(&mut self, record: ResultRecord) -> Result<(), FibError> {
        let aggregate = self
            .aggregates
            .entry(record.algorithm.clone())
            .or_insert_with(|| BenchmarkAggregate::new(&record));
        match aggregate.fold(record) {
            Some(divergence) => Err(divergence),
            None => Ok(()),
        }
    }

    #[must_use]
    pub fn aggregate(&self, algorithm: &str) -> Option<&BenchmarkAggregate> {
        self.aggregates.get(algorithm)
    }

    /// Every divergence seen so far.
    #[must_use]
    pub fn divergences(&self) -> Vec<FibError> {
        self.aggregates
            .values()
            .flat_map(|a| a.divergences.iter().cloned())
            .collect()
    }

    /// Summaries sorted ascending by mean time; algorithms that never
    /// succeeded go last.
    #[must_use]
    pub fn summarize(&self) -> Vec<BenchmarkSummary> {
        let mut summaries: Vec<BenchmarkSummary> =
            self.aggregates.values().map(BenchmarkSummary::from).collect();
        summaries.sort_by(|a, b| match (a.mean, b.mean) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        summaries
    }
}

/// Outcome of a whole benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub rounds: usize,
    pub summaries: Vec<BenchmarkSummary>,
    pub divergences: Vec<FibError>,
}

/// Run `rounds` rounds of `requests` and aggregate them.
///
/// `on_round` is called before each round with its 1-based number.
pub fn run_benchmark<F>(
    dispatcher: &Dispatcher,
    requests: &[TaskRequest],
    rounds: usize,
    mut on_round: F,
) -> BenchmarkReport
where
    F: FnMut(usize),
{
    let mut collector = BenchmarkCollector::new();

    for round in 1..=rounds {
        on_round(round);
        for record in dispatcher.run_round(requests) {
            // Divergences are kept on the aggregate and reported below.
            let _ = collector.fold(record);
        }
    }

    BenchmarkReport {
        rounds,
        summaries: collector.summarize(),
        divergences: collector.divergences(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use fibbench_core::registry::DefaultFactory;

    use crate::calculator_selection::{build_requests, get_calculators_to_run};
    use crate::orchestrator::DispatcherConfig;
    use crate::worker::InProcessRunner;

    fn record(algorithm: &str, value: Result<u32, FibError>, millis: u64) -> ResultRecord {
        ResultRecord {
            slot: 0,
            label: format!("{algorithm}-worker"),
            algorithm: algorithm.into(),
            kind: StrategyKind::Iterative,
            n: 10,
            outcome: value.map(BigUint::from),
            elapsed: Duration::from_millis(millis),
            memory_mb: Some(millis as f64),
        }
    }

    #[test]
    fn three_rounds_statistics() {
        let mut collector = BenchmarkCollector::new();
        for ms in [1, 2, 6] {
            collector.fold(record("Iterative", Ok(55), ms)).unwrap();
        }

        let agg = collector.aggregate("Iterative").unwrap();
        assert_eq!(agg.times.len(), 3);
        assert_eq!(agg.mean_time(), Some(Duration::from_millis(3)));
        assert_eq!(agg.min_time(), Some(Duration::from_millis(1)));
        assert_eq!(agg.max_time(), Some(Duration::from_millis(6)));
        assert_eq!(agg.mean_memory(), Some(3.0));
        assert_eq!(agg.value, Some(BigUint::from(55u32)));
    }

    #[test]
    fn divergence_is_reported_and_value_overwritten() {
        let mut collector = BenchmarkCollector::new();
        collector.fold(record("Iterative", Ok(55), 1)).unwrap();
        let err = collector.fold(record("Iterative", Ok(56), 1)).unwrap_err();
        assert!(matches!(err, FibError::Divergent { .. }));

        let agg = collector.aggregate("Iterative").unwrap();
        assert_eq!(agg.value, Some(BigUint::from(56u32)));
        assert_eq!(agg.times.len(), 2);
        assert_eq!(collector.divergences().len(), 1);
        assert!(collector.summarize()[0].divergent);
    }

    #[test]
    fn failures_do_not_count_as_samples() {
        let mut collector = BenchmarkCollector::new();
        collector.fold(record("Iterative", Ok(55), 4)).unwrap();
        collector
            .fold(record("Iterative", Err(FibError::Worker("x".into())), 100))
            .unwrap();

        let summary = &collector.summarize()[0];
        assert_eq!(summary.rounds, 1);
        assert_eq!(summary.mean, Some(Duration::from_millis(4)));
        assert_eq!(summary.mean_memory_mb, Some(4.0));
        assert_eq!(summary.failures.len(), 1);
    }

    #[test]
    fn summaries_sorted_by_mean() {
        let mut collector = BenchmarkCollector::new();
        collector.fold(record("Slow", Ok(55), 9)).unwrap();
        collector.fold(record("Fast", Ok(55), 1)).unwrap();
        collector
            .fold(record("Broken", Err(FibError::Worker("x".into())), 0))
            .unwrap();
        collector.fold(record("Middle", Ok(55), 5)).unwrap();

        let names: Vec<String> = collector
            .summarize()
            .into_iter()
            .map(|s| s.algorithm)
            .collect();
        assert_eq!(names, ["Fast", "Middle", "Slow", "Broken"]);
    }

    #[test]
    fn mean_memory_absent_without_samples() {
        let mut collector = BenchmarkCollector::new();
        let mut r = record("Iterative", Ok(55), 1);
        r.memory_mb = None;
        collector.fold(r).unwrap();
        assert!(collector.aggregate("Iterative").unwrap().mean_memory().is_none());
    }

    #[test]
    fn run_benchmark_single_strategy() {
        let factory = DefaultFactory::default();
        let calcs = get_calculators_to_run(&["memoization".to_string()], &factory).unwrap();
        let plan = build_requests(&calcs, 30);
        let dispatcher = Dispatcher::new(
            Arc::new(InProcessRunner::without_memory()),
            &DispatcherConfig::new(1),
        )
        .unwrap();

        let mut announced = Vec::new();
        let report = run_benchmark(&dispatcher, &plan.requests, 3, |r| announced.push(r));

        assert_eq!(announced, [1, 2, 3]);
        assert_eq!(report.rounds, 3);
        assert!(report.divergences.is_empty());
        assert_eq!(report.summaries.len(), 1);
        let summary = &report.summaries[0];
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.value, Some(BigUint::from(832_040u32)));
        assert!(summary.min <= summary.mean && summary.mean <= summary.max);
    }
}
