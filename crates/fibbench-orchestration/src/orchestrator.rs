//! Core orchestration: concurrent round dispatch and result analysis.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use num_bigint::BigUint;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, warn};

use fibbench_core::calculator::FibError;
use fibbench_core::constants::WORKER_STACK_SIZE;

use crate::interfaces::{ResultRecord, TaskRequest, TaskRunner};

/// Settings for a `Dispatcher`.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Collect deadline for a round; `None` waits for every task.
    pub timeout: Option<Duration>,
    /// Pin worker `i` to core `i % cores`.
    pub pin_cpus: bool,
}

impl DispatcherConfig {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            timeout: None,
            pin_cpus: false,
        }
    }
}

/// Fans a round of requests out to a worker pool and collects the records.
pub struct Dispatcher {
    pool: ThreadPool,
    runner: Arc<dyn TaskRunner>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with its own thread pool.
    pub fn new(runner: Arc<dyn TaskRunner>, config: &DispatcherConfig) -> Result<Self, FibError> {
        if config.workers == 0 {
            return Err(FibError::Config("worker count must be at least 1".into()));
        }

        let mut builder = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("fibbench-worker-{i}"));

        if config.pin_cpus {
            match core_affinity::get_core_ids() {
                Some(cores) if !cores.is_empty() => {
                    builder = builder.start_handler(move |i| {
                        let core = cores[i % cores.len()];
                        if !core_affinity::set_for_current(core) {
                            debug!(worker = i, core = core.id, "cpu pinning not supported");
                        }
                    });
                }
                _ => warn!("cpu pinning requested but core ids are unavailable"),
            }
        }

        let pool = builder
            .build()
            .map_err(|e| FibError::Config(format!("failed to create thread pool: {e}")))?;

        Ok(Self {
            pool,
            runner,
            timeout: config.timeout,
        })
    }

    /// Run every request concurrently and return one record per request,
    /// sorted ascending by elapsed time.
    ///
    /// Calculators are reset first, so a memo cache starts cold each round.
    pub fn run_round(&self, requests: &[TaskRequest]) -> Vec<ResultRecord> {
        for request in requests {
            request.calculator.reset();
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        let expired = Arc::new(AtomicBool::new(false));
        for request in requests.iter().cloned() {
            let tx = tx.clone();
            let runner = Arc::clone(&self.runner);
            let expired = Arc::clone(&expired);
            self.pool.spawn(move || {
                // Still queued when the deadline passed: already reported.
                if expired.load(Ordering::Acquire) {
                    return;
                }
                let record = runner.run(&request);
                // The collector may have given up on this round already.
                let _ = tx.send(record);
            });
        }
        drop(tx);

        let (mut records, timed_out) = collect_round(&rx, requests, self.timeout);
        if timed_out {
            expired.store(true, Ordering::Release);
            self.runner.cancel_pending();
        }
        records.sort_by_key(|r| r.elapsed);
        records
    }
}

/// Drain records until every slot has reported, the deadline passes, or all
/// senders are gone. Missing slots get a synthesized failure.
///
/// The flag is set when the deadline cut the round short.
fn collect_round(
    rx: &Receiver<ResultRecord>,
    requests: &[TaskRequest],
    timeout: Option<Duration>,
) -> (Vec<ResultRecord>, bool) {
    let started = Instant::now();
    let deadline = timeout.map(|t| started + t);
    let mut pending: BTreeMap<usize, &TaskRequest> =
        requests.iter().map(|r| (r.slot, r)).collect();
    let mut records = Vec::with_capacity(requests.len());
    let mut timed_out = false;

    while !pending.is_empty() {
        let received = match deadline {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(record) => {
                if pending.remove(&record.slot).is_some() {
                    records.push(record);
                } else {
                    warn!(slot = record.slot, "dropping record for unknown slot");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                let limit = timeout.unwrap_or_default();
                for request in pending.values() {
                    error!(label = %request.label, "task missed the round deadline");
                    records.push(ResultRecord::failed(
                        request,
                        FibError::Timeout(format!("{limit:?}")),
                        started.elapsed(),
                    ));
                }
                timed_out = true;
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                for request in pending.values() {
                    error!(label = %request.label, "worker exited without reporting");
                    records.push(ResultRecord::failed(
                        request,
                        FibError::Worker("worker exited without reporting".into()),
                        started.elapsed(),
                    ));
                }
                break;
            }
        }
    }

    (records, timed_out)
}

/// Check that exact strategies computing the same index agree.
///
/// The closed-form strategy is approximate and left out.
pub fn analyze_comparison_results(results: &[ResultRecord]) -> Result<(), FibError> {
    let valid_results: Vec<&ResultRecord> = results
        .iter()
        .filter(|r| r.is_ok() && r.kind.is_exact())
        .collect();

    if valid_results.is_empty() {
        return Err(FibError::Calculation("no valid results".into()));
    }

    let mut by_input: HashMap<i64, &BigUint> = HashMap::new();
    for result in valid_results {
        let Some(value) = result.value() else {
            continue;
        };
        match by_input.get(&result.n) {
            Some(first) if *first != value => return Err(FibError::Mismatch),
            Some(_) => {}
            None => {
                by_input.insert(result.n, value);
            }
        }
    }

    Ok(())
}
