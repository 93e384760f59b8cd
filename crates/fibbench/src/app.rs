//! Application entry point and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use fibbench_cli::export::{write_benchmark, write_round};
use fibbench_cli::presenter::CLIResultPresenter;
use fibbench_core::calculator::FibError;
use fibbench_core::registry::DefaultFactory;
use fibbench_orchestration::benchmark::run_benchmark;
use fibbench_orchestration::calculator_selection::{build_requests, get_calculators_to_run, RoundPlan};
use fibbench_orchestration::interfaces::{ResultPresenter, TaskRunner};
use fibbench_orchestration::memory::{MemoryProbe, NoMemoryProbe, ProcessMemoryProbe};
use fibbench_orchestration::orchestrator::{analyze_comparison_results, Dispatcher, DispatcherConfig};
use fibbench_orchestration::worker::InProcessRunner;

use crate::config::{AppConfig, Isolation};
use crate::errors::{benchmark_exit_code, round_exit_code};
use crate::version::full_version;
use crate::worker::{run_child, ProcessRunner};

/// Run the application and return the process exit code.
pub fn run(config: &AppConfig) -> Result<i32> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        fibbench_cli::completion::generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(0);
    }

    config.validate()?;

    // Child side of process isolation
    if let Some(method) = &config.worker {
        return run_child(config, method);
    }

    debug!(version = %full_version(), "starting");
    run_cli(config)
}

fn run_cli(config: &AppConfig) -> Result<i32> {
    let factory = DefaultFactory::new(config.recursive_limit);
    let calculators = get_calculators_to_run(&config.methods, &factory)?;
    let plan = build_requests(&calculators, config.n);

    let dispatcher = build_dispatcher(config, &plan)?;
    let presenter = CLIResultPresenter::new(config.verbose);

    let rounds = config.benchmark.then_some(config.benchmark_count);
    presenter.present_start(config.n, rounds);
    for clamp in &plan.clamps {
        presenter.present_clamp(clamp);
    }

    if config.benchmark {
        run_benchmark_mode(config, &dispatcher, &plan, &presenter)
    } else {
        run_single(config, &dispatcher, &plan, &presenter)
    }
}

fn build_dispatcher(config: &AppConfig, plan: &RoundPlan) -> Result<Dispatcher> {
    let sample_memory = !config.no_memory;
    let runner: Arc<dyn TaskRunner> = match config.isolation {
        Isolation::Thread => {
            let probe: Arc<dyn MemoryProbe> = if sample_memory {
                Arc::new(ProcessMemoryProbe::new())
            } else {
                Arc::new(NoMemoryProbe)
            };
            Arc::new(InProcessRunner::new(probe))
        }
        Isolation::Process => Arc::new(ProcessRunner::current_exe(
            config.recursive_limit,
            sample_memory,
            config.pin,
        )?),
    };

    let mut dispatcher_config =
        DispatcherConfig::new(config.processes.unwrap_or(plan.requests.len()).max(1));
    dispatcher_config.timeout = config.timeout_duration()?;
    // Children pin themselves in process isolation.
    dispatcher_config.pin_cpus = config.pin && config.isolation == Isolation::Thread;

    debug!(
        workers = dispatcher_config.workers,
        isolation = ?config.isolation,
        tasks = plan.requests.len(),
        "dispatcher ready"
    );
    Ok(Dispatcher::new(runner, &dispatcher_config)?)
}

fn run_single(
    config: &AppConfig,
    dispatcher: &Dispatcher,
    plan: &RoundPlan,
    presenter: &dyn ResultPresenter,
) -> Result<i32> {
    let records = dispatcher.run_round(&plan.requests);
    presenter.present_round(&records);

    let mut mismatch = false;
    if records.len() > 1 {
        if let Err(e) = analyze_comparison_results(&records) {
            warn!("comparison failed: {e}");
            mismatch = matches!(e, FibError::Mismatch);
            presenter.present_warning(&e.to_string());
        }
    }

    if let Some(path) = &config.output {
        write_round(path, config.n, &records)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(round_exit_code(&records, mismatch))
}

fn run_benchmark_mode(
    config: &AppConfig,
    dispatcher: &Dispatcher,
    plan: &RoundPlan,
    presenter: &dyn ResultPresenter,
) -> Result<i32> {
    let rounds = config.benchmark_count;
    let report = run_benchmark(dispatcher, &plan.requests, rounds, |round| {
        info!(round, rounds, "starting benchmark round");
        println!("Round {round}/{rounds}...");
    });

    presenter.present_benchmark(&report.summaries);
    for divergence in &report.divergences {
        presenter.present_error(&divergence.to_string());
    }

    if let Some(path) = &config.output {
        write_benchmark(path, config.n, &report)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(benchmark_exit_code(&report))
}
