//! CLI result presenter.

use fibbench_orchestration::benchmark::BenchmarkSummary;
use fibbench_orchestration::calculator_selection::RecursionClamp;
use fibbench_orchestration::interfaces::{ResultPresenter, ResultRecord};

use crate::output::{render_benchmark, render_round};
use crate::ui::{print_error, print_header, print_warning};

/// CLI result presenter.
pub struct CLIResultPresenter {
    verbose: bool,
}

impl CLIResultPresenter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// Warning text for a clamped recursive input.
#[must_use]
pub fn clamp_message(clamp: &RecursionClamp) -> String {
    format!(
        "{} is limited to n <= {}; computing F({}) instead of F({})",
        clamp.algorithm, clamp.cap, clamp.cap, clamp.requested
    )
}

impl ResultPresenter for CLIResultPresenter {
    fn present_start(&self, n: i64, rounds: Option<usize>) {
        match rounds {
            Some(rounds) => print_header(&format!("Benchmark F({n}), {rounds} rounds")),
            None => print_header(&format!("Computing F({n})")),
        }
    }

    fn present_clamp(&self, clamp: &RecursionClamp) {
        print_warning(&clamp_message(clamp));
    }

    fn present_round(&self, records: &[ResultRecord]) {
        print!("{}", render_round(records, self.verbose));
    }

    fn present_benchmark(&self, summaries: &[BenchmarkSummary]) {
        print!("{}", render_benchmark(summaries, self.verbose));
    }

    fn present_warning(&self, message: &str) {
        print_warning(message);
    }

    fn present_error(&self, error: &str) {
        print_error(error);
    }
}
