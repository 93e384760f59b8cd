//! # fibbench-core
//!
//! Fibonacci strategies for the benchmark harness: naive recursion, memoized
//! recursion, iteration, a dynamic programming table, matrix exponentiation
//! and Binet's closed form.

pub mod calculator;
pub mod closed_form;
pub mod constants;
pub mod dynamic;
pub mod iterative;
pub mod matrix;
pub mod memoized;
pub mod recursive;
pub mod registry;

// Re-exports
pub use calculator::{Calculator, CoreCalculator, FibCalculator, FibError, StrategyKind};
pub use constants::{
    exit_codes, DEFAULT_BENCHMARK_ROUNDS, DEFAULT_N, DEFAULT_RECURSION_CAP, FIB_TABLE,
    MAX_FIB_U64,
};
pub use memoized::MemoCache;
pub use registry::{CalculatorFactory, DefaultFactory};

use num_bigint::BigUint;

/// Compute F(n) iteratively.
///
/// This is a convenience function for simple use cases. To pick a strategy,
/// go through `DefaultFactory`.
///
/// # Example
/// ```
/// assert_eq!(fibbench_core::fibonacci(10).to_string(), "55");
/// assert_eq!(fibbench_core::fibonacci(0).to_string(), "0");
/// ```
#[must_use]
pub fn fibonacci(n: u64) -> BigUint {
    iterative::fib_iterative(n)
}
