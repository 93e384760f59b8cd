//! Defaults and shared constants for the benchmark harness.

/// Default Fibonacci index to compute.
pub const DEFAULT_N: i64 = 35;

/// Default cap for the naive recursive strategy.
pub const DEFAULT_RECURSION_CAP: u64 = 30;

/// Default number of rounds in benchmark mode.
pub const DEFAULT_BENCHMARK_ROUNDS: usize = 3;

/// Stack size for worker threads. The memoized strategy recurses once per index.
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Largest index for which the closed-form strategy is exact in `f64`.
pub const CLOSED_FORM_EXACT_LIMIT: u64 = 70;

/// Maximum Fibonacci index that fits in a u64.
/// F(93) = 12200160415121876738
pub const MAX_FIB_U64: u64 = 93;

/// Precomputed Fibonacci values for n = 0..=93.
///
/// F(93) = 12,200,160,415,121,876,738 is the largest Fibonacci number
/// that fits in `u64`. F(94) = 19,740,274,219,868,223,167 overflows
/// `u64::MAX` (18,446,744,073,709,551,615).
pub const FIB_TABLE: [u64; 94] = {
    let mut table = [0u64; 94];
    table[0] = 0;
    table[1] = 1;
    let mut i = 2;
    while i < 94 {
        table[i] = table[i - 1] + table[i - 2];
        i += 1;
    }
    table
};

/// Process exit codes.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// At least one task failed.
    pub const ERROR_GENERIC: i32 = 1;
    /// At least one task missed the round deadline.
    pub const ERROR_TIMEOUT: i32 = 2;
    /// Strategies or rounds disagreed on a value.
    pub const ERROR_MISMATCH: i32 = 3;
    /// Invalid configuration.
    pub const ERROR_CONFIG: i32 = 4;
}
