//! Naive double recursion.
//!
//! Exponential in `n`, so the calculator carries a hard input cap and refuses
//! anything above it instead of running unbounded.

use num_bigint::BigUint;

use crate::calculator::{CoreCalculator, FibError, StrategyKind};
use crate::constants::{DEFAULT_RECURSION_CAP, MAX_FIB_U64};

/// Naive recursive calculator with an input cap.
pub struct NaiveRecursion {
    cap: u64,
}

impl NaiveRecursion {
    #[must_use]
    pub fn new(cap: u64) -> Self {
        Self { cap }
    }

    /// The largest index this calculator accepts.
    #[must_use]
    pub fn cap(&self) -> u64 {
        self.cap
    }
}

impl Default for NaiveRecursion {
    fn default() -> Self {
        Self::new(DEFAULT_RECURSION_CAP)
    }
}

fn fib_recursive(n: u64) -> u64 {
    if n <= 1 {
        return n;
    }
    fib_recursive(n - 1) + fib_recursive(n - 2)
}

impl CoreCalculator for NaiveRecursion {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        if n > self.cap {
            return Err(FibError::RecursionBudgetExceeded { n, cap: self.cap });
        }
        // F(94) and up wrap a u64.
        if n > MAX_FIB_U64 {
            return Err(FibError::Overflow(n));
        }
        Ok(BigUint::from(fib_recursive(n)))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Recursive
    }

    fn input_cap(&self) -> Option<u64> {
        Some(self.cap)
    }
}
