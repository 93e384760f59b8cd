//! Two-variable running sum.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::calculator::{CoreCalculator, FibError, StrategyKind};

/// Iterative calculator: linear time, constant space.
pub struct Iterative;

impl Iterative {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Iterative {
    fn default() -> Self {
        Self::new()
    }
}

/// F(n) by walking the recurrence forward.
#[must_use]
pub fn fib_iterative(n: u64) -> BigUint {
    let mut a = BigUint::zero();
    let mut b = BigUint::one();
    for _ in 0..n {
        let next = &a + &b;
        a = std::mem::replace(&mut b, next);
    }
    a
}

impl CoreCalculator for Iterative {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        Ok(fib_iterative(n))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Iterative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_values() {
        let got: Vec<String> = (0..10).map(|n| fib_iterative(n).to_string()).collect();
        assert_eq!(got, ["0", "1", "1", "2", "3", "5", "8", "13", "21", "34"]);
    }

    #[test]
    fn large_value() {
        assert_eq!(
            Iterative::new().calculate_core(100).unwrap().to_string(),
            "354224848179261915075"
        );
    }
}
