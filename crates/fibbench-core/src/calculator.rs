//! Calculator traits and the `FibCalculator` decorator.
//!
//! `Calculator` is the public trait consumed by orchestration.
//! `CoreCalculator` is the internal trait implemented by strategies.
//! `FibCalculator` is a decorator that validates the index and answers the
//! base cases before delegating to the strategy.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Error type for Fibonacci calculations.
///
/// Serializable so a child worker process can hand it back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum FibError {
    /// Negative Fibonacci index.
    #[error("invalid input: index {0} is negative")]
    InvalidInput(i64),

    /// Index above the naive recursion cap.
    #[error("recursion budget exceeded: index {n} is above the cap of {cap}")]
    RecursionBudgetExceeded { n: u64, cap: u64 },

    /// Result does not fit the strategy's machine integer.
    #[error("F({0}) overflows a 64-bit integer")]
    Overflow(u64),

    /// A calculation error occurred.
    #[error("calculation error: {0}")]
    Calculation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A worker failed outside the calculation itself.
    #[error("worker failure: {0}")]
    Worker(String),

    /// A task did not report before the round deadline.
    #[error("task timed out after {0}")]
    Timeout(String),

    /// The same strategy produced different values across rounds.
    #[error("divergent result for {algorithm}: {previous} then {current}")]
    Divergent {
        algorithm: String,
        previous: String,
        current: String,
    },

    /// Results from different strategies don't match.
    #[error("result mismatch between algorithms")]
    Mismatch,
}

/// The closed set of computation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    Recursive,
    Memoized,
    Iterative,
    DynamicProgramming,
    MatrixPower,
    ClosedForm,
}

impl StrategyKind {
    /// Every strategy, in canonical order.
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Recursive,
        StrategyKind::Memoized,
        StrategyKind::Iterative,
        StrategyKind::MatrixPower,
        StrategyKind::ClosedForm,
        StrategyKind::DynamicProgramming,
    ];

    /// Name used on the command line.
    #[must_use]
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Recursive => "recursive",
            Self::Memoized => "memoization",
            Self::Iterative => "iterative",
            Self::DynamicProgramming => "dp",
            Self::MatrixPower => "matrix",
            Self::ClosedForm => "formula",
        }
    }

    /// Whether results are exact integers (false for the floating-point formula).
    #[must_use]
    pub fn is_exact(self) -> bool {
        !matches!(self, Self::ClosedForm)
    }

    /// Human-readable algorithm name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Recursive => "Recursive",
            Self::Memoized => "Memoized",
            Self::Iterative => "Iterative",
            Self::DynamicProgramming => "DynamicProgramming",
            Self::MatrixPower => "MatrixPower",
            Self::ClosedForm => "ClosedForm",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for StrategyKind {
    type Err = FibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" => Ok(Self::Recursive),
            "memoization" | "memoized" | "memo" => Ok(Self::Memoized),
            "iterative" => Ok(Self::Iterative),
            "dp" | "dynamic" => Ok(Self::DynamicProgramming),
            "matrix" => Ok(Self::MatrixPower),
            "formula" | "binet" => Ok(Self::ClosedForm),
            other => Err(FibError::Config(format!("unknown method: {other}"))),
        }
    }
}

/// Public trait for Fibonacci calculators, consumed by orchestration.
pub trait Calculator: Send + Sync {
    /// Calculate F(n).
    fn calculate(&self, n: i64) -> Result<BigUint, FibError>;

    /// Get the name of this calculator.
    fn name(&self) -> &str;

    /// Which strategy this calculator implements.
    fn kind(&self) -> StrategyKind;

    /// Largest index this calculator accepts, if bounded.
    fn input_cap(&self) -> Option<u64> {
        None
    }

    /// Drop any state carried between calls.
    fn reset(&self) {}
}

/// Internal trait for strategy implementations.
/// Wrapped by `FibCalculator` which handles validation and base cases.
pub trait CoreCalculator: Send + Sync {
    /// Compute F(n) for n >= 2.
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError>;

    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    fn input_cap(&self) -> Option<u64> {
        None
    }

    fn reset(&self) {}
}

/// Decorator that wraps a `CoreCalculator` with input validation and base cases.
pub struct FibCalculator {
    inner: Arc<dyn CoreCalculator>,
}

impl FibCalculator {
    /// Create a new `FibCalculator` wrapping the given core calculator.
    #[must_use]
    pub fn new(inner: Arc<dyn CoreCalculator>) -> Self {
        Self { inner }
    }
}

impl Calculator for FibCalculator {
    fn calculate(&self, n: i64) -> Result<BigUint, FibError> {
        let n = u64::try_from(n).map_err(|_| FibError::InvalidInput(n))?;

        if n <= 1 {
            return Ok(BigUint::from(n));
        }

        self.inner.calculate_core(n)
    }

    fn name(&self) -> &str {
        self.inner.kind().display_name()
    }

    fn kind(&self) -> StrategyKind {
        self.inner.kind()
    }

    fn input_cap(&self) -> Option<u64> {
        self.inner.input_cap()
    }

    fn reset(&self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    impl CoreCalculator for Unreachable {
        fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
            panic!("core called for n={n}")
        }

        fn kind(&self) -> StrategyKind {
            StrategyKind::Iterative
        }
    }

    #[test]
    fn base_cases_skip_core() {
        let calc = FibCalculator::new(Arc::new(Unreachable));
        assert_eq!(calc.calculate(0).unwrap(), BigUint::from(0u32));
        assert_eq!(calc.calculate(1).unwrap(), BigUint::from(1u32));
    }

    #[test]
    fn negative_input_rejected() {
        let calc = FibCalculator::new(Arc::new(Unreachable));
        assert_eq!(calc.calculate(-1), Err(FibError::InvalidInput(-1)));
        assert_eq!(
            calc.calculate(i64::MIN),
            Err(FibError::InvalidInput(i64::MIN))
        );
    }

    #[test]
    fn strategy_names_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.cli_name().parse::<StrategyKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn fib_error_json_keeps_variant() {
        for err in [
            FibError::InvalidInput(-1),
            FibError::RecursionBudgetExceeded { n: 35, cap: 30 },
            FibError::Timeout("1s".into()),
            FibError::Mismatch,
        ] {
            let json = serde_json::to_string(&err).unwrap();
            assert_eq!(serde_json::from_str::<FibError>(&json).unwrap(), err);
        }
    }

    #[test]
    fn fib_error_display() {
        let err = FibError::InvalidInput(-3);
        assert_eq!(err.to_string(), "invalid input: index -3 is negative");

        let err = FibError::RecursionBudgetExceeded { n: 35, cap: 30 };
        assert_eq!(
            err.to_string(),
            "recursion budget exceeded: index 35 is above the cap of 30"
        );
    }
}
