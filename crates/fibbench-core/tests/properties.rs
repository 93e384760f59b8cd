//! Property-based tests for the Fibonacci strategies.
//!
//! These go through the public `Calculator` trait, so validation and base
//! cases from the `FibCalculator` decorator are covered too.

use std::sync::Arc;

use num_bigint::BigUint;
use proptest::prelude::*;

use fibbench_core::calculator::{Calculator, FibError, StrategyKind};
use fibbench_core::constants::{CLOSED_FORM_EXACT_LIMIT, FIB_TABLE};
use fibbench_core::registry::{CalculatorFactory, DefaultFactory};

const RECURSION_CAP: u64 = 25;

fn calculator(factory: &DefaultFactory, kind: StrategyKind) -> Arc<dyn Calculator> {
    factory.get(kind.cli_name()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    /// Every exact strategy agrees on n in [0, 40]; recursion only up to its cap.
    #[test]
    fn exact_strategies_agree(n in 0i64..=40) {
        let factory = DefaultFactory::new(RECURSION_CAP);
        let expected = BigUint::from(FIB_TABLE[n as usize]);
        for kind in StrategyKind::ALL {
            let calc = calculator(&factory, kind);
            if !kind.is_exact() {
                continue;
            }
            let result = calc.calculate(n);
            if calc.input_cap().is_some_and(|cap| n as u64 > cap) {
                prop_assert!(
                    matches!(result, Err(FibError::RecursionBudgetExceeded { .. })),
                    "{} above cap at n={}", kind, n
                );
                continue;
            }
            prop_assert_eq!(result.unwrap(), expected.clone(), "{} at n={}", kind, n);
        }
    }

    /// Closed form stays within one of the exact value up to its documented limit.
    #[test]
    fn closed_form_within_tolerance(n in 0u64..=CLOSED_FORM_EXACT_LIMIT) {
        let factory = DefaultFactory::default();
        let approx = calculator(&factory, StrategyKind::ClosedForm)
            .calculate(n as i64)
            .unwrap();
        let exact = BigUint::from(FIB_TABLE[n as usize]);
        let diff = if approx > exact { &approx - &exact } else { &exact - &approx };
        prop_assert!(diff <= BigUint::from(1u32), "F({}) off by {}", n, diff);
    }

    /// F(n) + F(n+1) == F(n+2) for the big-integer strategies.
    #[test]
    fn fibonacci_recurrence(n in 0i64..600) {
        let factory = DefaultFactory::default();
        for kind in [StrategyKind::Iterative, StrategyKind::MatrixPower, StrategyKind::DynamicProgramming] {
            let calc = calculator(&factory, kind);
            let f0 = calc.calculate(n).unwrap();
            let f1 = calc.calculate(n + 1).unwrap();
            let f2 = calc.calculate(n + 2).unwrap();
            prop_assert_eq!(&f0 + &f1, f2, "{} recurrence at n={}", kind, n);
        }
    }

    /// No strategy returns a value for a negative index.
    #[test]
    fn negative_input_always_rejected(n in i64::MIN..0) {
        let factory = DefaultFactory::default();
        for kind in StrategyKind::ALL {
            let result = calculator(&factory, kind).calculate(n);
            prop_assert_eq!(result, Err(FibError::InvalidInput(n)));
        }
    }
}

/// F(0) = 0, F(1) = 1 for all strategies.
#[test]
fn base_cases_all_strategies() {
    let factory = DefaultFactory::default();
    for kind in StrategyKind::ALL {
        let calc = calculator(&factory, kind);
        assert_eq!(calc.calculate(0).unwrap(), BigUint::from(0u32), "{kind}");
        assert_eq!(calc.calculate(1).unwrap(), BigUint::from(1u32), "{kind}");
    }
}

/// Big-integer strategies agree well past u64.
#[test]
fn big_strategies_agree_beyond_u64() {
    let factory = DefaultFactory::default();
    let expected = calculator(&factory, StrategyKind::Iterative)
        .calculate(500)
        .unwrap();
    for kind in [
        StrategyKind::Memoized,
        StrategyKind::DynamicProgramming,
        StrategyKind::MatrixPower,
    ] {
        assert_eq!(
            calculator(&factory, kind).calculate(500).unwrap(),
            expected,
            "{kind}"
        );
    }
}
