//! Binet's closed-form formula in double precision.
//!
//! F(n) = (phi^n - psi^n) / sqrt(5), rounded to the nearest integer.
//! `f64` carries 53 bits of mantissa, so the result is exact only up to
//! F(70); beyond that it drifts, and past n ~ 1474 phi^n is no longer finite.
//! Both are accepted properties of the method.

use num_bigint::BigUint;
use num_traits::FromPrimitive;

use crate::calculator::{CoreCalculator, FibError, StrategyKind};

/// Closed-form (golden ratio) calculator.
pub struct ClosedForm;

impl ClosedForm {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClosedForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate Binet's formula without rounding.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn binet(n: u64) -> f64 {
    let sqrt5 = 5f64.sqrt();
    let phi = (1.0 + sqrt5) / 2.0;
    let psi = 1.0 - phi;
    let n = n as f64;
    (phi.powf(n) - psi.powf(n)) / sqrt5
}

impl CoreCalculator for ClosedForm {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        let approx = binet(n).round();
        BigUint::from_f64(approx).ok_or_else(|| {
            FibError::Calculation(format!("closed form is not finite for n={n}"))
        })
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::ClosedForm
    }
}
