//! Matrix Exponentiation algorithm for Fibonacci computation.
//!
//! Computes F(n) via Q^n where Q = [[1,1],[1,0]]; F(n) is the top-right entry.
//! The power recurses on the halved exponent and multiplies the odd residual
//! back in.

use num_bigint::BigUint;

use crate::calculator::{CoreCalculator, FibError, StrategyKind};

/// 2x2 matrix of `BigUint` values.
pub type Matrix = [[BigUint; 2]; 2];

/// The Fibonacci Q matrix [[1,1],[1,0]].
#[must_use]
pub fn fibonacci_q() -> Matrix {
    [
        [BigUint::from(1u32), BigUint::from(1u32)],
        [BigUint::from(1u32), BigUint::ZERO],
    ]
}

/// Plain 2x2x2 multiply-accumulate.
#[must_use]
pub fn matrix_multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let mut out: Matrix = Default::default();
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            for k in 0..2 {
                *cell += &a[i][k] * &b[k][j];
            }
        }
    }
    out
}

/// Raise `m` to the power `exp` (exp >= 1).
#[must_use]
pub fn matrix_power(m: &Matrix, exp: u64) -> Matrix {
    if exp == 1 {
        return m.clone();
    }
    let squared = matrix_multiply(m, m);
    let half = matrix_power(&squared, exp / 2);
    if exp % 2 == 0 {
        half
    } else {
        matrix_multiply(m, &half)
    }
}

/// Matrix Exponentiation calculator.
pub struct MatrixExponentiation;

impl MatrixExponentiation {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for MatrixExponentiation {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for MatrixExponentiation {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        let [[_, f_n], _] = matrix_power(&fibonacci_q(), n);
        Ok(f_n)
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::MatrixPower
    }
}
