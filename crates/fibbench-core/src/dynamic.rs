//! Dynamic programming over a full table.

use num_bigint::BigUint;

use crate::calculator::{CoreCalculator, FibError, StrategyKind};

/// Table-filling calculator: linear time, linear space.
pub struct DynamicProgramming;

impl DynamicProgramming {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DynamicProgramming {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for DynamicProgramming {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        let len = usize::try_from(n)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| FibError::Calculation(format!("table for n={n} does not fit in memory")))?;

        // Only the entry headers are reserved; digit storage grows as the
        // table fills.
        let mut table: Vec<BigUint> = Vec::new();
        table
            .try_reserve_exact(len)
            .map_err(|e| FibError::Calculation(format!("table for n={n}: {e}")))?;
        table.push(BigUint::ZERO);
        table.push(BigUint::from(1u32));
        for i in 2..len {
            let next = &table[i - 1] + &table[i - 2];
            table.push(next);
        }
        // n >= 2 here, so the table always holds index n.
        Ok(table.swap_remove(len - 1))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::DynamicProgramming
    }
}
