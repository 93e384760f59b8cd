//! Memoized recursion over an explicit cache handle.

use std::collections::HashMap;
use std::sync::Arc;

use num_bigint::BigUint;
use parking_lot::Mutex;

use crate::calculator::{CoreCalculator, FibError, StrategyKind};

/// Cache of computed Fibonacci values keyed by index.
///
/// Shared by handle so callers decide its lifetime; the memoized calculator
/// never reaches for a process-wide table.
#[derive(Default)]
pub struct MemoCache {
    table: Mutex<HashMap<u64, BigUint>>,
}

impl MemoCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.table.lock().clear();
    }
}

/// Recursion with memoization.
pub struct MemoizedRecursion {
    cache: Arc<MemoCache>,
}

impl MemoizedRecursion {
    /// Create a calculator with its own private cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoCache::new()))
    }

    /// Create a calculator backed by the given cache.
    #[must_use]
    pub fn with_cache(cache: Arc<MemoCache>) -> Self {
        Self { cache }
    }

    /// The cache handle this calculator fills.
    #[must_use]
    pub fn cache(&self) -> &Arc<MemoCache> {
        &self.cache
    }
}

impl Default for MemoizedRecursion {
    fn default() -> Self {
        Self::new()
    }
}

fn fib_memo(n: u64, memo: &mut HashMap<u64, BigUint>) -> BigUint {
    if n <= 1 {
        return BigUint::from(n);
    }
    if let Some(value) = memo.get(&n) {
        return value.clone();
    }
    let value = fib_memo(n - 1, memo) + fib_memo(n - 2, memo);
    memo.insert(n, value.clone());
    value
}

impl CoreCalculator for MemoizedRecursion {
    fn calculate_core(&self, n: u64) -> Result<BigUint, FibError> {
        let mut table = self.cache.table.lock();
        Ok(fib_memo(n, &mut table))
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Memoized
    }

    fn reset(&self) {
        self.cache.clear();
    }
}
