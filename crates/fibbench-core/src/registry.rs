//! Calculator factory and registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::calculator::{Calculator, FibCalculator, FibError, StrategyKind};
use crate::closed_form::ClosedForm;
use crate::constants::DEFAULT_RECURSION_CAP;
use crate::dynamic::DynamicProgramming;
use crate::iterative::Iterative;
use crate::matrix::MatrixExponentiation;
use crate::memoized::{MemoCache, MemoizedRecursion};
use crate::recursive::NaiveRecursion;

/// Factory trait for creating calculators.
pub trait CalculatorFactory: Send + Sync {
    /// Get or create a calculator by name.
    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError>;

    /// List all available calculator names.
    fn available(&self) -> Vec<&str>;
}

/// Default factory with lazy creation and cache.
pub struct DefaultFactory {
    recursion_cap: u64,
    memo: Arc<MemoCache>,
    cache: RwLock<HashMap<StrategyKind, Arc<dyn Calculator>>>,
}

impl DefaultFactory {
    /// Create a new default factory with the given recursion cap.
    #[must_use]
    pub fn new(recursion_cap: u64) -> Self {
        Self {
            recursion_cap,
            memo: Arc::new(MemoCache::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The memo cache handed to the memoized strategy.
    #[must_use]
    pub fn memo_cache(&self) -> &Arc<MemoCache> {
        &self.memo
    }

    fn create_calculator(&self, kind: StrategyKind) -> Arc<dyn Calculator> {
        debug!(strategy = %kind, cap = self.recursion_cap, "creating calculator");
        let core: Arc<dyn crate::calculator::CoreCalculator> = match kind {
            StrategyKind::Recursive => Arc::new(NaiveRecursion::new(self.recursion_cap)),
            StrategyKind::Memoized => {
                Arc::new(MemoizedRecursion::with_cache(Arc::clone(&self.memo)))
            }
            StrategyKind::Iterative => Arc::new(Iterative::new()),
            StrategyKind::DynamicProgramming => Arc::new(DynamicProgramming::new()),
            StrategyKind::MatrixPower => Arc::new(MatrixExponentiation::new()),
            StrategyKind::ClosedForm => Arc::new(ClosedForm::new()),
        };
        Arc::new(FibCalculator::new(core))
    }
}

impl Default for DefaultFactory {
    fn default() -> Self {
        Self::new(DEFAULT_RECURSION_CAP)
    }
}

impl CalculatorFactory for DefaultFactory {
    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError> {
        let kind: StrategyKind = name.parse()?;

        // Check cache first
        if let Some(calc) = self.cache.read().get(&kind) {
            return Ok(Arc::clone(calc));
        }

        let calc = self.create_calculator(kind);
        self.cache.write().insert(kind, Arc::clone(&calc));
        Ok(calc)
    }

    fn available(&self) -> Vec<&str> {
        StrategyKind::ALL.iter().map(|k| k.cli_name()).collect()
    }
}
