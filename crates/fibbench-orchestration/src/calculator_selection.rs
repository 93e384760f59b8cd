//! Calculator selection and per-round request building.

use std::sync::Arc;

use tracing::warn;

use fibbench_core::calculator::{Calculator, FibError};
use fibbench_core::registry::CalculatorFactory;

use crate::interfaces::TaskRequest;

/// The recursion cap replaced a requested input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursionClamp {
    pub algorithm: String,
    pub requested: i64,
    pub cap: u64,
}

/// The requests for one round plus any clamping applied while building them.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub n: i64,
    pub requests: Vec<TaskRequest>,
    pub clamps: Vec<RecursionClamp>,
}

/// Get calculators to run based on method selection.
///
/// `all` anywhere in the list selects every strategy. Duplicates are dropped,
/// keeping first-seen order.
pub fn get_calculators_to_run(
    methods: &[String],
    factory: &dyn CalculatorFactory,
) -> Result<Vec<Arc<dyn Calculator>>, FibError> {
    if methods.is_empty() {
        return Err(FibError::Config("no methods selected".into()));
    }

    let names: Vec<String> = if methods.iter().any(|m| m.eq_ignore_ascii_case("all")) {
        factory.available().into_iter().map(str::to_string).collect()
    } else {
        methods.to_vec()
    };

    let mut calcs: Vec<Arc<dyn Calculator>> = Vec::with_capacity(names.len());
    for name in &names {
        let calc = factory.get(name)?;
        if calcs.iter().all(|c| c.kind() != calc.kind()) {
            calcs.push(calc);
        }
    }
    Ok(calcs)
}

/// Build one request per calculator, substituting capped inputs.
pub fn build_requests(calculators: &[Arc<dyn Calculator>], n: i64) -> RoundPlan {
    let mut requests = Vec::with_capacity(calculators.len());
    let mut clamps = Vec::new();

    for (slot, calc) in calculators.iter().enumerate() {
        let mut input = n;
        if let Some(cap) = calc.input_cap() {
            if u64::try_from(n).is_ok_and(|n| n > cap) {
                warn!(algorithm = calc.name(), requested = n, cap, "input clamped to recursion cap");
                input = i64::try_from(cap).unwrap_or(i64::MAX);
                clamps.push(RecursionClamp {
                    algorithm: calc.name().to_string(),
                    requested: n,
                    cap,
                });
            }
        }
        let label = format!("{}-worker", calc.kind().cli_name());
        requests.push(TaskRequest::new(Arc::clone(calc), input, label, slot));
    }

    RoundPlan {
        n,
        requests,
        clamps,
    }
}
