//! Population-level indices.
//!
//! - I1 (placement): market hours over notional labor supply
//! - I2 (dualism): market hours over all labor hours
//! - I3 (frustration): all labor hours over the time-budget potential

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tsify_next::Tsify;

use crate::agents::{Firm, Household};
use crate::types::{FirmId, Hours};

// === FRUSTRATION INDEX ===

/// I3 as a value that cannot leak an infinity into later arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum FrustrationIndex {
    Bounded(f64),
    /// No time budget is left: labor has nowhere to fit.
    Unbounded,
}

impl FrustrationIndex {
    pub fn from_ratio(labor: Hours, time_budget: Hours) -> Self {
        if time_budget > 0.0 {
            Self::Bounded(labor / time_budget)
        } else {
            Self::Unbounded
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Bounded(v) => Some(v),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// At or past the point where required labor fills the whole budget.
    pub fn is_exhausted(self) -> bool {
        match self {
            Self::Bounded(v) => v >= 1.0,
            Self::Unbounded => true,
        }
    }
}

impl Default for FrustrationIndex {
    fn default() -> Self {
        Self::Bounded(0.0)
    }
}

impl std::fmt::Display for FrustrationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bounded(v) => write!(f, "{v:.4}"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}

// === AGGREGATES ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Aggregates {
    pub employment_total: usize,
    pub unemployment_rate: f64,
    pub market_hours_total: Hours,
    pub extramarket_hours_total: Hours,
    pub notional_supply_total: Hours,
    pub time_budget_total: Hours,
    pub i1: f64,
    pub i2: f64,
    pub i3: FrustrationIndex,
}

impl Aggregates {
    pub fn labor_hours_total(&self) -> Hours {
        self.market_hours_total + self.extramarket_hours_total
    }
}

/// Sum the population into the tick's indices.
///
/// Employment is counted on the firm side; the household side must agree.
pub fn compute_indices(firms: &SlotMap<FirmId, Firm>, households: &[Household]) -> Aggregates {
    let employment_total: usize = firms.values().map(|f| f.hired_count).sum();
    debug_assert_eq!(
        employment_total,
        households.iter().filter(|h| h.is_employed()).count(),
        "firm-side and household-side employment disagree"
    );

    let n = households.len();
    let unemployment_rate = if n > 0 {
        1.0 - employment_total as f64 / n as f64
    } else {
        0.0
    };

    let mut market_hours_total = 0.0;
    let mut extramarket_hours_total = 0.0;
    let mut notional_supply_total = 0.0;
    let mut time_budget_total = 0.0;
    for h in households {
        market_hours_total += h.market_hours;
        extramarket_hours_total += h.extramarket_hours;
        notional_supply_total += h.notional_labor_supply;
        time_budget_total += h.time_budget_potential;
    }

    let labor_total = market_hours_total + extramarket_hours_total;

    Aggregates {
        employment_total,
        unemployment_rate,
        market_hours_total,
        extramarket_hours_total,
        notional_supply_total,
        time_budget_total,
        i1: ratio_or_zero(market_hours_total, notional_supply_total),
        i2: ratio_or_zero(market_hours_total, labor_total),
        i3: FrustrationIndex::from_ratio(labor_total, time_budget_total),
    }
}

fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
