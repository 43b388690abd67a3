//! Closed-form single-sector baseline.
//!
//! The aggregate economy without agents: one representative firm and one
//! representative household. Useful as a reference point for the agent runs.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::aggregate::FrustrationIndex;
use crate::error::{Result, SimError};
use crate::types::{Hours, Wage};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct BaselineParams {
    /// Autonomous (public) spending.
    pub public_spending: f64,
    pub productivity: f64,
    pub wage: Wage,
    pub domestic_productivity: f64,
    pub total_time: Hours,
    /// Consumption needed per hour.
    pub consumption_desire: f64,
    pub time_use_incompatibility: f64,
    pub time_use_intensity: f64,
}

impl Default for BaselineParams {
    fn default() -> Self {
        Self {
            public_spending: 500.0,
            productivity: 50.0,
            wage: 10.0,
            domestic_productivity: 5.0,
            total_time: 2000.0,
            consumption_desire: 0.8,
            time_use_incompatibility: 1.0,
            time_use_intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct BaselineOutcome {
    /// L = G / (z - w)
    pub market_hours: Hours,
    /// C_m = c * T
    pub desired_consumption: f64,
    /// MS = w * L
    pub wage_bill: f64,
    /// L_b = max(0, (C_m - MS) / z_b)
    pub extramarket_hours: Hours,
    /// L_w = L + L_b
    pub total_labor_hours: Hours,
    /// L_wp = T * (1 - c * l / x), not floored
    pub time_budget: Hours,
    pub i3: FrustrationIndex,
}

impl BaselineOutcome {
    pub fn dualism(&self) -> f64 {
        if self.total_labor_hours > 0.0 {
            self.market_hours / self.total_labor_hours
        } else {
            0.0
        }
    }
}

pub fn solve(params: &BaselineParams) -> Result<BaselineOutcome> {
    let margin = params.productivity - params.wage;
    if !(margin > 0.0) {
        return Err(SimError::DegenerateMarket {
            firm: 0,
            productivity: params.productivity,
            wage: params.wage,
        });
    }
    if !(params.domestic_productivity > 0.0) {
        return Err(SimError::InvalidConfig(format!(
            "domestic productivity must be > 0, got {}",
            params.domestic_productivity
        )));
    }

    let market_hours = params.public_spending / margin;
    let desired_consumption = params.consumption_desire * params.total_time;
    let wage_bill = params.wage * market_hours;
    let extramarket_hours =
        ((desired_consumption - wage_bill) / params.domestic_productivity).max(0.0);
    let total_labor_hours = market_hours + extramarket_hours;
    let time_budget = params.total_time
        * (1.0
            - params.consumption_desire
                * (params.time_use_incompatibility / params.time_use_intensity));

    Ok(BaselineOutcome {
        market_hours,
        desired_consumption,
        wage_bill,
        extramarket_hours,
        total_labor_hours,
        time_budget,
        i3: FrustrationIndex::from_ratio(total_labor_hours, time_budget),
    })
}
