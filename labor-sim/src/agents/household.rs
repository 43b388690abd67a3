use serde::{Deserialize, Serialize};

use crate::agents::Government;
use crate::sampling::HouseholdDraw;
use crate::types::{FirmId, HouseholdId, Hours, Wage};

// === HOUSEHOLD ===

/// A household that funds its desired consumption with market wages and
/// covers the shortfall with domestic (extramarket) labor.
///
/// All derived fields are overwritten every tick; nothing is carried over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Household {
    pub id: HouseholdId,
    pub domestic_productivity: f64,
    /// Consumption desired per hour of available time.
    pub consumption_desire: f64,
    pub time_use_intensity: f64,
    pub time_use_incompatibility: f64,

    /// Non-owning employer link, cleared at the start of every tick.
    pub employer: Option<FirmId>,

    // Per-tick outputs
    pub market_hours: Hours,
    /// Net-of-tax consumption funded by market income.
    pub market_consumption: f64,
    pub notional_labor_supply: Hours,
    pub extramarket_hours: Hours,
    pub total_labor_hours: Hours,
    pub time_budget_potential: Hours,
}

impl Household {
    pub fn new(
        id: HouseholdId,
        domestic_productivity: f64,
        consumption_desire: f64,
        time_use_intensity: f64,
        time_use_incompatibility: f64,
    ) -> Self {
        Self {
            id,
            domestic_productivity,
            consumption_desire,
            time_use_intensity,
            time_use_incompatibility,
            employer: None,
            market_hours: 0.0,
            market_consumption: 0.0,
            notional_labor_supply: 0.0,
            extramarket_hours: 0.0,
            total_labor_hours: 0.0,
            time_budget_potential: 0.0,
        }
    }

    pub fn from_draw(id: HouseholdId, draw: HouseholdDraw) -> Self {
        Self::new(
            id,
            draw.domestic_productivity,
            draw.consumption_desire,
            draw.time_use_intensity,
            draw.time_use_incompatibility,
        )
    }

    pub fn is_employed(&self) -> bool {
        self.employer.is_some()
    }

    pub fn desired_consumption(&self, total_available_time: Hours) -> f64 {
        self.consumption_desire * total_available_time
    }

    /// Hours left for labor once exclusive consumption time is reserved,
    /// floored at zero.
    pub fn time_budget(&self, total_available_time: Hours) -> Hours {
        let reserved =
            self.consumption_desire * (self.time_use_incompatibility / self.time_use_intensity);
        (total_available_time * (1.0 - reserved)).max(0.0)
    }

    /// Recompute this tick's outputs.
    ///
    /// `employer_wage` is the wage of the firm the employer link resolves to,
    /// `None` when unemployed. `reference_wage` is the population mean wage
    /// used when the household has no positive wage of its own.
    pub fn step(
        &mut self,
        government: &Government,
        employer_wage: Option<Wage>,
        reference_wage: Wage,
        total_available_time: Hours,
    ) {
        let (market_hours, own_wage) = match employer_wage {
            Some(wage) => (government.legal_workday(), wage),
            None => (0.0, 0.0),
        };
        let gross_income = own_wage * market_hours;
        let market_consumption = government.net_of_tax(gross_income);

        let desired = self.desired_consumption(total_available_time);

        let wage_for_supply = if own_wage > 0.0 { own_wage } else { reference_wage };
        // A non-positive reference wage means no notional supply, not an error
        self.notional_labor_supply = if wage_for_supply > 0.0 {
            desired / wage_for_supply
        } else {
            0.0
        };

        let deficit = desired - market_consumption;
        self.extramarket_hours = (deficit / self.domestic_productivity).max(0.0);

        self.market_hours = market_hours;
        self.market_consumption = market_consumption;
        self.total_labor_hours = market_hours + self.extramarket_hours;
        self.time_budget_potential = self.time_budget(total_available_time);
    }
}
