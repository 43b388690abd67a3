use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::types::{FirmId, Hours, Wage};

/// A firm funded by an equal share of public spending.
///
/// Labor demand follows the multiplier `share / (z - w)`: every hour of
/// labor leaves `z - w` of product beyond its wage bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firm {
    pub id: FirmId,
    pub productivity: f64,
    pub wage: Wage,
    /// Workers matched this tick.
    pub hired_count: usize,
    /// Hours of labor demanded this tick.
    pub labor_demand: Hours,
}

impl Firm {
    pub fn new(id: FirmId, productivity: f64, wage: Wage) -> Self {
        Self {
            id,
            productivity,
            wage,
            hired_count: 0,
            labor_demand: 0.0,
        }
    }

    pub fn margin(&self) -> f64 {
        self.productivity - self.wage
    }

    pub fn is_viable(&self) -> bool {
        self.productivity > self.wage
    }

    /// `DegenerateMarket` unless wage sits strictly below productivity.
    /// `index` is the firm's position in hiring order, used for reporting.
    pub fn ensure_margin(&self, index: usize) -> Result<()> {
        if self.is_viable() {
            Ok(())
        } else {
            Err(SimError::DegenerateMarket {
                firm: index,
                productivity: self.productivity,
                wage: self.wage,
            })
        }
    }

    /// Recompute and store this tick's labor demand.
    ///
    /// An unviable firm demands nothing; that is a state, not an error.
    pub fn compute_demand(&mut self, total_public_spending: f64, num_firms: usize) -> Hours {
        self.labor_demand = if num_firms > 0 && self.is_viable() {
            let individual_share = total_public_spending / num_firms as f64;
            individual_share / self.margin()
        } else {
            0.0
        };
        self.labor_demand
    }

    /// Job slots this tick: demand in workdays, rounded half away from zero.
    pub fn vacancies(&self, legal_workday: Hours) -> usize {
        let slots = (self.labor_demand / legal_workday).round();
        if slots.is_finite() && slots > 0.0 {
            slots as usize
        } else {
            0
        }
    }
}
