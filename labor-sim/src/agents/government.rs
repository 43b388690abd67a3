use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::config::ModelConfig;
use crate::error::{Result, SimError};
use crate::types::Hours;

/// Fiscal and labor policy, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Government {
    public_spending: f64,
    tax_rate: f64,
    legal_workday: Hours,
}

impl Government {
    pub fn new(public_spending: f64, tax_rate: f64, legal_workday: Hours) -> Result<Self> {
        if !(public_spending > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "public spending must be > 0, got {public_spending}"
            )));
        }
        if !(0.0..=1.0).contains(&tax_rate) {
            return Err(SimError::InvalidConfig(format!(
                "tax rate must be in [0, 1], got {tax_rate}"
            )));
        }
        if !(legal_workday > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "legal workday must be > 0, got {legal_workday}"
            )));
        }
        Ok(Self {
            public_spending,
            tax_rate,
            legal_workday,
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Self::new(config.public_spending, config.tax_rate, config.legal_workday)
    }

    pub fn public_spending(&self) -> f64 {
        self.public_spending
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn legal_workday(&self) -> Hours {
        self.legal_workday
    }

    /// Net consumption a gross income buys after tax.
    pub fn net_of_tax(&self, gross: f64) -> f64 {
        gross * (1.0 - self.tax_rate)
    }
}
