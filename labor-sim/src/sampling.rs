//! Heterogeneous agent parameterization.
//!
//! Draws happen once per agent at population creation. Out-of-range draws are
//! clamped rather than redrawn, which deliberately piles probability mass on
//! the clamp bounds.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::{ModelConfig, NormalParams};
use crate::error::{Result, SimError};

/// Wage floor applied to every firm.
pub const MIN_WAGE: f64 = 1.0;
/// Minimum gap kept between a firm's productivity and its wage.
pub const MIN_MARGIN: f64 = 1.0;
/// Floor for household domestic productivity and consumption desire.
pub const HOUSEHOLD_FLOOR: f64 = 0.1;

/// Raw parameters for one firm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirmDraw {
    pub productivity: f64,
    pub wage: f64,
}

/// Raw parameters for one household.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseholdDraw {
    pub domestic_productivity: f64,
    pub consumption_desire: f64,
    pub time_use_intensity: f64,
    pub time_use_incompatibility: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ParameterSampler {
    productivity: Normal<f64>,
    wage: Normal<f64>,
    domestic_productivity: Normal<f64>,
    consumption: Normal<f64>,
    time_use_low: f64,
    time_use_high: f64,
}

impl ParameterSampler {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let (low, high) = (config.time_use_low, config.time_use_high);
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(SimError::InvalidConfig(format!(
                "empty or unbounded time-use range [{low}, {high})"
            )));
        }
        Ok(Self {
            productivity: normal("firm_productivity", config.firm_productivity)?,
            wage: normal("firm_wage", config.firm_wage)?,
            domestic_productivity: normal(
                "household_domestic_productivity",
                config.household_domestic_productivity,
            )?,
            consumption: normal("household_consumption", config.household_consumption)?,
            time_use_low: config.time_use_low,
            time_use_high: config.time_use_high,
        })
    }

    /// Productivity first, then the provisional wage.
    pub fn sample_firm<R: Rng>(&self, rng: &mut R) -> FirmDraw {
        let productivity = self.productivity.sample(rng);
        let provisional = self.wage.sample(rng);
        FirmDraw {
            productivity,
            wage: clamp_wage(provisional, productivity),
        }
    }

    /// Domestic productivity, consumption desire, intensity, incompatibility.
    pub fn sample_household<R: Rng>(&self, rng: &mut R) -> HouseholdDraw {
        let domestic_productivity = self.domestic_productivity.sample(rng).max(HOUSEHOLD_FLOOR);
        let consumption_desire = self.consumption.sample(rng).max(HOUSEHOLD_FLOOR);
        let time_use_intensity = rng.random_range(self.time_use_low..self.time_use_high);
        let time_use_incompatibility = rng.random_range(self.time_use_low..self.time_use_high);
        HouseholdDraw {
            domestic_productivity,
            consumption_desire,
            time_use_intensity,
            time_use_incompatibility,
        }
    }
}

/// `max(MIN_WAGE, min(wage, productivity - MIN_MARGIN))`.
///
/// The floor wins over the ceiling, so a productivity at or below
/// `MIN_WAGE + MIN_MARGIN` leaves no positive margin.
pub fn clamp_wage(wage: f64, productivity: f64) -> f64 {
    wage.min(productivity - MIN_MARGIN).max(MIN_WAGE)
}

fn normal(field: &'static str, params: NormalParams) -> Result<Normal<f64>> {
    Normal::new(params.mean, params.std).map_err(|source| SimError::Distribution { field, source })
}
