use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{Result, SimError};

// ============================================================================
// Distribution parameters
// ============================================================================

/// Mean and standard deviation of a normal draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct NormalParams {
    pub mean: f64,
    pub std: f64,
}

impl NormalParams {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// Degenerate distribution: every draw equals `value`.
    pub fn fixed(value: f64) -> Self {
        Self { mean: value, std: 0.0 }
    }
}

// ============================================================================
// Model configuration
// ============================================================================

/// Run-wide construction parameters.
///
/// Defaults reproduce the Spain 2024 calibration: effective fiscal pressure
/// around 30%, output per hour near 68 and a net labor cost near 17.5, with
/// household parameters as modelling hypotheses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct ModelConfig {
    // Government
    pub public_spending: f64,
    pub tax_rate: f64,
    pub legal_workday: f64,

    // Firms
    pub firm_productivity: NormalParams,
    pub firm_wage: NormalParams,

    // Households
    pub household_domestic_productivity: NormalParams,
    pub household_consumption: NormalParams,
    /// Lower bound of the uniform draw for time-use intensity and incompatibility.
    pub time_use_low: f64,
    /// Upper bound (exclusive) of the same draw.
    pub time_use_high: f64,

    // Population
    pub household_count: usize,
    pub firm_count: usize,
    pub total_available_time: f64,

    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            public_spending: 45_000.0,
            tax_rate: 0.30,
            legal_workday: 1.0,
            firm_productivity: NormalParams::new(68.0, 5.0),
            firm_wage: NormalParams::new(17.5, 2.0),
            household_domestic_productivity: NormalParams::new(15.0, 2.0),
            household_consumption: NormalParams::new(0.7, 0.1),
            time_use_low: 0.8,
            time_use_high: 1.2,
            household_count: 1000,
            firm_count: 50,
            total_available_time: 2000.0,
            seed: 42,
        }
    }
}

impl ModelConfig {
    /// Homogeneous single-firm economy using the textbook numbers
    /// (G=500, z=50, w=10, z_b=5, c=0.8, T=2000, 100 households, no tax).
    ///
    /// Only the numbers are textbook. Every household still desires the full
    /// `c * T` for itself, as in the calibrated model, rather than a 1/N share
    /// of an aggregate `c * T`. Compare aggregates against
    /// `analytic::solve` per household, not per economy. Time-use parameters
    /// are still drawn per household.
    pub fn textbook() -> Self {
        Self {
            public_spending: 500.0,
            tax_rate: 0.0,
            legal_workday: 1.0,
            firm_productivity: NormalParams::fixed(50.0),
            firm_wage: NormalParams::fixed(10.0),
            household_domestic_productivity: NormalParams::fixed(5.0),
            household_consumption: NormalParams::fixed(0.8),
            household_count: 100,
            firm_count: 1,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_population(mut self, households: usize, firms: usize) -> Self {
        self.household_count = households;
        self.firm_count = firms;
        self
    }

    /// Check the scalar parameters. Distribution parameters are checked
    /// when the sampler is built.
    pub fn validate(&self) -> Result<()> {
        if !(self.public_spending > 0.0) {
            return Err(invalid(format!(
                "public_spending must be > 0, got {}",
                self.public_spending
            )));
        }
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(invalid(format!(
                "tax_rate must be in [0, 1], got {}",
                self.tax_rate
            )));
        }
        if !(self.legal_workday > 0.0) {
            return Err(invalid(format!(
                "legal_workday must be > 0, got {}",
                self.legal_workday
            )));
        }
        if !(self.total_available_time > 0.0) {
            return Err(invalid(format!(
                "total_available_time must be > 0, got {}",
                self.total_available_time
            )));
        }
        if self.household_count == 0 {
            return Err(invalid("household_count must be at least 1".to_string()));
        }
        if !(self.time_use_low > 0.0
            && self.time_use_low < self.time_use_high
            && self.time_use_high.is_finite())
        {
            return Err(invalid(format!(
                "time-use range must be finite with 0 < low < high, got [{}, {})",
                self.time_use_low, self.time_use_high
            )));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> SimError {
    SimError::InvalidConfig(msg)
}
