use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

pub mod agents;
pub mod aggregate;
pub mod analytic;
pub mod config;
pub mod error;
pub mod labor;
pub mod metrics;
pub mod model;
pub mod sampling;
pub mod types;

#[cfg(feature = "instrument")]
pub use instrument;

pub use agents::{Firm, Government, Household};
pub use aggregate::{Aggregates, FrustrationIndex, compute_indices};
pub use analytic::{BaselineOutcome, BaselineParams};
pub use config::{ModelConfig, NormalParams};
pub use error::{Result, SimError};
pub use labor::{FirmHiring, MatchOutcome, match_tick};
pub use metrics::{HIRING_TARGET, MetricsSink, NullSink, TICK_TARGET, TickMetrics, TracingSink};
pub use model::{FALLBACK_REFERENCE_WAGE, Model, mean_wage};
pub use sampling::{FirmDraw, HouseholdDraw, ParameterSampler};
pub use types::*;

// ============================================================================
// WASM API - Snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct FirmSnapshot {
    pub id: u64,
    pub productivity: f64,
    pub wage: f64,
    pub labor_demand: f64,
    pub hired_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub tick: u64,
    pub reference_wage: f64,
    pub household_count: usize,
    pub aggregates: Aggregates,
    pub firms: Vec<FirmSnapshot>,
}

impl<S: MetricsSink> Model<S> {
    /// Serializable view of the current state for rendering.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            tick: self.tick,
            reference_wage: self.reference_wage,
            household_count: self.households.len(),
            aggregates: self.aggregates.clone(),
            firms: self
                .firms
                .iter()
                .map(|(id, f)| FirmSnapshot {
                    id: id.to_u64(),
                    productivity: f.productivity,
                    wage: f.wage,
                    labor_demand: f.labor_demand,
                    hired_count: f.hired_count,
                })
                .collect(),
        }
    }
}

// ============================================================================
// WASM API - Simulation
// ============================================================================

#[wasm_bindgen]
pub struct Simulation {
    model: Model<Vec<TickMetrics>>,
}

#[wasm_bindgen]
impl Simulation {
    #[wasm_bindgen(constructor)]
    pub fn new(config: ModelConfig) -> std::result::Result<Simulation, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Ok(Self {
            model: Model::with_sink(&config, Vec::new())?,
        })
    }

    /// Create a simulation from a JSON config; missing fields take defaults.
    #[wasm_bindgen]
    pub fn from_json(json: &str) -> std::result::Result<Simulation, JsError> {
        Self::new(ModelConfig::from_json(json)?)
    }

    /// Create a simulation with the default calibration.
    #[wasm_bindgen]
    pub fn with_default_config() -> std::result::Result<Simulation, JsError> {
        Self::new(ModelConfig::default())
    }

    /// Advance the simulation by one tick
    #[wasm_bindgen]
    pub fn advance_tick(&mut self) -> TickMetrics {
        self.model.step();
        self.model.metrics()
    }

    /// Advance by `ticks` and return the last tick's metrics
    #[wasm_bindgen]
    pub fn run(&mut self, ticks: u32) -> TickMetrics {
        self.model.run(u64::from(ticks))
    }

    #[wasm_bindgen]
    pub fn get_tick(&self) -> u64 {
        self.model.tick
    }

    #[wasm_bindgen]
    pub fn get_state_snapshot(&self) -> StateSnapshot {
        self.model.snapshot()
    }

    /// Every tick's metrics so far, oldest first.
    #[wasm_bindgen]
    pub fn history(&self) -> std::result::Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.model.sink())?)
    }
}

impl Simulation {
    pub fn model(&self) -> &Model<Vec<TickMetrics>> {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn small_sim() -> Simulation {
        let config = ModelConfig::default().with_population(120, 6).with_seed(5);
        match Simulation::new(config) {
            Ok(sim) => sim,
            Err(_) => panic!("default calibration should build"),
        }
    }

    #[test]
    fn advance_tick_records_history() {
        let mut sim = small_sim();
        let first = sim.advance_tick();
        let last = sim.run(9);

        assert_eq!(first.tick, 1);
        assert_eq!(last.tick, 10);
        assert_eq!(sim.get_tick(), 10);
        assert_eq!(sim.model().sink().len(), 10);
    }

    #[test]
    fn snapshot_mirrors_firms_in_hiring_order() {
        let mut sim = small_sim();
        sim.advance_tick();
        let snapshot = sim.get_state_snapshot();

        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.household_count, 120);
        assert_eq!(snapshot.firms.len(), 6);
        let hired: usize = snapshot.firms.iter().map(|f| f.hired_count).sum();
        assert_eq!(hired, snapshot.aggregates.employment_total);

        let model_ids: Vec<u64> = sim.model().firms.keys().map(|id| id.to_u64()).collect();
        let snapshot_ids: Vec<u64> = snapshot.firms.iter().map(|f| f.id).collect();
        assert_eq!(model_ids, snapshot_ids);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut sim = small_sim();
        sim.advance_tick();
        let json = serde_json::to_string(&sim.get_state_snapshot()).unwrap();
        assert!(json.contains("\"reference_wage\""));
        assert!(json.contains("\"i3\""));
    }
}
