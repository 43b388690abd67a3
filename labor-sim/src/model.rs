// Population state and tick orchestration

use rand::SeedableRng;
use rand::rngs::StdRng;
use slotmap::SlotMap;

use crate::agents::{Firm, Government, Household};
use crate::aggregate::{Aggregates, compute_indices};
use crate::config::ModelConfig;
use crate::error::{Result, SimError};
use crate::labor::{MatchOutcome, match_tick};
use crate::metrics::{MetricsSink, TickMetrics, TracingSink};
use crate::sampling::{HouseholdDraw, ParameterSampler};
use crate::types::{FirmId, HouseholdId, Hours, Wage};

/// Reference wage used when there are no firms to average over.
pub const FALLBACK_REFERENCE_WAGE: Wage = 1.0;

/// Complete state of one simulation run.
///
/// Firms and households are created once and never removed. Firm arena order
/// is insertion order, which is also hiring priority.
#[derive(Debug)]
pub struct Model<S: MetricsSink = TracingSink> {
    /// Completed ticks.
    pub tick: u64,

    pub government: Government,
    pub firms: SlotMap<FirmId, Firm>,
    pub households: Vec<Household>,
    pub total_available_time: Hours,

    /// Mean firm wage as of the last tick.
    pub reference_wage: Wage,
    pub aggregates: Aggregates,
    pub last_match: MatchOutcome,

    rng: StdRng,
    sink: S,
}

impl Model<TracingSink> {
    /// Sample a population from `config`, reporting ticks through `tracing`.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Self::with_sink(config, TracingSink)
    }
}

impl<S: MetricsSink> Model<S> {
    /// Sample a population from `config`.
    ///
    /// All sampling draws come from the run's RNG before the first tick: every
    /// firm in order, then every household in order.
    pub fn with_sink(config: &ModelConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let government = Government::from_config(config)?;
        let sampler = ParameterSampler::from_config(config)?;

        let mut model = Self::empty(government, config.total_available_time, config.seed, sink)?;
        model.firms.reserve(config.firm_count);
        model.households.reserve(config.household_count);

        for _ in 0..config.firm_count {
            let draw = sampler.sample_firm(&mut model.rng);
            model.add_firm(draw.productivity, draw.wage)?;
        }
        for _ in 0..config.household_count {
            let draw = sampler.sample_household(&mut model.rng);
            model.add_household(draw)?;
        }

        model.reference_wage = config.firm_wage.mean;
        Ok(model)
    }

    /// A model with no agents. Populate it with `add_firm` / `add_household`.
    pub fn empty(
        government: Government,
        total_available_time: Hours,
        seed: u64,
        sink: S,
    ) -> Result<Self> {
        if !(total_available_time > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "total_available_time must be > 0, got {total_available_time}"
            )));
        }
        Ok(Self {
            tick: 0,
            government,
            firms: SlotMap::with_key(),
            households: Vec::new(),
            total_available_time,
            reference_wage: FALLBACK_REFERENCE_WAGE,
            aggregates: Aggregates::default(),
            last_match: MatchOutcome::default(),
            rng: StdRng::seed_from_u64(seed),
            sink,
        })
    }

    // === Population Management ===

    /// Add a firm at the back of hiring order.
    ///
    /// Fails with `DegenerateMarket` if `wage >= productivity`.
    pub fn add_firm(&mut self, productivity: f64, wage: Wage) -> Result<FirmId> {
        let index = self.firms.len();
        let candidate = Firm::new(FirmId::default(), productivity, wage);
        candidate.ensure_margin(index)?;
        Ok(self
            .firms
            .insert_with_key(|id| Firm { id, ..candidate }))
    }

    /// Fails with `InvalidConfig` once the population outgrows `u32` ids.
    pub fn add_household(&mut self, draw: HouseholdDraw) -> Result<HouseholdId> {
        let id = HouseholdId::from_index(self.households.len())?;
        self.households.push(Household::from_draw(id, draw));
        Ok(id)
    }

    pub fn get_firm(&self, id: FirmId) -> Option<&Firm> {
        self.firms.get(id)
    }

    pub fn get_household(&self, id: HouseholdId) -> Option<&Household> {
        self.households.get(id.0 as usize)
    }

    /// Households with an employer link (must equal the firm-side sum).
    pub fn employed_count(&self) -> usize {
        self.households.iter().filter(|h| h.is_employed()).count()
    }

    // === Sink Access ===

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Metrics for the most recent tick.
    pub fn metrics(&self) -> TickMetrics {
        TickMetrics::from_aggregates(self.tick, &self.aggregates)
    }

    // === Simulation Tick ===

    /// Run one tick.
    ///
    /// Phase order is fixed because each phase reads what the previous wrote:
    /// 1. Reset employment links and hire counts
    /// 2. Reference wage = mean firm wage
    /// 3. Firms compute labor demand
    /// 4. Labor market matches households to vacancies (one shuffle)
    /// 5. Households compute hours, supply and time budget
    /// 6. Aggregate indices, then report to the sink
    pub fn step(&mut self) {
        self.tick += 1;

        // 1. RESET
        for household in &mut self.households {
            household.employer = None;
        }
        for firm in self.firms.values_mut() {
            firm.hired_count = 0;
        }

        // 2. REFERENCE WAGE
        self.reference_wage = mean_wage(&self.firms);

        // 3. DEMAND
        let spending = self.government.public_spending();
        let num_firms = self.firms.len();
        for firm in self.firms.values_mut() {
            firm.compute_demand(spending, num_firms);
        }

        // 4. MATCHING
        let outcome = match_tick(
            &mut self.firms,
            &mut self.households,
            self.government.legal_workday(),
            &mut self.rng,
        );

        #[cfg(feature = "instrument")]
        {
            use crate::types::KeyToU64;
            for hiring in &outcome.hirings {
                tracing::info!(
                    target: "hiring",
                    tick = self.tick,
                    firm = hiring.firm.to_u64(),
                    labor_demand = self.firms[hiring.firm].labor_demand,
                    vacancies = hiring.vacancies as u64,
                    hired = hiring.hired as u64,
                );
            }
        }

        // 5. HOUSEHOLDS
        for household in &mut self.households {
            // A link that no longer resolves counts as unemployed
            let employer_wage = household
                .employer
                .and_then(|id| self.firms.get(id))
                .map(|firm| firm.wage);
            household.step(
                &self.government,
                employer_wage,
                self.reference_wage,
                self.total_available_time,
            );
        }

        // 6. AGGREGATION
        self.aggregates = compute_indices(&self.firms, &self.households);
        self.last_match = outcome;
        let metrics = self.metrics();
        self.sink.record(&metrics);
    }

    /// Run `ticks` ticks and return the final tick's metrics.
    pub fn run(&mut self, ticks: u64) -> TickMetrics {
        for _ in 0..ticks {
            self.step();
        }
        self.metrics()
    }
}

/// Mean firm wage, or `FALLBACK_REFERENCE_WAGE` with no firms.
pub fn mean_wage(firms: &SlotMap<FirmId, Firm>) -> Wage {
    if firms.is_empty() {
        return FALLBACK_REFERENCE_WAGE;
    }
    firms.values().map(|f| f.wage).sum::<f64>() / firms.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FrustrationIndex;
    use crate::config::NormalParams;
    use crate::metrics::NullSink;

    fn draw(c: f64) -> HouseholdDraw {
        HouseholdDraw {
            domestic_productivity: 5.0,
            consumption_desire: c,
            time_use_intensity: 1.0,
            time_use_incompatibility: 1.0,
        }
    }

    fn two_firm_model(households: usize) -> Model<Vec<TickMetrics>> {
        let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
        let mut model = Model::empty(gov, 2000.0, 9, Vec::new()).unwrap();
        model.add_firm(60.0, 10.0).unwrap();
        model.add_firm(40.0, 5.0).unwrap();
        for _ in 0..households {
            model.add_household(draw(0.5)).unwrap();
        }
        model
    }

    #[test]
    fn sampled_population_has_configured_size() {
        let config = ModelConfig::default().with_population(200, 10);
        let model = Model::with_sink(&config, NullSink).unwrap();
        assert_eq!(model.firms.len(), 10);
        assert_eq!(model.households.len(), 200);
        assert_eq!(model.reference_wage, config.firm_wage.mean);
        assert!(model.firms.values().all(|f| f.wage < f.productivity));
    }

    #[test]
    fn degenerate_firm_aborts_construction() {
        // Productivity pinned below the wage floor: clamping cannot rescue it
        let config = ModelConfig {
            firm_productivity: NormalParams::fixed(0.8),
            ..ModelConfig::default().with_population(10, 3)
        };
        match Model::with_sink(&config, NullSink) {
            Err(SimError::DegenerateMarket { firm, wage, .. }) => {
                assert_eq!(firm, 0);
                assert_eq!(wage, 1.0);
            }
            other => panic!("expected DegenerateMarket, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn add_firm_checks_margin() {
        let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
        let mut model = Model::empty(gov, 2000.0, 1, NullSink).unwrap();
        assert!(model.add_firm(10.0, 10.0).is_err());
        assert!(model.firms.is_empty());
        let id = model.add_firm(10.0, 9.0).unwrap();
        assert_eq!(model.get_firm(id).map(|f| f.id), Some(id));
    }

    #[test]
    fn two_firm_scenario() {
        let mut model = two_firm_model(30);
        model.step();

        let demands: Vec<f64> = model.firms.values().map(|f| f.labor_demand).collect();
        assert_eq!(demands[0], 10.0);
        assert!((demands[1] - 500.0 / 35.0).abs() < 1e-12);
        let hired: Vec<usize> = model.firms.values().map(|f| f.hired_count).collect();
        assert_eq!(hired, vec![10, 14]);

        assert_eq!(model.aggregates.employment_total, 24);
        assert_eq!(model.employed_count(), 24);
        assert!((model.aggregates.unemployment_rate - 0.2).abs() < 1e-12);
        assert_eq!(model.reference_wage, 7.5);
    }

    #[test]
    fn sink_receives_one_event_per_tick() {
        let mut model = two_firm_model(30);
        let last = model.run(5);
        let history = model.into_sink();
        assert_eq!(history.len(), 5);
        assert_eq!(history.iter().map(|m| m.tick).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(history[4], last);
    }

    #[test]
    fn no_firms_leaves_everyone_unemployed() {
        let gov = Government::new(1000.0, 0.3, 1.0).unwrap();
        let mut model = Model::empty(gov, 2000.0, 3, NullSink).unwrap();
        for _ in 0..10 {
            model.add_household(draw(0.5)).unwrap();
        }
        model.step();

        assert_eq!(model.reference_wage, FALLBACK_REFERENCE_WAGE);
        assert_eq!(model.aggregates.employment_total, 0);
        assert_eq!(model.aggregates.unemployment_rate, 1.0);
        assert_eq!(model.aggregates.market_hours_total, 0.0);
        assert_eq!(model.aggregates.i1, 0.0);
        assert_eq!(model.aggregates.i2, 0.0);
        // 10 households * (0.5 * 2000 / 5) domestic hours over 10 * 1000 budget
        assert_eq!(model.aggregates.i3, FrustrationIndex::Bounded(2000.0 / 10_000.0));
    }

    #[test]
    fn employed_households_use_their_employers_wage() {
        let mut model = two_firm_model(30);
        model.step();
        for h in &model.households {
            match h.employer {
                Some(id) => {
                    let wage = model.firms[id].wage;
                    assert_eq!(h.market_hours, 1.0);
                    assert_eq!(h.notional_labor_supply, 1000.0 / wage);
                }
                None => {
                    assert_eq!(h.market_hours, 0.0);
                    assert_eq!(h.notional_labor_supply, 1000.0 / 7.5);
                }
            }
        }
    }

    #[test]
    fn exhausted_time_budget_is_unbounded() {
        let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
        let mut model = Model::empty(gov, 2000.0, 3, NullSink).unwrap();
        model.add_firm(60.0, 10.0).unwrap();
        for _ in 0..5 {
            model.add_household(draw(1.0)).unwrap();
        }
        model.step();
        assert_eq!(model.aggregates.time_budget_total, 0.0);
        assert!(model.aggregates.i3.is_unbounded());
    }

    #[test]
    fn rejects_non_positive_time() {
        let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
        assert!(Model::empty(gov, 0.0, 1, NullSink).is_err());
    }
}
