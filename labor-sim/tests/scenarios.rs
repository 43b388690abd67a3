//! Hand-computed scenarios run end to end.

use labor_sim::analytic::{self, BaselineParams};
use labor_sim::{
    FALLBACK_REFERENCE_WAGE, FrustrationIndex, Government, HouseholdDraw, Model, ModelConfig,
    NullSink, SimError, TickMetrics,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn uniform_household(domestic_productivity: f64, consumption_desire: f64) -> HouseholdDraw {
    HouseholdDraw {
        domestic_productivity,
        consumption_desire,
        time_use_intensity: 1.0,
        time_use_incompatibility: 1.0,
    }
}

#[test]
fn two_firms_thirty_households() {
    // G=1000 split evenly: firm A demands 500/(60-10)=10, firm B 500/(40-5)=14.29
    let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
    let mut model = Model::empty(gov, 2000.0, 11, Vec::new()).unwrap();
    let a = model.add_firm(60.0, 10.0).unwrap();
    let b = model.add_firm(40.0, 5.0).unwrap();
    for _ in 0..30 {
        model.add_household(uniform_household(5.0, 0.5)).unwrap();
    }

    let metrics = model.run(4);

    assert_eq!(model.firms[a].hired_count, 10);
    assert_eq!(model.firms[b].hired_count, 14);
    assert_eq!(metrics.employment_total, 24);
    assert!(close(metrics.unemployment_rate, 0.2));

    // Every tick redoes the same arithmetic
    let history: Vec<TickMetrics> = model.into_sink();
    assert!(history.iter().all(|m| m.employment_total == 24));
}

#[test]
fn huge_public_spending_employs_everyone() {
    let gov = Government::new(1e30, 0.0, 1.0).unwrap();
    let mut model = Model::empty(gov, 2000.0, 11, NullSink).unwrap();
    model.add_firm(60.0, 10.0).unwrap();
    model.add_firm(40.0, 5.0).unwrap();
    for _ in 0..10 {
        model.add_household(uniform_household(5.0, 0.5)).unwrap();
    }

    let metrics = model.run(1);

    assert_eq!(metrics.employment_total, 10);
    assert_eq!(metrics.unemployment_rate, 0.0);
    assert_eq!(model.last_match.unfilled(), usize::MAX - 10);
}

#[test]
fn no_firms_means_full_unemployment() {
    let gov = Government::new(1000.0, 0.3, 8.0).unwrap();
    let mut model = Model::empty(gov, 2000.0, 5, NullSink).unwrap();
    for _ in 0..25 {
        model.add_household(uniform_household(4.0, 0.6)).unwrap();
    }

    let metrics = model.run(2);

    assert_eq!(metrics.employment_total, 0);
    assert_eq!(metrics.unemployment_rate, 1.0);
    assert_eq!(metrics.i1, 0.0);
    assert_eq!(metrics.i2, 0.0);
    assert_eq!(model.reference_wage, FALLBACK_REFERENCE_WAGE);
    for h in &model.households {
        // c*T / fallback wage
        assert!(close(h.notional_labor_supply, 1200.0));
        assert!(close(h.extramarket_hours, 300.0));
    }
    // 300 labor hours against a 2000*(1-0.6) budget, per household
    assert!(close(metrics.i3.value().unwrap(), 300.0 / 800.0));
}

#[test]
fn empty_economy_reports_zero_unemployment() {
    let gov = Government::new(1000.0, 0.0, 1.0).unwrap();
    let mut model = Model::empty(gov, 2000.0, 5, NullSink).unwrap();
    let metrics = model.run(1);
    assert_eq!(metrics.employment_total, 0);
    assert_eq!(metrics.unemployment_rate, 0.0);
    assert_eq!(metrics.i3, FrustrationIndex::Unbounded);
}

#[test]
fn textbook_preset_hires_rounded_demand() {
    let config = ModelConfig::textbook();
    let mut model = Model::with_sink(&config, NullSink).unwrap();
    let metrics = model.run(1);

    // L = 500 / (50 - 10) = 12.5, which rounds half away from zero
    let firm = model.firms.values().next().unwrap();
    assert!(close(firm.labor_demand, 12.5));
    assert_eq!(metrics.employment_total, 13);
    assert!(close(metrics.unemployment_rate, 0.87));

    // Employed: (1600 - 10) / 5 = 318 domestic hours. Unemployed: 1600 / 5 = 320
    let market = 13.0;
    let domestic = 13.0 * 318.0 + 87.0 * 320.0;
    assert!(close(model.aggregates.market_hours_total, market));
    assert!(close(model.aggregates.extramarket_hours_total, domestic));
    assert!(close(metrics.i2, market / (market + domestic)));
    // Each household wants the full c*T, not a 1/N share of it
    assert!(
        model
            .households
            .iter()
            .all(|h| close(h.desired_consumption(config.total_available_time), 1600.0))
    );
    // Notional supply is c*T / 10 = 160 for every household
    assert!(close(metrics.i1, market / (100.0 * 160.0)));
}

#[test]
fn agent_hours_match_the_closed_form_per_firm() {
    // With one firm the market hours hired equal the analytic L up to rounding
    let config = ModelConfig::textbook();
    let baseline = analytic::solve(&BaselineParams::default()).unwrap();

    let mut model = Model::with_sink(&config, NullSink).unwrap();
    model.step();

    let hired = model.aggregates.market_hours_total;
    assert!((hired - baseline.market_hours).abs() <= 0.5 + 1e-9);

    // An unemployed household's domestic hours match the no-wage version of L_b
    let unemployed = model
        .households
        .iter()
        .find(|h| !h.is_employed())
        .unwrap();
    assert!(close(
        unemployed.extramarket_hours,
        baseline.desired_consumption / 5.0
    ));
}

#[test]
fn degenerate_calibration_is_an_error() {
    let config = ModelConfig {
        firm_productivity: labor_sim::NormalParams::fixed(2.0),
        ..ModelConfig::textbook()
    };
    // Wage clamps to 1.0, margin 1.0 survives
    assert!(Model::with_sink(&config, NullSink).is_ok());

    let config = ModelConfig {
        firm_productivity: labor_sim::NormalParams::fixed(1.0),
        ..ModelConfig::textbook()
    };
    assert!(matches!(
        Model::with_sink(&config, NullSink),
        Err(SimError::DegenerateMarket { .. })
    ));
}

#[test]
fn json_config_fills_defaults() {
    let config = ModelConfig::from_json(r#"{"household_count": 40, "firm_count": 2, "seed": 3}"#)
        .unwrap();
    assert_eq!(config.household_count, 40);
    assert_eq!(config.public_spending, ModelConfig::default().public_spending);

    let mut model = Model::with_sink(&config, NullSink).unwrap();
    let metrics = model.run(1);
    assert!(metrics.employment_total <= 40);
}

#[test]
fn invalid_json_config_is_rejected() {
    assert!(matches!(
        ModelConfig::from_json(r#"{"tax_rate": 1.5}"#),
        Err(SimError::InvalidConfig(_))
    ));
    assert!(matches!(
        ModelConfig::from_json("not json"),
        Err(SimError::Json(_))
    ));
}
