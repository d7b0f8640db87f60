mod common;

use fleet_tco::model::{DataPoint, EvidenceStrength, ScenarioType};
use fleet_tco::{TcoError, calculate_tco, compare_scenarios};

#[test]
fn every_scenario_costs_the_reference_fleet() {
    for t in ScenarioType::ALL {
        let r = calculate_tco(&common::texas(t)).expect("valid input");
        assert_eq!(r.scenario_type, t);
        assert_eq!(r.total_buses, 25);
        assert_eq!(r.annual_miles_per_bus, 10_800.0);
        assert_eq!(r.annual_costs.len(), 13, "years 0..=12");
        assert!(r.total_tco > 0.0);
        assert_eq!(
            r.total_net_tco,
            r.total_tco - r.total_revenue - r.residual_value,
            "{t}"
        );
    }
}

#[test]
fn cumulative_columns_are_running_sums() {
    let r = calculate_tco(&common::texas(ScenarioType::SelfManagedEv)).expect("valid");
    let mut running = 0.0;
    for y in &r.annual_costs {
        running += y.costs.total_cost;
        assert!((y.cumulative_cost - running).abs() < 1e-6);
    }
    let last = r.annual_costs.last().expect("non-empty");
    assert!((last.cumulative_cost - r.total_tco).abs() < 1e-6);
}

#[test]
fn diesel_carries_externalities_and_no_revenue() {
    let r = calculate_tco(&common::texas(ScenarioType::DieselBaseline)).expect("valid");
    assert_eq!(r.total_revenue, 0.0);
    assert!(r.total_external_costs > 0.0);
    assert!(r.warnings.is_empty());
    assert!(r.true_cost_per_mile > r.net_cost_per_mile);
}

#[test]
fn electric_scenarios_carry_no_externalities() {
    for t in [ScenarioType::SelfManagedEv, ScenarioType::Eaas, ScenarioType::MobileCharging] {
        let r = calculate_tco(&common::texas(t)).expect("valid");
        assert_eq!(r.total_external_costs, 0.0, "{t}");
        assert!(!r.warnings.is_empty(), "{t}");
    }
}

#[test]
fn lcfs_revenue_only_in_lcfs_states() {
    let tx = calculate_tco(&common::texas(ScenarioType::SelfManagedEv)).expect("valid");
    let ca = calculate_tco(&common::comparison_in("CA").for_scenario(ScenarioType::SelfManagedEv))
        .expect("valid");
    assert!(ca.total_revenue > tx.total_revenue);
    assert!(tx.warnings.iter().any(|w| w.id == "lcfs_not_applicable"));
    assert!(!ca.warnings.iter().any(|w| w.id == "lcfs_not_applicable"));
}

#[test]
fn cold_climate_raises_energy_cost() {
    let mut tx = common::texas(ScenarioType::SelfManagedEv);
    tx.overrides.electricity_rate_kwh = Some(DataPoint::user(0.12, "Tariff"));
    let mut mn = tx.clone();
    mn.location = common::location("MN");

    let tx = calculate_tco(&tx).expect("valid");
    let mn = calculate_tco(&mn).expect("valid");
    assert!(mn.annual_costs[1].costs.energy_cost > tx.annual_costs[1].costs.energy_cost);
    assert!(mn.warnings.iter().any(|w| w.id == "cold_weather_derating"));
}

#[test]
fn caller_overrides_win_over_location_defaults() {
    let mut input = common::texas(ScenarioType::DieselBaseline);
    input.fleet.diesel_price_per_gallon = Some(4.0);
    input.overrides.diesel_price_per_gallon = Some(DataPoint::user(5.0, "Fuel contract"));
    let r = calculate_tco(&input).expect("valid");
    assert_eq!(r.assumptions.diesel_price_per_gallon.value, 5.0);
    assert_eq!(r.assumptions.diesel_price_per_gallon.source, "Fuel contract");
}

#[test]
fn invalid_input_reports_every_field() {
    let mut input = common::texas(ScenarioType::Eaas);
    input.fleet.avg_daily_miles = 600.0;
    input.fleet.park_out_percentage = 150.0;
    input.parameters.planning_horizon_years = Some(40);
    match calculate_tco(&input) {
        Err(TcoError::Validation(errors)) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.mentions("fleet.avg_daily_miles"));
            assert!(errors.mentions("fleet.park_out_percentage"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(compare_scenarios(&input.without_scenario()).is_err());
}

#[test]
fn evidence_is_weaker_where_contingent_programs_stack() {
    let tx = calculate_tco(&common::texas(ScenarioType::MobileCharging)).expect("valid");
    let va = calculate_tco(&common::comparison_in("VA").for_scenario(ScenarioType::MobileCharging))
        .expect("valid");
    assert_eq!(tx.evidence_strength, EvidenceStrength::Medium);
    assert_eq!(va.evidence_strength, EvidenceStrength::Low);
}
