mod common;

use fleet_tco::engine::payback_years;
use fleet_tco::model::{FleetProfile, ParameterOverrides, ScenarioType, TcoInput, TcoResult};
use fleet_tco::{calculate_tco, compare_scenarios};
use proptest::prelude::*;

const STATES: [&str; 6] = ["TX", "CA", "MN", "VA", "NY", "AZ"];

fn input(
    scenario: usize,
    counts: (u32, u32, u32),
    miles: f64,
    days: f64,
    state: usize,
    horizon: u32,
) -> TcoInput {
    TcoInput {
        scenario_type: ScenarioType::ALL[scenario],
        fleet: FleetProfile {
            type_a_count: counts.0,
            type_c_count: counts.1,
            type_d_count: counts.2,
            avg_daily_miles: miles,
            operating_days_per_year: days,
            ..FleetProfile::default()
        },
        location: common::location(STATES[state]),
        parameters: ParameterOverrides {
            planning_horizon_years: Some(horizon),
            ..ParameterOverrides::default()
        },
        overrides: Default::default(),
    }
}

fn energy_cost(r: &TcoResult) -> f64 {
    r.annual_costs.iter().map(|y| y.costs.energy_cost).sum()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn net_identity_and_horizon_length(
        scenario in 0usize..4,
        a in 0u32..30, c in 0u32..80, d in 0u32..30,
        miles in 0.0f64..300.0,
        days in 0.0f64..365.0,
        state in 0usize..6,
        horizon in 1u32..=30,
    ) {
        let r = calculate_tco(&input(scenario, (a, c, d), miles, days, state, horizon)).unwrap();
        prop_assert_eq!(r.total_net_tco, r.total_tco - r.total_revenue - r.residual_value);
        prop_assert_eq!(r.annual_costs.len(), horizon as usize + 1);
        prop_assert_eq!(r.annual_costs[0].costs.year, 0);
    }

    #[test]
    fn recalculation_is_stable(
        scenario in 0usize..4,
        c in 1u32..120,
        state in 0usize..6,
    ) {
        let i = input(scenario, (0, c, 0), 60.0, 180.0, state, 12);
        let first = calculate_tco(&i).unwrap();
        let second = calculate_tco(&i).unwrap();
        prop_assert_eq!(first.total_net_tco, second.total_net_tco);
        prop_assert_eq!(first.npv_net, second.npv_net);
        prop_assert_eq!(&first.warnings, &second.warnings);
    }

    #[test]
    fn diesel_cost_never_falls_with_more_miles(
        c in 0u32..80,
        miles in 0.0f64..250.0,
        extra in 0.0f64..50.0,
        state in 0usize..6,
    ) {
        let lo = calculate_tco(&input(0, (0, c, 0), miles, 180.0, state, 12)).unwrap();
        let hi = calculate_tco(&input(0, (0, c, 0), miles + extra, 180.0, state, 12)).unwrap();
        prop_assert!(hi.total_net_tco >= lo.total_net_tco);
    }

    #[test]
    fn energy_cost_rises_with_daily_miles(
        scenario in 0usize..4,
        c in 1u32..80,
        miles in 0.0f64..250.0,
        extra in 1.0f64..50.0,
        days in 30.0f64..365.0,
        state in 0usize..6,
    ) {
        let lo = calculate_tco(&input(scenario, (0, c, 0), miles, days, state, 12)).unwrap();
        let hi = calculate_tco(&input(scenario, (0, c, 0), miles + extra, days, state, 12)).unwrap();
        prop_assert!(
            energy_cost(&hi) > energy_cost(&lo),
            "{}: {} -> {}", ScenarioType::ALL[scenario], energy_cost(&lo), energy_cost(&hi)
        );
    }

    #[test]
    fn higher_discount_rate_discounts_more(
        scenario in 0usize..4,
        c in 1u32..80,
        rate in 0.0f64..0.15,
        step in 0.005f64..0.05,
        state in 0usize..6,
        horizon in 1u32..=30,
    ) {
        let with_rate = |r: f64| {
            let mut i = input(scenario, (0, c, 0), 60.0, 180.0, state, horizon);
            i.parameters.discount_rate = Some(r);
            calculate_tco(&i).unwrap()
        };
        let lo = with_rate(rate);
        let hi = with_rate(rate + step);
        prop_assert_eq!(hi.total_tco, lo.total_tco);
        prop_assert!(hi.npv < lo.npv, "{}: {} -> {}", ScenarioType::ALL[scenario], lo.npv, hi.npv);
        prop_assert!(hi.total_tco - hi.npv > lo.total_tco - lo.npv);
    }

    #[test]
    fn payback_is_positive_when_reached(
        c in 1u32..150,
        miles in 10.0f64..200.0,
        state in 0usize..6,
    ) {
        let mut cmp_input = common::comparison_in(STATES[state]);
        cmp_input.fleet.type_c_count = c;
        cmp_input.fleet.avg_daily_miles = miles;
        let cmp = compare_scenarios(&cmp_input).unwrap();
        for alt in [&cmp.self_managed, &cmp.eaas, &cmp.mobile_charging] {
            if let Some(years) = payback_years(&cmp.diesel, alt) {
                prop_assert!(years > 0.0);
                prop_assert!(years <= 12.0);
            }
        }
    }
}

#[test]
fn empty_fleet_costs_without_error() {
    for (idx, t) in ScenarioType::ALL.into_iter().enumerate() {
        let r = calculate_tco(&input(idx, (0, 0, 0), 60.0, 180.0, 0, 12)).expect("valid");
        assert_eq!(r.total_buses, 0);
        assert!(!r.cost_per_mile.is_finite(), "{t}");
    }
}
