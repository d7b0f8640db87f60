mod common;

use std::collections::HashSet;

use fleet_tco::engine::payback_years;
use fleet_tco::io::export::write_csv;
use fleet_tco::model::ScenarioType;
use fleet_tco::{calculate_tco, compare_scenarios};

#[test]
fn comparison_matches_individual_calculations() {
    let input = common::texas_comparison();
    let cmp = compare_scenarios(&input).expect("valid");
    for (r, t) in cmp.scenarios().into_iter().zip(ScenarioType::ALL) {
        assert_eq!(r.scenario_type, t);
        let single = calculate_tco(&input.for_scenario(t)).expect("valid");
        assert_eq!(r.total_net_tco, single.total_net_tco);
    }
}

#[test]
fn metrics_agree_with_results() {
    let cmp = compare_scenarios(&common::texas_comparison()).expect("valid");
    let lowest = cmp
        .scenarios()
        .into_iter()
        .min_by(|a, b| a.total_net_tco.total_cmp(&b.total_net_tco))
        .expect("four results");
    assert_eq!(cmp.metrics.lowest_net_tco, lowest.scenario_type);
    assert_eq!(
        cmp.metrics.mobile_savings_vs_diesel,
        cmp.diesel.total_net_tco - cmp.mobile_charging.total_net_tco
    );
    assert_eq!(
        cmp.metrics.mobile_savings_vs_self_managed,
        cmp.self_managed.total_net_tco - cmp.mobile_charging.total_net_tco
    );
    assert_eq!(
        cmp.metrics.payback_years_vs_diesel,
        payback_years(&cmp.diesel, &cmp.mobile_charging)
    );
}

#[test]
fn warnings_are_deduplicated_by_id() {
    let cmp = compare_scenarios(&common::texas_comparison()).expect("valid");
    let ids: Vec<&str> = cmp.warnings.iter().map(|w| w.id.as_str()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert!(unique.contains("lcfs_not_applicable"));
    assert!(unique.contains("mobile_infrastructure_contract"));
}

#[test]
fn csv_rows_follow_comparison_order() {
    let cmp = compare_scenarios(&common::texas_comparison()).expect("valid");
    let mut buf = Vec::new();
    write_csv(&cmp, &mut buf).expect("in-memory write");
    let text = String::from_utf8(buf).expect("utf8");
    let firsts: Vec<&str> = text
        .lines()
        .skip(1)
        .filter_map(|l| l.split(',').next())
        .collect();
    assert_eq!(
        firsts,
        vec!["DIESEL_BASELINE", "SELF_MANAGED_EV", "EAAS", "MOBILE_CHARGING"]
    );
}
