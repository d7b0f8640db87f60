//! Aggregates yearly cash flows into a scenario result.

use chrono::Utc;
use tracing::debug;

use super::year::{compute_year, fleet_purchase_cost};
use super::{CostContext, RuleConstants, TcoEngine};
use crate::defaults::fleet_scale;
use crate::error::TcoError;
use crate::model::input::validate;
use crate::model::{
    AnnualCosts, CostBreakdown, CostCategory, EvidenceClassification, RuleConstantUsage,
    ScenarioType, TcoAssumptions, TcoInput, TcoResult,
};

impl TcoEngine {
    /// Costs one scenario over the planning horizon.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::Validation`] listing every out-of-range field.
    pub fn calculate_tco(&self, input: &TcoInput) -> Result<TcoResult, TcoError> {
        let parameters = self.defaults().resolve_parameters(&input.parameters);
        validate(&input.fleet, &input.location, &parameters)?;

        let assumptions =
            self.defaults()
                .resolve(&input.fleet, &input.location, &input.overrides);
        let eligibility = self.eligibility(&input.location.state_code());
        let total_buses = input.fleet.total_buses();
        let annual_miles_per_bus = input.fleet.annual_miles_per_bus();
        let scale = fleet_scale(total_buses);
        let ctx = CostContext {
            scenario: input.scenario_type,
            fleet: &input.fleet,
            assumptions: &assumptions,
            parameters: &parameters,
            rules: self.rules(),
            eligibility: &eligibility,
            total_buses,
            annual_miles_per_bus,
            fleet_scale: scale,
        };

        let horizon = parameters.planning_horizon_years;
        let mut annual_costs: Vec<AnnualCosts> = Vec::with_capacity(horizon as usize + 1);
        for year in 0..=horizon {
            let costs = compute_year(year, &ctx);
            let row = AnnualCosts::accumulate(costs, annual_costs.last(), parameters.discount_rate);
            annual_costs.push(row);
        }

        let total_tco: f64 = annual_costs.iter().map(|y| y.costs.total_cost).sum();
        let total_revenue: f64 = annual_costs.iter().map(|y| y.costs.total_revenue).sum();
        let total_external_costs: f64 = annual_costs
            .iter()
            .map(|y| y.costs.external_costs.total)
            .sum();
        let npv: f64 = annual_costs.iter().map(|y| y.npv_cost).sum();
        let npv_net_before_residual: f64 = annual_costs.iter().map(|y| y.npv_net_cost).sum();
        let npv_true: f64 = annual_costs.iter().map(|y| y.npv_true_cost).sum();

        let horizon_discount = (1.0 + parameters.discount_rate).powi(-(horizon as i32));
        let residual_value = fleet_purchase_cost(
            &input.fleet,
            &assumptions,
            input.scenario_type.is_electric(),
        ) * assumptions.lifecycle.residual_value_fraction.value
            * horizon_discount;

        let total_net_tco = total_tco - total_revenue - residual_value;
        let npv_net = npv_net_before_residual - residual_value;
        let total_miles = annual_miles_per_bus * f64::from(total_buses) * f64::from(horizon);
        let years = f64::from(horizon);

        let warnings = self.generate_warnings(input, &assumptions);
        let (evidence_strength, evidence_factors) = self.summarize_evidence(input, &assumptions);
        let breakdown = cost_breakdown(
            input.scenario_type,
            &annual_costs,
            total_tco,
            &assumptions,
            self.rules(),
        );

        debug!(
            scenario = %input.scenario_type,
            buses = total_buses,
            horizon,
            total_tco,
            total_net_tco,
            "scenario costed"
        );

        Ok(TcoResult {
            scenario_type: input.scenario_type,
            total_buses,
            annual_miles_per_bus,
            annual_costs,
            total_tco,
            total_revenue,
            residual_value,
            total_net_tco,
            total_external_costs,
            total_true_cost: total_net_tco + total_external_costs,
            npv,
            npv_net,
            npv_true_cost: npv_true - residual_value,
            average_annual_cost: total_tco / years,
            average_annual_net_cost: total_net_tco / years,
            cost_per_mile: total_tco / total_miles,
            net_cost_per_mile: total_net_tco / total_miles,
            true_cost_per_mile: (total_net_tco + total_external_costs) / total_miles,
            fleet_scale: scale,
            breakdown,
            warnings,
            evidence_strength,
            evidence_factors,
            assumptions,
            parameters,
            calculated_at: Utc::now().to_rfc3339(),
        })
    }
}

fn category(
    name: &str,
    amount: f64,
    total: f64,
    classification: EvidenceClassification,
    details: String,
) -> CostCategory {
    let percentage = if total == 0.0 { 0.0 } else { amount / total * 100.0 };
    CostCategory {
        category: name.into(),
        amount,
        percentage,
        classification,
        details,
    }
}

fn cost_breakdown(
    scenario: ScenarioType,
    years: &[AnnualCosts],
    total_tco: f64,
    a: &TcoAssumptions,
    rules: &RuleConstants,
) -> CostBreakdown {
    let sum = |f: fn(&AnnualCosts) -> f64| years.iter().map(f).sum::<f64>();
    let electric = scenario.is_electric();

    let (price_class, energy_class, energy_details) = match scenario {
        ScenarioType::DieselBaseline => (
            a.bus_prices.type_c.diesel.classification,
            a.diesel_price_per_gallon.classification,
            format!("Diesel at ${:.2}/gal", a.diesel_price_per_gallon.value),
        ),
        ScenarioType::MobileCharging => (
            a.bus_prices.type_c.electric.classification,
            a.mobile_charging.labor_kwh.classification,
            "Mobile-charging internal landed cost per kWh".to_string(),
        ),
        _ => (
            a.bus_prices.type_c.electric.classification,
            a.electricity_rate_kwh.classification,
            format!(
                "Grid energy at ${:.3}/kWh plus ${:.2}/kW-month demand",
                a.electricity_rate_kwh.value, a.demand_charge_kw.value
            ),
        ),
    };
    let maintenance = if electric {
        &a.maintenance_per_mile.electric
    } else {
        &a.maintenance_per_mile.diesel
    };

    let mut categories = vec![
        category(
            "Capital (Vehicles)",
            sum(|y| y.costs.capital_cost),
            total_tco,
            price_class,
            if electric {
                "Bus purchase and battery replacement".into()
            } else {
                "Bus purchase".into()
            },
        ),
        category(
            "Energy",
            sum(|y| y.costs.energy_cost),
            total_tco,
            energy_class,
            energy_details,
        ),
        category(
            "Maintenance",
            sum(|y| y.costs.maintenance_cost),
            total_tco,
            maintenance.classification,
            format!("${:.2}/mile", maintenance.value),
        ),
        category(
            "Insurance",
            sum(|y| y.costs.insurance_cost),
            total_tco,
            EvidenceClassification::Assumed,
            "Fleet value times insurance rate".into(),
        ),
    ];
    if electric {
        categories.push(category(
            "Infrastructure",
            sum(|y| y.costs.infrastructure_cost),
            total_tco,
            a.installation_cost_per_charger.classification,
            if scenario == ScenarioType::MobileCharging {
                format!(
                    "{:.0}% of a full depot build-out",
                    a.mobile_charging.depot_infrastructure_fraction.value * 100.0
                )
            } else {
                "Depot chargers and installation".into()
            },
        ));
        categories.push(category(
            "Incentives (Credit)",
            -sum(|y| y.costs.incentives_applied),
            total_tco,
            a.incentives.federal_per_bus.classification,
            "Federal and state purchase incentives".into(),
        ));
    }

    let constant = |name: &str, value: f64, applies_to: &str| RuleConstantUsage {
        name: name.into(),
        value,
        applies_to: applies_to.into(),
    };
    let mut rule_constants = vec![
        constant("insurance_rate", rules.insurance_rate, "Insurance"),
        constant(
            "months_per_year",
            12.0,
            "Demand charge annualisation",
        ),
    ];
    if electric {
        rule_constants.extend([
            constant("ev_insurance_premium", rules.ev_insurance_premium, "Insurance"),
            constant(
                "buses_per_charger",
                f64::from(rules.buses_per_charger),
                "Infrastructure",
            ),
            constant("dcfc_share", rules.dcfc_share, "Infrastructure"),
        ]);
        if scenario != ScenarioType::MobileCharging {
            rule_constants.extend([
                constant(
                    "simultaneous_charging_fraction",
                    rules.simultaneous_charging_fraction,
                    "Energy (demand charge)",
                ),
                constant("charger_power_kw", rules.charger_power_kw, "Energy (demand charge)"),
            ]);
        }
    }

    CostBreakdown {
        categories,
        rule_constants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FleetProfile, LocationProfile};

    fn input(scenario_type: ScenarioType) -> TcoInput {
        TcoInput {
            scenario_type,
            fleet: FleetProfile {
                type_c_count: 25,
                ..FleetProfile::default()
            },
            location: LocationProfile::default(),
            parameters: Default::default(),
            overrides: Default::default(),
        }
    }

    #[test]
    fn horizon_produces_year_zero_through_horizon() {
        let result = TcoEngine::default()
            .calculate_tco(&input(ScenarioType::DieselBaseline))
            .expect("valid input");
        assert_eq!(result.annual_costs.len(), 13);
        assert_eq!(result.annual_costs[0].costs.year, 0);
        assert_eq!(result.annual_costs[12].costs.year, 12);
        assert_eq!(result.annual_miles_per_bus, 10_800.0);
    }

    #[test]
    fn net_tco_identity_holds_exactly() {
        let result = TcoEngine::default()
            .calculate_tco(&input(ScenarioType::MobileCharging))
            .expect("valid input");
        assert_eq!(
            result.total_net_tco,
            result.total_tco - result.total_revenue - result.residual_value
        );
        let last = result.annual_costs.last().expect("non-empty");
        assert!((last.cumulative_cost - result.total_tco).abs() < 1e-6);
    }

    #[test]
    fn residual_value_is_discounted_purchase_share() {
        let result = TcoEngine::default()
            .calculate_tco(&input(ScenarioType::DieselBaseline))
            .expect("valid input");
        let expected = 25.0 * 110_000.0 * 0.10 * 1.05_f64.powi(-12);
        assert!((result.residual_value - expected).abs() < 1e-6);
    }

    #[test]
    fn breakdown_lists_credit_as_negative_and_rules_separately() {
        let result = TcoEngine::default()
            .calculate_tco(&input(ScenarioType::SelfManagedEv))
            .expect("valid input");
        let credit = result
            .breakdown
            .categories
            .iter()
            .find(|c| c.category == "Incentives (Credit)")
            .expect("credit line");
        assert_eq!(credit.amount, -25.0 * 250_000.0);
        let total: f64 = result.breakdown.categories.iter().map(|c| c.amount).sum();
        assert!((total - result.total_tco).abs() < 1e-3);
        assert!(
            result
                .breakdown
                .rule_constants
                .iter()
                .any(|r| r.name == "simultaneous_charging_fraction" && r.value == 0.40)
        );
    }

    #[test]
    fn padded_and_lowercase_state_codes_cost_identically() {
        let engine = TcoEngine::default();
        let costed = |state: &str| {
            let mut input = input(ScenarioType::MobileCharging);
            input.location.state = state.into();
            engine.calculate_tco(&input).expect("valid input")
        };
        for (canonical, variants) in [("CA", ["CA ", " ca"]), ("VA", ["va", "\tVa "])] {
            let expected = costed(canonical);
            for variant in variants {
                let result = costed(variant);
                assert_eq!(result.total_net_tco, expected.total_net_tco, "{variant:?}");
                assert_eq!(result.total_revenue, expected.total_revenue, "{variant:?}");
                let ids = |r: &TcoResult| r.warnings.iter().map(|w| w.id.clone()).collect::<Vec<_>>();
                assert_eq!(ids(&result), ids(&expected), "{variant:?}");
            }
        }
    }

    #[test]
    fn huge_bus_counts_are_a_validation_error() {
        let mut bad = input(ScenarioType::SelfManagedEv);
        bad.fleet.type_a_count = u32::MAX;
        bad.fleet.type_c_count = u32::MAX;
        match TcoEngine::default().calculate_tco(&bad) {
            Err(TcoError::Validation(errors)) => assert!(errors.mentions("fleet.type_a_count")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_input_is_rejected_before_costing() {
        let mut bad = input(ScenarioType::DieselBaseline);
        bad.fleet.avg_daily_miles = 900.0;
        bad.location.state = "T".into();
        match TcoEngine::default().calculate_tco(&bad) {
            Err(TcoError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
