//! Cash flows for a single planning year.

use super::{CostContext, RuleConstants};
use crate::model::assumptions::ByBusType;
use crate::model::{ExternalCosts, FleetProfile, ScenarioType, TcoAssumptions, YearCosts};

const MONTHS_PER_YEAR: f64 = 12.0;

fn weighted(fleet: &FleetProfile, values: &ByBusType<f64>) -> f64 {
    f64::from(fleet.type_a_count) * values.type_a
        + f64::from(fleet.type_c_count) * values.type_c
        + f64::from(fleet.type_d_count) * values.type_d
}

/// Fleet-average of a per-bus-type value; Type C when the fleet is empty.
fn blended(fleet: &FleetProfile, values: ByBusType<f64>) -> f64 {
    let total = fleet.total_buses();
    if total == 0 {
        values.type_c
    } else {
        weighted(fleet, &values) / f64::from(total)
    }
}

/// Purchase cost of the whole fleet on the given drivetrain.
pub fn fleet_purchase_cost(fleet: &FleetProfile, assumptions: &TcoAssumptions, electric: bool) -> f64 {
    weighted(fleet, &assumptions.prices_for(electric))
}

/// Full district depot build-out: chargers plus installation.
///
/// One charger per `buses_per_charger` buses, rounded up; the DC fast share
/// is what remains after flooring the Level 2 count.
pub fn infrastructure_buildout(total_buses: u32, assumptions: &TcoAssumptions, rules: &RuleConstants) -> f64 {
    let per = rules.buses_per_charger.max(1);
    let chargers = total_buses.div_ceil(per);
    let level2 = (f64::from(chargers) * (1.0 - rules.dcfc_share)).floor();
    let dcfc = f64::from(chargers) - level2;
    level2 * assumptions.charger_cost_level2.value
        + dcfc * assumptions.charger_cost_dcfc.value
        + f64::from(chargers) * assumptions.installation_cost_per_charger.value
}

fn diesel_energy(ctx: &CostContext<'_>, fleet_miles: f64, year: u32) -> f64 {
    let a = ctx.assumptions;
    let mpg = blended(
        ctx.fleet,
        ByBusType {
            type_a: a.diesel_mpg.type_a.value,
            type_c: a.diesel_mpg.type_c.value,
            type_d: a.diesel_mpg.type_d.value,
        },
    );
    let escalation = (1.0 + ctx.parameters.diesel_escalation_rate).powi(year as i32);
    fleet_miles / mpg * a.diesel_price_per_gallon.value * escalation
}

fn electric_kwh(ctx: &CostContext<'_>, fleet_miles: f64) -> f64 {
    let a = ctx.assumptions;
    let per_mile = blended(
        ctx.fleet,
        ByBusType {
            type_a: a.ev_kwh_per_mile.type_a.value,
            type_c: a.ev_kwh_per_mile.type_c.value,
            type_d: a.ev_kwh_per_mile.type_d.value,
        },
    );
    fleet_miles * per_mile * (1.0 + a.weather_derating.value)
}

/// Mobile-charging landed cost per kWh delivered.
pub(crate) fn mobile_landed_cost(ctx: &CostContext<'_>) -> f64 {
    let m = &ctx.assumptions.mobile_charging;
    let procurement = if ctx.eligibility.landfill_gas_ppa.applicable {
        m.ppa_rate_kwh.value
    } else {
        m.utility_rate_kwh.value
    };
    procurement
        + m.truck_energy_kwh.value
        + m.labor_kwh.value
        + m.depreciation_kwh.value
        + m.maintenance_kwh.value
}

fn electric_energy(ctx: &CostContext<'_>, fleet_miles: f64, year: u32) -> f64 {
    let a = ctx.assumptions;
    let kwh = electric_kwh(ctx, fleet_miles);
    let escalation = (1.0 + ctx.parameters.electricity_escalation_rate).powi(year as i32);
    match ctx.scenario {
        ScenarioType::MobileCharging => kwh * mobile_landed_cost(ctx) * escalation,
        _ => {
            let peak_kw = f64::from(ctx.total_buses)
                * ctx.rules.simultaneous_charging_fraction
                * ctx.rules.charger_power_kw;
            let demand = peak_kw * a.demand_charge_kw.value * MONTHS_PER_YEAR;
            (kwh * a.electricity_rate_kwh.value + demand) * escalation
        }
    }
}

fn year_zero(ctx: &CostContext<'_>) -> YearCosts {
    let a = ctx.assumptions;
    let electric = ctx.scenario.is_electric();
    let buses = f64::from(ctx.total_buses);

    let capital_cost = fleet_purchase_cost(ctx.fleet, a, electric);
    let (infrastructure_cost, incentives_applied) = if electric {
        let mut infra =
            infrastructure_buildout(ctx.total_buses, a, ctx.rules) * ctx.fleet_scale.cost_multiplier;
        if ctx.scenario == ScenarioType::MobileCharging {
            infra *= a.mobile_charging.depot_infrastructure_fraction.value;
        }
        let federal = if ctx.eligibility.federal_incentive.applicable {
            a.incentives.federal_per_bus.value
        } else {
            0.0
        };
        (infra, (federal + a.incentives.state_per_bus.value) * buses)
    } else {
        (0.0, 0.0)
    };

    let total_cost = capital_cost + infrastructure_cost - incentives_applied;
    YearCosts {
        year: 0,
        capital_cost,
        infrastructure_cost,
        incentives_applied,
        total_cost,
        total_true_cost: total_cost,
        net_cost: total_cost,
        true_net_cost: total_cost,
        ..YearCosts::default()
    }
}

/// Costs, revenue, and externalities of `year` (0 = acquisition year).
pub fn compute_year(year: u32, ctx: &CostContext<'_>) -> YearCosts {
    if year == 0 {
        return year_zero(ctx);
    }

    let a = ctx.assumptions;
    let p = ctx.parameters;
    let electric = ctx.scenario.is_electric();
    let buses = f64::from(ctx.total_buses);
    let fleet_miles = ctx.annual_miles_per_bus * buses;
    let inflation = (1.0 + p.inflation_rate).powi(year as i32);

    let replacement_year = a.lifecycle.battery_replacement_year.value.round();
    let capital_cost = if electric && f64::from(year) == replacement_year {
        a.lifecycle.battery_replacement_cost.value * buses
    } else {
        0.0
    };

    let energy_cost = if electric {
        electric_energy(ctx, fleet_miles, year)
    } else {
        diesel_energy(ctx, fleet_miles, year)
    };

    let maintenance_rate = if electric {
        a.maintenance_per_mile.electric.value
    } else {
        a.maintenance_per_mile.diesel.value
    };
    let maintenance_cost = maintenance_rate * fleet_miles * inflation * ctx.fleet_scale.cost_multiplier;

    let fleet_value = fleet_purchase_cost(ctx.fleet, a, electric);
    let premium = if electric {
        ctx.rules.ev_insurance_premium
    } else {
        1.0
    };
    let insurance_cost = fleet_value * ctx.rules.insurance_rate * premium * inflation;

    let (carbon_credit_revenue, v2g_revenue) = if electric {
        let capture = a.revenue_capture_rate.value * ctx.fleet_scale.revenue_multiplier;
        let lcfs = if ctx.eligibility.lcfs.applicable {
            a.carbon_credits.lcfs_per_bus.value
        } else {
            0.0
        };
        let federal = if ctx.eligibility.federal_carbon.applicable {
            a.carbon_credits.federal_per_bus.value
        } else {
            0.0
        };
        let v2g = if ctx.eligibility.v2g.applicable {
            a.v2g.demand_response_per_bus.value
                + a.v2g.frequency_regulation_per_bus.value
                + a.v2g.vpp_per_bus.value
        } else {
            0.0
        };
        ((lcfs + federal) * buses * capture, v2g * buses * capture)
    } else {
        (0.0, 0.0)
    };
    let total_revenue = carbon_credit_revenue + v2g_revenue;

    let external_costs = if electric {
        ExternalCosts::default()
    } else {
        let rates = &a.external_costs;
        let scale = buses * inflation;
        let health = rates.health() * scale;
        let climate = rates.climate() * scale;
        let regulatory = rates.regulatory() * scale;
        let operational_risk = rates.operational_risk() * scale;
        ExternalCosts {
            health,
            climate,
            regulatory,
            operational_risk,
            total: health + climate + regulatory + operational_risk,
        }
    };

    let total_cost = capital_cost + energy_cost + maintenance_cost + insurance_cost;
    let net_cost = total_cost - total_revenue;
    YearCosts {
        year,
        capital_cost,
        energy_cost,
        maintenance_cost,
        infrastructure_cost: 0.0,
        insurance_cost,
        incentives_applied: 0.0,
        carbon_credit_revenue,
        v2g_revenue,
        total_revenue,
        external_costs,
        total_cost,
        total_true_cost: total_cost + external_costs.total,
        net_cost,
        true_net_cost: net_cost + external_costs.total,
    }
}
