//! Year-by-year cost engine, scenario aggregation, and comparison.
//!
//! [`TcoEngine`] owns the injected [`Defaults`] and [`RuleConstants`]; every
//! analysis (warnings, evidence, stress, sensitivity) is a method on it so
//! they all share the same tables.

mod calculator;
mod compare;
mod year;

use serde::{Deserialize, Serialize};

use crate::defaults::{Defaults, ProgramJurisdictions};
use crate::model::{
    Applicability, AnalysisParameters, FleetProfile, FleetScaleAdjustment, ScenarioType,
    TcoAssumptions,
};

pub use compare::{ComparisonMetrics, ScenarioComparison, payback_years};
pub use year::{compute_year, fleet_purchase_cost, infrastructure_buildout};

/// Structural constants of the cost rules.
///
/// These are not assumptions about the world: they fix how the rules are
/// applied and are reported separately in every cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConstants {
    /// Share of the fleet charging at the same time at peak.
    pub simultaneous_charging_fraction: f64,
    /// Per-bus charging power at peak, kW.
    pub charger_power_kw: f64,
    /// Buses sharing one depot charger.
    pub buses_per_charger: u32,
    /// Share of depot chargers that are DC fast chargers.
    pub dcfc_share: f64,
    /// Annual insurance as a fraction of fleet purchase value.
    pub insurance_rate: f64,
    /// Insurance multiplier for electric buses.
    pub ev_insurance_premium: f64,
}

impl Default for RuleConstants {
    fn default() -> Self {
        Self {
            simultaneous_charging_fraction: 0.40,
            charger_power_kw: 19.2,
            buses_per_charger: 2,
            dcfc_share: 0.20,
            insurance_rate: 0.02,
            ev_insurance_premium: 1.10,
        }
    }
}

/// Program availability for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueEligibility {
    pub lcfs: Applicability,
    pub federal_carbon: Applicability,
    pub v2g: Applicability,
    pub federal_incentive: Applicability,
    pub landfill_gas_ppa: Applicability,
}

impl RevenueEligibility {
    pub fn for_state(programs: &ProgramJurisdictions, state: &str) -> Self {
        Self {
            lcfs: programs.lcfs.applies_to(state),
            federal_carbon: programs.federal_carbon.applies_to(state),
            v2g: programs.v2g.applies_to(state),
            federal_incentive: programs.federal_incentive.applies_to(state),
            landfill_gas_ppa: programs.landfill_gas_ppa.applies_to(state),
        }
    }
}

/// Everything [`compute_year`] needs, resolved once per scenario.
#[derive(Debug, Clone)]
pub struct CostContext<'a> {
    pub scenario: ScenarioType,
    pub fleet: &'a FleetProfile,
    pub assumptions: &'a TcoAssumptions,
    pub parameters: &'a AnalysisParameters,
    pub rules: &'a RuleConstants,
    pub eligibility: &'a RevenueEligibility,
    pub total_buses: u32,
    pub annual_miles_per_bus: f64,
    pub fleet_scale: FleetScaleAdjustment,
}

/// Stateless TCO calculator bound to a set of defaults.
#[derive(Debug, Clone, Default)]
pub struct TcoEngine {
    defaults: Defaults,
    rules: RuleConstants,
}

impl TcoEngine {
    pub fn new(defaults: Defaults, rules: RuleConstants) -> Self {
        Self { defaults, rules }
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn rules(&self) -> &RuleConstants {
        &self.rules
    }

    pub fn eligibility(&self, state: &str) -> RevenueEligibility {
        RevenueEligibility::for_state(&self.defaults.tables().programs, state)
    }
}
