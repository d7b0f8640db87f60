//! Caller-supplied request types and their validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::assumptions::AssumptionOverrides;
use crate::error::{FieldError, TcoError, ValidationErrors};

/// Procurement and charging model being costed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioType {
    /// Keep running diesel buses.
    DieselBaseline,
    /// District buys buses and builds its own depot charging.
    SelfManagedEv,
    /// Electrification-as-a-service contract.
    Eaas,
    /// Third-party mobile charging delivered to the depot and park-out sites.
    MobileCharging,
}

impl ScenarioType {
    /// Comparison order; diesel first, mobile charging last.
    pub const ALL: [ScenarioType; 4] = [
        Self::DieselBaseline,
        Self::SelfManagedEv,
        Self::Eaas,
        Self::MobileCharging,
    ];

    pub fn is_electric(self) -> bool {
        !matches!(self, Self::DieselBaseline)
    }

    /// Label used in reports and exports.
    pub fn label(self) -> &'static str {
        match self {
            Self::DieselBaseline => "Diesel",
            Self::SelfManagedEv => "Self-Managed EV",
            Self::Eaas => "EaaS",
            Self::MobileCharging => "Mobile Charging",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DieselBaseline => "DIESEL_BASELINE",
            Self::SelfManagedEv => "SELF_MANAGED_EV",
            Self::Eaas => "EAAS",
            Self::MobileCharging => "MOBILE_CHARGING",
        }
    }
}

impl fmt::Display for ScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioType {
    type Err = TcoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == norm)
            .ok_or_else(|| TcoError::Config {
                field: "scenario".into(),
                message: format!(
                    "unknown scenario `{s}` (expected one of: DIESEL_BASELINE, SELF_MANAGED_EV, EAAS, MOBILE_CHARGING)"
                ),
            })
    }
}

/// Fleet composition and duty cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetProfile {
    /// Small Type A buses.
    pub type_a_count: u32,
    /// Conventional Type C buses.
    pub type_c_count: u32,
    /// Transit-style Type D buses.
    pub type_d_count: u32,
    /// Route miles per bus per operating day (0–500).
    pub avg_daily_miles: f64,
    /// Operating days per year (0–365).
    pub operating_days_per_year: f64,
    /// Share of the fleet parked off-site overnight, in percent (0–100).
    pub park_out_percentage: f64,
    /// Fleet-specific diesel price in $/gal (0–20).
    pub diesel_price_per_gallon: Option<f64>,
    /// Fleet-wide measured fuel economy in MPG (2–20).
    pub avg_mpg: Option<f64>,
    /// Known diesel maintenance spend per bus per year.
    pub annual_maintenance_cost_per_bus: Option<f64>,
}

impl Default for FleetProfile {
    fn default() -> Self {
        Self {
            type_a_count: 0,
            type_c_count: 0,
            type_d_count: 0,
            avg_daily_miles: 60.0,
            operating_days_per_year: 180.0,
            park_out_percentage: 0.0,
            diesel_price_per_gallon: None,
            avg_mpg: None,
            annual_maintenance_cost_per_bus: None,
        }
    }
}

/// Upper bound on each bus-count field.
pub const MAX_BUSES_PER_TYPE: u32 = 100_000;

impl FleetProfile {
    /// Saturates rather than wrapping; validation rejects counts large
    /// enough to reach the limit.
    pub fn total_buses(&self) -> u32 {
        self.type_a_count
            .saturating_add(self.type_c_count)
            .saturating_add(self.type_d_count)
    }

    pub fn annual_miles_per_bus(&self) -> f64 {
        self.avg_daily_miles * self.operating_days_per_year
    }

    /// Fraction (0–1) of buses parked off-site.
    pub fn park_out_fraction(&self) -> f64 {
        self.park_out_percentage / 100.0
    }
}

/// Where the fleet operates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationProfile {
    /// Two-letter state code.
    pub state: String,
    pub utility_name: Option<String>,
    /// Known commercial electricity rate in $/kWh.
    pub electricity_rate_kwh: Option<f64>,
    /// Known demand charge in $/kW-month.
    pub demand_charge_kw: Option<f64>,
}

impl LocationProfile {
    /// The state code trimmed and uppercased, as every lookup expects it.
    pub fn state_code(&self) -> String {
        self.state.trim().to_ascii_uppercase()
    }
}

impl Default for LocationProfile {
    fn default() -> Self {
        Self {
            state: "TX".into(),
            utility_name: None,
            electricity_rate_kwh: None,
            demand_charge_kw: None,
        }
    }
}

/// Horizon and financial rates for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisParameters {
    pub planning_horizon_years: u32,
    pub discount_rate: f64,
    pub inflation_rate: f64,
    pub electricity_escalation_rate: f64,
    pub diesel_escalation_rate: f64,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            planning_horizon_years: 12,
            discount_rate: 0.05,
            inflation_rate: 0.025,
            electricity_escalation_rate: 0.02,
            diesel_escalation_rate: 0.03,
        }
    }
}

/// Partially specified analysis parameters; unset fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterOverrides {
    pub planning_horizon_years: Option<u32>,
    pub discount_rate: Option<f64>,
    pub inflation_rate: Option<f64>,
    pub electricity_escalation_rate: Option<f64>,
    pub diesel_escalation_rate: Option<f64>,
}

impl ParameterOverrides {
    /// Field-by-field merge onto `base`.
    pub fn apply_to(&self, base: &AnalysisParameters) -> AnalysisParameters {
        AnalysisParameters {
            planning_horizon_years: self.planning_horizon_years.unwrap_or(base.planning_horizon_years),
            discount_rate: self.discount_rate.unwrap_or(base.discount_rate),
            inflation_rate: self.inflation_rate.unwrap_or(base.inflation_rate),
            electricity_escalation_rate: self
                .electricity_escalation_rate
                .unwrap_or(base.electricity_escalation_rate),
            diesel_escalation_rate: self.diesel_escalation_rate.unwrap_or(base.diesel_escalation_rate),
        }
    }
}

/// Everything needed to cost one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TcoInput {
    pub scenario_type: ScenarioType,
    #[serde(default)]
    pub fleet: FleetProfile,
    #[serde(default)]
    pub location: LocationProfile,
    #[serde(default)]
    pub parameters: ParameterOverrides,
    #[serde(default)]
    pub overrides: AssumptionOverrides,
}

/// A [`TcoInput`] without a scenario; every scenario is costed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonInput {
    pub fleet: FleetProfile,
    pub location: LocationProfile,
    pub parameters: ParameterOverrides,
    pub overrides: AssumptionOverrides,
}

impl ComparisonInput {
    pub fn for_scenario(&self, scenario_type: ScenarioType) -> TcoInput {
        TcoInput {
            scenario_type,
            fleet: self.fleet.clone(),
            location: self.location.clone(),
            parameters: self.parameters.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

impl TcoInput {
    pub fn without_scenario(&self) -> ComparisonInput {
        ComparisonInput {
            fleet: self.fleet.clone(),
            location: self.location.clone(),
            parameters: self.parameters.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

fn check_range(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if !value.is_finite() || value < min || value > max {
        errors.push(FieldError::new(
            field,
            format!("must be between {min} and {max} (got {value})"),
        ));
    }
}

/// Checks fleet, location, and parameter bounds.
///
/// Collects every violation rather than stopping at the first so a caller
/// can fix the whole request in one pass.
pub fn validate(
    fleet: &FleetProfile,
    location: &LocationProfile,
    parameters: &AnalysisParameters,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    for (field, count) in [
        ("fleet.type_a_count", fleet.type_a_count),
        ("fleet.type_c_count", fleet.type_c_count),
        ("fleet.type_d_count", fleet.type_d_count),
    ] {
        if count > MAX_BUSES_PER_TYPE {
            errors.push(FieldError::new(
                field,
                format!("must be at most {MAX_BUSES_PER_TYPE} (got {count})"),
            ));
        }
    }
    check_range(&mut errors, "fleet.avg_daily_miles", fleet.avg_daily_miles, 0.0, 500.0);
    check_range(
        &mut errors,
        "fleet.operating_days_per_year",
        fleet.operating_days_per_year,
        0.0,
        365.0,
    );
    check_range(
        &mut errors,
        "fleet.park_out_percentage",
        fleet.park_out_percentage,
        0.0,
        100.0,
    );
    if let Some(price) = fleet.diesel_price_per_gallon {
        check_range(&mut errors, "fleet.diesel_price_per_gallon", price, 0.0, 20.0);
    }
    if let Some(mpg) = fleet.avg_mpg {
        check_range(&mut errors, "fleet.avg_mpg", mpg, 2.0, 20.0);
    }
    if let Some(cost) = fleet.annual_maintenance_cost_per_bus {
        if !cost.is_finite() || cost < 0.0 {
            errors.push(FieldError::new(
                "fleet.annual_maintenance_cost_per_bus",
                format!("must be non-negative (got {cost})"),
            ));
        }
    }

    let state = location.state_code();
    if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
        errors.push(FieldError::new(
            "location.state",
            format!("must be a two-letter state code (got `{}`)", location.state),
        ));
    }
    if let Some(rate) = location.electricity_rate_kwh {
        check_range(&mut errors, "location.electricity_rate_kwh", rate, 0.0, 2.0);
    }
    if let Some(rate) = location.demand_charge_kw {
        check_range(&mut errors, "location.demand_charge_kw", rate, 0.0, 200.0);
    }

    if !(1..=30).contains(&parameters.planning_horizon_years) {
        errors.push(FieldError::new(
            "parameters.planning_horizon_years",
            format!(
                "must be between 1 and 30 (got {})",
                parameters.planning_horizon_years
            ),
        ));
    }
    check_range(&mut errors, "parameters.discount_rate", parameters.discount_rate, 0.0, 0.20);
    check_range(&mut errors, "parameters.inflation_rate", parameters.inflation_rate, -0.05, 0.20);
    check_range(
        &mut errors,
        "parameters.electricity_escalation_rate",
        parameters.electricity_escalation_rate,
        -0.10,
        0.25,
    );
    check_range(
        &mut errors,
        "parameters.diesel_escalation_rate",
        parameters.diesel_escalation_rate,
        -0.10,
        0.25,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
