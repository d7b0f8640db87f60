//! TOML request files and built-in request presets.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::defaults::Defaults;
use crate::engine::{RuleConstants, TcoEngine};
use crate::error::TcoError;
use crate::model::{
    AssumptionOverrides, ComparisonInput, FleetProfile, LocationProfile, ParameterOverrides,
    ScenarioType, TcoInput,
};

/// A complete analysis request as read from TOML.
///
/// Every section is optional. Load with [`RequestConfig::from_toml_file`] or
/// pick a built-in with [`RequestConfig::from_preset`].
///
/// ```toml
/// scenario = "MOBILE_CHARGING"
///
/// [fleet]
/// type_c_count = 25
///
/// [location]
/// state = "TX"
///
/// [overrides]
/// diesel_price_per_gallon = 3.90
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConfig {
    /// Scenario for single-scenario commands; comparisons ignore it.
    pub scenario: Option<ScenarioType>,
    pub fleet: FleetProfile,
    pub location: LocationProfile,
    pub parameters: ParameterOverrides,
    /// Caller overrides; leaves accept a bare number or a full data point.
    pub overrides: AssumptionOverrides,
    /// Rule constants for the engine built by [`RequestConfig::engine`].
    pub rules: RuleConstants,
}

impl RequestConfig {
    /// 25 Type C buses in Texas on a typical 60-mile, 180-day route year.
    pub fn demo() -> Self {
        Self {
            scenario: Some(ScenarioType::MobileCharging),
            fleet: FleetProfile {
                type_c_count: 25,
                ..FleetProfile::default()
            },
            location: LocationProfile {
                state: "TX".into(),
                ..LocationProfile::default()
            },
            ..Self::default()
        }
    }

    /// A 120-bus mixed fleet in Minnesota: cold weather, large-fleet scale.
    pub fn northern_large() -> Self {
        Self {
            scenario: Some(ScenarioType::SelfManagedEv),
            fleet: FleetProfile {
                type_a_count: 20,
                type_c_count: 80,
                type_d_count: 20,
                avg_daily_miles: 70.0,
                operating_days_per_year: 175.0,
                park_out_percentage: 10.0,
                ..FleetProfile::default()
            },
            location: LocationProfile {
                state: "MN".into(),
                utility_name: Some("Xcel Energy".into()),
                ..LocationProfile::default()
            },
            ..Self::default()
        }
    }

    /// A 50-bus California district where LCFS credits apply.
    pub fn california() -> Self {
        Self {
            scenario: Some(ScenarioType::Eaas),
            fleet: FleetProfile {
                type_a_count: 10,
                type_c_count: 40,
                avg_daily_miles: 55.0,
                diesel_price_per_gallon: Some(4.95),
                ..FleetProfile::default()
            },
            location: LocationProfile {
                state: "CA".into(),
                utility_name: Some("PG&E".into()),
                demand_charge_kw: Some(22.0),
                ..LocationProfile::default()
            },
            ..Self::default()
        }
    }

    /// Names accepted by [`RequestConfig::from_preset`].
    pub const PRESETS: &[&str] = &["demo", "northern_large", "california"];

    /// # Errors
    ///
    /// [`TcoError::Config`] naming the available presets.
    pub fn from_preset(name: &str) -> Result<Self, TcoError> {
        match name {
            "demo" => Ok(Self::demo()),
            "northern_large" => Ok(Self::northern_large()),
            "california" => Ok(Self::california()),
            _ => Err(TcoError::Config {
                field: "preset".into(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// # Errors
    ///
    /// [`TcoError::Config`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, TcoError> {
        let content = fs::read_to_string(path).map_err(|e| TcoError::Config {
            field: "input".into(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// # Errors
    ///
    /// [`TcoError::Config`] carrying the TOML parser message.
    pub fn from_toml_str(s: &str) -> Result<Self, TcoError> {
        toml::from_str(s).map_err(|e| TcoError::Config {
            field: "toml".into(),
            message: e.to_string(),
        })
    }

    /// Engine with the standard defaults and this request's rule constants.
    pub fn engine(&self) -> TcoEngine {
        TcoEngine::new(Defaults::standard(), self.rules.clone())
    }

    /// Single-scenario input; `fallback` is used when no scenario is set.
    pub fn to_input(&self, fallback: ScenarioType) -> TcoInput {
        TcoInput {
            scenario_type: self.scenario.unwrap_or(fallback),
            fleet: self.fleet.clone(),
            location: self.location.clone(),
            parameters: self.parameters.clone(),
            overrides: self.overrides.clone(),
        }
    }

    pub fn to_comparison_input(&self) -> ComparisonInput {
        ComparisonInput {
            fleet: self.fleet.clone(),
            location: self.location.clone(),
            parameters: self.parameters.clone(),
            overrides: self.overrides.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid_requests() {
        for name in RequestConfig::PRESETS {
            let cfg = RequestConfig::from_preset(name).expect("known preset");
            let engine = cfg.engine();
            let result = engine.compare_scenarios(&cfg.to_comparison_input());
            assert!(result.is_ok(), "{name}: {result:?}");
        }
    }

    #[test]
    fn unknown_preset_lists_choices() {
        let err = RequestConfig::from_preset("nonexistent").expect_err("unknown");
        match err {
            TcoError::Config { field, message } => {
                assert_eq!(field, "preset");
                assert!(message.contains("unknown preset"));
                assert!(message.contains("northern_large"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_toml_is_default_request() {
        let cfg = RequestConfig::from_toml_str("").expect("empty is valid");
        assert_eq!(cfg, RequestConfig::default());
        assert_eq!(cfg.to_input(ScenarioType::DieselBaseline).scenario_type, ScenarioType::DieselBaseline);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = RequestConfig::from_toml_str(
            r#"
scenario = "SELF_MANAGED_EV"

[fleet]
type_c_count = 30
avg_daily_miles = 80.0

[location]
state = "CA"

[parameters]
planning_horizon_years = 15

[overrides]
diesel_price_per_gallon = 4.10

[overrides.incentives.state_per_bus]
value = 100000.0
classification = "CONTINGENT"
source = "HVIP voucher"

[rules]
insurance_rate = 0.025
"#,
        )
        .expect("valid toml");
        assert_eq!(cfg.scenario, Some(ScenarioType::SelfManagedEv));
        assert_eq!(cfg.fleet.type_c_count, 30);
        assert_eq!(cfg.fleet.operating_days_per_year, 180.0);
        assert_eq!(cfg.parameters.planning_horizon_years, Some(15));
        assert_eq!(cfg.parameters.discount_rate, None);
        let diesel = cfg.overrides.diesel_price_per_gallon.as_ref().expect("set");
        assert_eq!(diesel.value, 4.10);
        let state = cfg.overrides.incentives.state_per_bus.as_ref().expect("set");
        assert_eq!(state.source, "HVIP voucher");
        assert_eq!(cfg.rules.insurance_rate, 0.025);
        assert_eq!(cfg.rules.buses_per_charger, 2);

        let input = cfg.to_input(ScenarioType::DieselBaseline);
        assert_eq!(input.scenario_type, ScenarioType::SelfManagedEv);
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = RequestConfig::from_toml_str("[fleet]\nbogus = 1\n").expect_err("unknown field");
        assert!(matches!(err, TcoError::Config { ref field, .. } if field == "toml"));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = RequestConfig::from_toml_file(Path::new("/nonexistent/request.toml"))
            .expect_err("missing");
        assert!(err.to_string().contains("cannot read"));
    }
}
