//! Shared fixtures for integration tests.
#![allow(dead_code)]

use fleet_tco::model::{
    ComparisonInput, FleetProfile, LocationProfile, ParameterOverrides, ScenarioType, TcoInput,
};

/// 25 Type C buses, 60 miles a day for 180 days.
pub fn type_c_fleet(count: u32) -> FleetProfile {
    FleetProfile {
        type_c_count: count,
        avg_daily_miles: 60.0,
        operating_days_per_year: 180.0,
        ..FleetProfile::default()
    }
}

pub fn location(state: &str) -> LocationProfile {
    LocationProfile {
        state: state.into(),
        ..LocationProfile::default()
    }
}

/// The reference request: 25 Type C buses in Texas, standard parameters.
pub fn texas_comparison() -> ComparisonInput {
    comparison_in("TX")
}

pub fn comparison_in(state: &str) -> ComparisonInput {
    ComparisonInput {
        fleet: type_c_fleet(25),
        location: location(state),
        parameters: ParameterOverrides::default(),
        overrides: Default::default(),
    }
}

pub fn texas(scenario_type: ScenarioType) -> TcoInput {
    texas_comparison().for_scenario(scenario_type)
}
