//! Built-in assumptions, state tables, and the layered merge.
//!
//! Everything here is immutable data handed to the engine at construction
//! time. Tests substitute their own [`LocationTables`] or base assumptions
//! through [`Defaults::new`].

use std::collections::{BTreeMap, BTreeSet};

use crate::model::assumptions::{
    ByBusType, ByFuel, CarbonCredits, ExternalCostRates, Incentives, Lifecycle,
    MobileChargingCosts, V2gRevenue,
};
use crate::model::{
    AnalysisParameters, AssumptionOverrides, DataPoint, FleetProfile, FleetScale,
    FleetScaleAdjustment, JurisdictionScope, LocationProfile, ParameterOverrides, TcoAssumptions,
};

const EIA_ELECTRIC_URL: &str = "https://www.eia.gov/electricity/monthly/epm_table_grapher.php?t=epmt_5_6_a";
const EIA_DIESEL_URL: &str = "https://www.eia.gov/petroleum/gasdiesel/";
const EPA_CSBP_URL: &str = "https://www.epa.gov/cleanschoolbus";
const CARB_LCFS_URL: &str = "https://ww2.arb.ca.gov/our-work/programs/low-carbon-fuel-standard";

/// Average commercial electricity rates by state, $/kWh.
const STATE_ELECTRICITY_RATES: &[(&str, f64)] = &[
    ("AL", 0.11), ("AK", 0.22), ("AZ", 0.12), ("AR", 0.10), ("CA", 0.20),
    ("CO", 0.12), ("CT", 0.21), ("DE", 0.12), ("FL", 0.12), ("GA", 0.11),
    ("HI", 0.33), ("ID", 0.09), ("IL", 0.11), ("IN", 0.11), ("IA", 0.11),
    ("KS", 0.12), ("KY", 0.10), ("LA", 0.09), ("ME", 0.16), ("MD", 0.13),
    ("MA", 0.22), ("MI", 0.13), ("MN", 0.12), ("MS", 0.10), ("MO", 0.11),
    ("MT", 0.11), ("NE", 0.10), ("NV", 0.11), ("NH", 0.19), ("NJ", 0.15),
    ("NM", 0.12), ("NY", 0.18), ("NC", 0.10), ("ND", 0.10), ("OH", 0.11),
    ("OK", 0.10), ("OR", 0.10), ("PA", 0.12), ("RI", 0.21), ("SC", 0.11),
    ("SD", 0.11), ("TN", 0.10), ("TX", 0.11), ("UT", 0.10), ("VT", 0.17),
    ("VA", 0.11), ("WA", 0.09), ("WV", 0.10), ("WI", 0.13), ("WY", 0.10),
    ("DC", 0.13),
];

/// States with published regional diesel prices, $/gal.
const STATE_DIESEL_PRICES: &[(&str, f64)] = &[
    ("CA", 4.80),
    ("NY", 4.20),
    ("TX", 3.20),
    ("FL", 3.40),
];

const COLD_WEATHER_STATES: &[&str] = &[
    "AK", "CO", "CT", "ID", "IL", "IN", "IA", "KS", "ME", "MA", "MI", "MN", "MT", "NE", "NH",
    "NY", "ND", "OH", "PA", "RI", "SD", "VT", "WI", "WY",
];

const LCFS_STATES: &[&str] = &["CA", "OR", "WA"];

/// States served by the PJM interconnection, where V2G market programs run.
const PJM_STATES: &[&str] = &[
    "DE", "IL", "IN", "KY", "MD", "MI", "NJ", "NC", "OH", "PA", "TN", "VA", "WV", "DC",
];

const LANDFILL_PPA_STATES: &[&str] = &["VA", "MD", "DC"];

/// Where each revenue or procurement program is available.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramJurisdictions {
    pub lcfs: JurisdictionScope,
    pub federal_carbon: JurisdictionScope,
    pub v2g: JurisdictionScope,
    pub federal_incentive: JurisdictionScope,
    pub landfill_gas_ppa: JurisdictionScope,
}

/// State-keyed lookup tables.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTables {
    pub electricity_rates: BTreeMap<String, f64>,
    pub diesel_prices: BTreeMap<String, f64>,
    /// Used when a state has no electricity entry.
    pub national_electricity_rate: f64,
    pub cold_weather_states: BTreeSet<String>,
    pub cold_weather_derating: f64,
    pub mild_weather_derating: f64,
    pub programs: ProgramJurisdictions,
}

impl LocationTables {
    pub fn standard() -> Self {
        Self {
            electricity_rates: STATE_ELECTRICITY_RATES
                .iter()
                .map(|(s, r)| ((*s).to_string(), *r))
                .collect(),
            diesel_prices: STATE_DIESEL_PRICES
                .iter()
                .map(|(s, p)| ((*s).to_string(), *p))
                .collect(),
            national_electricity_rate: 0.12,
            cold_weather_states: COLD_WEATHER_STATES.iter().map(|s| (*s).to_string()).collect(),
            cold_weather_derating: 0.30,
            mild_weather_derating: 0.10,
            programs: ProgramJurisdictions {
                lcfs: JurisdictionScope::state_specific(LCFS_STATES),
                federal_carbon: JurisdictionScope::Federal,
                v2g: JurisdictionScope::utility_specific(PJM_STATES),
                federal_incentive: JurisdictionScope::Federal,
                landfill_gas_ppa: JurisdictionScope::state_specific(LANDFILL_PPA_STATES),
            },
        }
    }
}

/// Built-in assumption values with their provenance.
pub fn standard_assumptions() -> TcoAssumptions {
    let price = |diesel: f64, electric: f64| ByFuel {
        diesel: DataPoint::assumed(diesel, "Industry average diesel school bus price"),
        electric: DataPoint::assumed(electric, "Industry average electric school bus price"),
    };
    let mpg = |v: f64| DataPoint::assumed(v, "Typical diesel school bus fuel economy");
    let kwh = |v: f64| DataPoint::assumed(v, "Typical electric school bus consumption");
    let mobile = |v: f64, what: &str| DataPoint::source_provided(v, format!("Mobile charging operator cost model: {what}"));
    let external = |v: f64, what: &str| DataPoint::assumed(v, format!("Societal cost estimate: {what}"));

    TcoAssumptions {
        bus_prices: ByBusType {
            type_a: price(90_000.0, 315_000.0),
            type_c: price(110_000.0, 395_000.0),
            type_d: price(140_000.0, 450_000.0),
        },
        diesel_price_per_gallon: DataPoint::verified(3.50, "EIA national average on-highway diesel")
            .with_url(EIA_DIESEL_URL)
            .as_of("2024-12-01"),
        electricity_rate_kwh: DataPoint::verified(0.12, "EIA national average commercial rate")
            .with_url(EIA_ELECTRIC_URL)
            .as_of("2024-12-01"),
        demand_charge_kw: DataPoint::assumed(15.0, "Typical commercial demand charge"),
        diesel_mpg: ByBusType {
            type_a: mpg(12.0),
            type_c: mpg(8.0),
            type_d: mpg(6.0),
        },
        ev_kwh_per_mile: ByBusType {
            type_a: kwh(1.2),
            type_c: kwh(1.8),
            type_d: kwh(2.2),
        },
        maintenance_per_mile: ByFuel {
            diesel: DataPoint::assumed(0.42, "Diesel school bus maintenance per mile"),
            electric: DataPoint::assumed(0.20, "Electric school bus maintenance per mile"),
        },
        charger_cost_level2: DataPoint::assumed(6_000.0, "Level 2 depot charger hardware"),
        charger_cost_dcfc: DataPoint::assumed(75_000.0, "DC fast charger hardware"),
        installation_cost_per_charger: DataPoint::assumed(15_000.0, "Charger installation and make-ready"),
        mobile_charging: MobileChargingCosts {
            ppa_rate_kwh: mobile(0.04, "landfill-gas PPA energy"),
            utility_rate_kwh: mobile(0.08, "utility C&I energy"),
            truck_energy_kwh: mobile(0.06, "delivery truck energy"),
            labor_kwh: mobile(0.08, "driver and technician labor"),
            depreciation_kwh: mobile(0.03, "truck and battery depreciation"),
            maintenance_kwh: mobile(0.03, "truck maintenance"),
            depot_infrastructure_fraction: DataPoint::assumed(
                0.15,
                "Depot make-ready retained under mobile charging",
            ),
        },
        carbon_credits: CarbonCredits {
            lcfs_per_bus: DataPoint::contingent(600.0, "LCFS credit value per electric school bus")
                .with_url(CARB_LCFS_URL),
            federal_per_bus: DataPoint::contingent(400.0, "Federal carbon-reduction credit per bus"),
        },
        v2g: V2gRevenue {
            demand_response_per_bus: DataPoint::contingent(300.0, "Utility demand response program"),
            frequency_regulation_per_bus: DataPoint::contingent(400.0, "ISO frequency regulation market"),
            vpp_per_bus: DataPoint::contingent(225.0, "Virtual power plant aggregation"),
        },
        revenue_capture_rate: DataPoint::assumed(0.70, "Share of nominal program revenue realised"),
        incentives: Incentives {
            federal_per_bus: DataPoint::contingent(250_000.0, "EPA Clean School Bus Program award")
                .with_url(EPA_CSBP_URL),
            state_per_bus: DataPoint::user(0.0, "No state incentive entered"),
        },
        lifecycle: Lifecycle {
            residual_value_fraction: DataPoint::assumed(0.10, "Resale value at end of horizon"),
            battery_replacement_year: DataPoint::assumed(8.0, "Typical battery warranty expiry"),
            battery_replacement_cost: DataPoint::assumed(50_000.0, "Battery pack replacement per bus"),
        },
        weather_derating: DataPoint::assumed(0.10, "Mild-climate range reduction"),
        external_costs: ExternalCostRates {
            child_respiratory: external(450.0, "child respiratory health"),
            community_health: external(280.0, "community health"),
            driver_exposure: external(120.0, "driver exhaust exposure"),
            co2_social_cost: external(780.0, "social cost of CO2"),
            methane_leakage: external(95.0, "methane leakage"),
            local_air_quality: external(185.0, "local air quality"),
            emission_compliance: external(320.0, "emission compliance"),
            future_regulation: external(200.0, "future regulation"),
            carbon_tax_exposure: external(150.0, "carbon tax exposure"),
            fuel_price_volatility: external(180.0, "fuel price volatility"),
            supply_chain_risk: external(85.0, "fuel supply chain"),
            reputational_risk: external(100.0, "reputational risk"),
        },
    }
}

/// Cost and revenue multipliers for a fleet of `total_buses`.
pub fn fleet_scale(total_buses: u32) -> FleetScaleAdjustment {
    match total_buses {
        0..40 => FleetScaleAdjustment {
            scale: FleetScale::Small,
            cost_multiplier: 1.15,
            revenue_multiplier: 0.8,
            break_even_reached: false,
        },
        40..100 => FleetScaleAdjustment {
            scale: FleetScale::Medium,
            cost_multiplier: 1.0,
            revenue_multiplier: 1.0,
            break_even_reached: true,
        },
        _ => FleetScaleAdjustment {
            scale: FleetScale::Large,
            cost_multiplier: 0.92,
            revenue_multiplier: 1.5,
            break_even_reached: true,
        },
    }
}

/// Immutable defaults injected into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    base: TcoAssumptions,
    parameters: AnalysisParameters,
    tables: LocationTables,
}

impl Default for Defaults {
    fn default() -> Self {
        Self::standard()
    }
}

impl Defaults {
    pub fn new(base: TcoAssumptions, parameters: AnalysisParameters, tables: LocationTables) -> Self {
        Self {
            base,
            parameters,
            tables,
        }
    }

    pub fn standard() -> Self {
        Self::new(
            standard_assumptions(),
            AnalysisParameters::default(),
            LocationTables::standard(),
        )
    }

    pub fn base_assumptions(&self) -> &TcoAssumptions {
        &self.base
    }

    pub fn parameters(&self) -> &AnalysisParameters {
        &self.parameters
    }

    pub fn tables(&self) -> &LocationTables {
        &self.tables
    }

    pub fn is_cold_weather(&self, state: &str) -> bool {
        self.tables
            .cold_weather_states
            .contains(&state.trim().to_ascii_uppercase())
    }

    /// State-specific energy prices and weather derating.
    pub fn location_patch(&self, state: &str) -> AssumptionOverrides {
        let state = state.trim().to_ascii_uppercase();
        let mut patch = AssumptionOverrides::default();

        patch.electricity_rate_kwh = Some(match self.tables.electricity_rates.get(&state) {
            Some(rate) => DataPoint::verified(*rate, format!("EIA average commercial rate ({state})"))
                .with_url(EIA_ELECTRIC_URL)
                .as_of("2024-12-01"),
            None => DataPoint::assumed(
                self.tables.national_electricity_rate,
                format!("National average; no rate on file for {state}"),
            ),
        });

        if let Some(price) = self.tables.diesel_prices.get(&state) {
            patch.diesel_price_per_gallon = Some(
                DataPoint::verified(*price, format!("EIA regional diesel price ({state})"))
                    .with_url(EIA_DIESEL_URL)
                    .as_of("2024-12-01"),
            );
        }

        patch.weather_derating = Some(if self.is_cold_weather(&state) {
            DataPoint::assumed(
                self.tables.cold_weather_derating,
                format!("Cold-climate range reduction ({state})"),
            )
        } else {
            DataPoint::assumed(self.tables.mild_weather_derating, "Mild-climate range reduction")
        });

        patch
    }

    /// Values the caller stated about their own fleet and utility.
    pub fn profile_patch(fleet: &FleetProfile, location: &LocationProfile) -> AssumptionOverrides {
        let mut patch = AssumptionOverrides::default();

        if let Some(price) = fleet.diesel_price_per_gallon {
            patch.diesel_price_per_gallon = Some(DataPoint::user(price, "Fleet diesel price"));
        }
        if let Some(mpg) = fleet.avg_mpg {
            let dp = DataPoint::user(mpg, "Fleet measured fuel economy");
            patch.diesel_mpg = ByBusType {
                type_a: Some(dp.clone()),
                type_c: Some(dp.clone()),
                type_d: Some(dp),
            };
        }
        if let Some(cost) = fleet.annual_maintenance_cost_per_bus {
            let miles = fleet.annual_miles_per_bus();
            if miles > 0.0 {
                patch.maintenance_per_mile.diesel =
                    Some(DataPoint::user(cost / miles, "Fleet diesel maintenance records"));
            }
        }
        if let Some(rate) = location.electricity_rate_kwh {
            patch.electricity_rate_kwh = Some(DataPoint::user(rate, "Utility bill rate"));
        }
        if let Some(rate) = location.demand_charge_kw {
            patch.demand_charge_kw = Some(DataPoint::user(rate, "Utility demand charge tariff"));
        }

        patch
    }

    /// Merges built-in < location < fleet profile < caller overrides, then
    /// pins program-dependent amounts as contingent.
    pub fn resolve(
        &self,
        fleet: &FleetProfile,
        location: &LocationProfile,
        overrides: &AssumptionOverrides,
    ) -> TcoAssumptions {
        let mut merged = self.base.clone();
        merged.overlay(&self.location_patch(&location.state_code()));
        merged.overlay(&Self::profile_patch(fleet, location));
        merged.overlay(overrides);
        merged.pin_contingent();
        merged
    }

    pub fn resolve_parameters(&self, overrides: &ParameterOverrides) -> AnalysisParameters {
        overrides.apply_to(&self.parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvidenceClassification;

    #[test]
    fn texas_gets_state_rates_and_mild_derating() {
        let defaults = Defaults::standard();
        let merged = defaults.resolve(
            &FleetProfile::default(),
            &LocationProfile::default(),
            &AssumptionOverrides::default(),
        );
        assert_eq!(merged.electricity_rate_kwh.value, 0.11);
        assert_eq!(merged.diesel_price_per_gallon.value, 3.20);
        assert_eq!(merged.weather_derating.value, 0.10);
    }

    #[test]
    fn cold_state_uses_cold_derating() {
        let defaults = Defaults::standard();
        let patch = defaults.location_patch("mn");
        assert_eq!(patch.weather_derating.map(|d| d.value), Some(0.30));
        assert!(patch.diesel_price_per_gallon.is_none());
    }

    #[test]
    fn unknown_state_falls_back_to_national_rate() {
        let patch = Defaults::standard().location_patch("ZZ");
        let rate = patch.electricity_rate_kwh.expect("rate always set");
        assert_eq!(rate.value, 0.12);
        assert_eq!(rate.classification, EvidenceClassification::Assumed);
    }

    #[test]
    fn caller_override_beats_profile_and_location() {
        let defaults = Defaults::standard();
        let location = LocationProfile {
            electricity_rate_kwh: Some(0.09),
            ..LocationProfile::default()
        };
        let mut overrides = AssumptionOverrides::default();
        overrides.electricity_rate_kwh = Some(DataPoint::user(0.15, "explicit"));

        let with_profile = defaults.resolve(&FleetProfile::default(), &location, &AssumptionOverrides::default());
        assert_eq!(with_profile.electricity_rate_kwh.value, 0.09);

        let with_override = defaults.resolve(&FleetProfile::default(), &location, &overrides);
        assert_eq!(with_override.electricity_rate_kwh.value, 0.15);
        assert_eq!(with_override.electricity_rate_kwh.source, "explicit");
    }

    #[test]
    fn incentive_override_keeps_contingent_label() {
        let defaults = Defaults::standard();
        for dp in [
            DataPoint::user(100_000.0, "Grant hope"),
            DataPoint::verified(100_000.0, "Signed award"),
        ] {
            let mut overrides = AssumptionOverrides::default();
            overrides.incentives.federal_per_bus = Some(dp.clone());
            let merged = defaults.resolve(&FleetProfile::default(), &LocationProfile::default(), &overrides);
            let federal = &merged.incentives.federal_per_bus;
            assert_eq!(federal.value, 100_000.0);
            assert_eq!(federal.source, dp.source);
            assert_eq!(federal.classification, EvidenceClassification::Contingent);
        }
    }

    #[test]
    fn fleet_mpg_applies_to_every_body_type() {
        let fleet = FleetProfile {
            avg_mpg: Some(7.0),
            annual_maintenance_cost_per_bus: Some(5_400.0),
            ..FleetProfile::default()
        };
        let merged = Defaults::standard().resolve(
            &fleet,
            &LocationProfile::default(),
            &AssumptionOverrides::default(),
        );
        assert_eq!(merged.diesel_mpg.type_a.value, 7.0);
        assert_eq!(merged.diesel_mpg.type_d.value, 7.0);
        assert!((merged.maintenance_per_mile.diesel.value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fleet_scale_tiers() {
        assert_eq!(fleet_scale(0).scale, FleetScale::Small);
        assert_eq!(fleet_scale(39).cost_multiplier, 1.15);
        assert_eq!(fleet_scale(40).scale, FleetScale::Medium);
        assert!(fleet_scale(99).break_even_reached);
        let large = fleet_scale(100);
        assert_eq!(large.scale, FleetScale::Large);
        assert_eq!(large.revenue_multiplier, 1.5);
    }
}
