//! Catalog of every default assumption with provenance and audit metadata.
//!
//! Values come from [`Defaults`] so the registry and the engine can never
//! disagree; the registry adds units, allowed ranges, jurisdiction, update
//! cadence, and contingency details on top.

use serde::Serialize;

use crate::defaults::Defaults;
use crate::error::TcoError;
use crate::model::{
    Applicability, DataPoint, EvidenceClassification, EvidenceStrength, JurisdictionScope,
};

/// How often a registry value should be refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdatePolicy {
    RealTime,
    Monthly,
    Quarterly,
    Annual,
    Manual,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllowedRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of_date: Option<String>,
    pub retrieved_date: String,
}

/// What a contingent value depends on, and what to assume if it falls through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContingencyInfo {
    pub condition: String,
    /// Probability the condition is met, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    pub fallback_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub value: f64,
    pub units: String,
    pub allowed_range: AllowedRange,
    pub classification: EvidenceClassification,
    pub evidence_strength: EvidenceStrength,
    pub jurisdiction: JurisdictionScope,
    pub source: SourceInfo,
    pub update_policy: UpdatePolicy,
    pub impact_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contingency: Option<ContingencyInfo>,
}

/// Outcome of checking a proposed value against an entry's range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCheck {
    pub valid: bool,
    pub message: String,
}

const RETRIEVED: &str = "2024-12-15";

struct EntryBuilder {
    entry: RegistryEntry,
}

impl EntryBuilder {
    fn new(id: &str, name: &str, dp: &DataPoint, units: &str, range: (f64, f64)) -> Self {
        Self {
            entry: RegistryEntry {
                id: id.into(),
                name: name.into(),
                description: dp.source.clone(),
                value: dp.value,
                units: units.into(),
                allowed_range: AllowedRange {
                    min: range.0,
                    max: range.1,
                },
                classification: dp.classification,
                evidence_strength: dp.classification.strength(),
                jurisdiction: JurisdictionScope::UsAll,
                source: SourceInfo {
                    name: dp.source.clone(),
                    url: dp.source_url.clone(),
                    publisher: "Industry estimate".into(),
                    as_of_date: dp.as_of.clone(),
                    retrieved_date: RETRIEVED.into(),
                },
                update_policy: UpdatePolicy::Annual,
                impact_note: String::new(),
                audit_note: None,
                contingency: None,
            },
        }
    }

    fn publisher(mut self, publisher: &str) -> Self {
        self.entry.source.publisher = publisher.into();
        self
    }

    fn scope(mut self, scope: &JurisdictionScope) -> Self {
        self.entry.jurisdiction = scope.clone();
        self
    }

    fn policy(mut self, policy: UpdatePolicy) -> Self {
        self.entry.update_policy = policy;
        self
    }

    fn impact(mut self, note: &str) -> Self {
        self.entry.impact_note = note.into();
        self
    }

    fn audit(mut self, note: &str) -> Self {
        self.entry.audit_note = Some(note.into());
        self
    }

    fn contingent_on(mut self, condition: &str, probability: Option<f64>) -> Self {
        self.entry.contingency = Some(ContingencyInfo {
            condition: condition.into(),
            probability,
            fallback_value: 0.0,
        });
        self
    }

    fn build(self) -> RegistryEntry {
        self.entry
    }
}

/// The assumption catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn standard() -> Self {
        Self::from_defaults(&Defaults::standard())
    }

    /// Builds the catalog from the values `defaults` would apply.
    pub fn from_defaults(defaults: &Defaults) -> Self {
        let a = defaults.base_assumptions();
        let programs = &defaults.tables().programs;
        let cold = JurisdictionScope::StateSpecific(
            defaults.tables().cold_weather_states.iter().cloned().collect(),
        );
        let mut entries = Vec::new();

        for (label, prices) in [
            ("type_a", &a.bus_prices.type_a),
            ("type_c", &a.bus_prices.type_c),
            ("type_d", &a.bus_prices.type_d),
        ] {
            entries.push(
                EntryBuilder::new(
                    &format!("bus_price_{label}_diesel"),
                    &format!("Diesel bus price ({label})"),
                    &prices.diesel,
                    "$/bus",
                    (50_000.0, 250_000.0),
                )
                .impact("Year-0 capital for the diesel baseline")
                .build(),
            );
            entries.push(
                EntryBuilder::new(
                    &format!("bus_price_{label}_electric"),
                    &format!("Electric bus price ({label})"),
                    &prices.electric,
                    "$/bus",
                    (150_000.0, 600_000.0),
                )
                .impact("Largest single cost in every electric scenario")
                .audit("Replace with dealer quotes before procurement decisions")
                .build(),
            );
        }

        entries.push(
            EntryBuilder::new(
                "diesel_price_per_gallon",
                "Diesel fuel price",
                &a.diesel_price_per_gallon,
                "$/gal",
                (1.5, 10.0),
            )
            .publisher("U.S. Energy Information Administration")
            .policy(UpdatePolicy::Monthly)
            .impact("Drives diesel energy cost and every savings figure")
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "electricity_rate_kwh",
                "Commercial electricity rate",
                &a.electricity_rate_kwh,
                "$/kWh",
                (0.05, 0.50),
            )
            .publisher("U.S. Energy Information Administration")
            .policy(UpdatePolicy::Monthly)
            .impact("Energy cost for self-managed and EaaS scenarios")
            .audit("State defaults are averages; tariff-specific rates can differ materially")
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "demand_charge_kw",
                "Demand charge",
                &a.demand_charge_kw,
                "$/kW-month",
                (0.0, 50.0),
            )
            .impact("Depot peak charging cost")
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "maintenance_per_mile_diesel",
                "Diesel maintenance",
                &a.maintenance_per_mile.diesel,
                "$/mile",
                (0.10, 2.0),
            )
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "maintenance_per_mile_electric",
                "Electric maintenance",
                &a.maintenance_per_mile.electric,
                "$/mile",
                (0.05, 1.5),
            )
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "charger_cost_level2",
                "Level 2 charger",
                &a.charger_cost_level2,
                "$/charger",
                (2_000.0, 20_000.0),
            )
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "charger_cost_dcfc",
                "DC fast charger",
                &a.charger_cost_dcfc,
                "$/charger",
                (30_000.0, 200_000.0),
            )
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "installation_cost_per_charger",
                "Charger installation",
                &a.installation_cost_per_charger,
                "$/charger",
                (5_000.0, 60_000.0),
            )
            .audit("Excludes utility service upgrades")
            .build(),
        );

        let m = &a.mobile_charging;
        entries.push(
            EntryBuilder::new(
                "mobile_ppa_rate_kwh",
                "Landfill-gas PPA energy",
                &m.ppa_rate_kwh,
                "$/kWh",
                (0.02, 0.15),
            )
            .publisher("Mobile charging operator")
            .scope(&programs.landfill_gas_ppa)
            .policy(UpdatePolicy::Manual)
            .impact("Power procurement inside the PPA territory")
            .build(),
        );
        for (id, name, dp) in [
            ("mobile_utility_rate_kwh", "Operator utility energy", &m.utility_rate_kwh),
            ("mobile_truck_energy_kwh", "Delivery truck energy", &m.truck_energy_kwh),
            ("mobile_labor_kwh", "Delivery labor", &m.labor_kwh),
            ("mobile_depreciation_kwh", "Truck depreciation", &m.depreciation_kwh),
            ("mobile_maintenance_kwh", "Truck maintenance", &m.maintenance_kwh),
        ] {
            entries.push(
                EntryBuilder::new(id, name, dp, "$/kWh", (0.0, 0.30))
                    .publisher("Mobile charging operator")
                    .policy(UpdatePolicy::Manual)
                    .impact("Internal landed cost of mobile-charging energy")
                    .audit("Operator cost, not a customer price")
                    .build(),
            );
        }
        entries.push(
            EntryBuilder::new(
                "mobile_depot_infrastructure_fraction",
                "Mobile-charging depot infrastructure share",
                &m.depot_infrastructure_fraction,
                "fraction",
                (0.0, 1.0),
            )
            .impact("Year-0 infrastructure under mobile charging")
            .audit("Confirm which make-ready work the service contract covers")
            .build(),
        );

        entries.push(
            EntryBuilder::new(
                "lcfs_credit_per_bus",
                "Low Carbon Fuel Standard credits",
                &a.carbon_credits.lcfs_per_bus,
                "$/bus/year",
                (0.0, 3_000.0),
            )
            .publisher("California Air Resources Board")
            .scope(&programs.lcfs)
            .policy(UpdatePolicy::Quarterly)
            .impact("Annual revenue, only in LCFS states")
            .contingent_on("Fleet operates in a state with an LCFS program", None)
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "federal_carbon_credit_per_bus",
                "Federal carbon-reduction credit",
                &a.carbon_credits.federal_per_bus,
                "$/bus/year",
                (0.0, 2_000.0),
            )
            .scope(&programs.federal_carbon)
            .impact("Annual revenue for electric scenarios")
            .contingent_on("Program qualification and continued funding", None)
            .build(),
        );
        for (id, name, dp) in [
            (
                "v2g_demand_response_per_bus",
                "V2G demand response",
                &a.v2g.demand_response_per_bus,
            ),
            (
                "v2g_frequency_regulation_per_bus",
                "V2G frequency regulation",
                &a.v2g.frequency_regulation_per_bus,
            ),
            ("v2g_vpp_per_bus", "Virtual power plant payments", &a.v2g.vpp_per_bus),
        ] {
            entries.push(
                EntryBuilder::new(id, name, dp, "$/bus/year", (0.0, 2_000.0))
                    .publisher("PJM Interconnection")
                    .scope(&programs.v2g)
                    .policy(UpdatePolicy::Annual)
                    .impact("Annual revenue where a utility program exists")
                    .contingent_on("Enrollment in a utility or ISO grid-services program", None)
                    .build(),
            );
        }
        entries.push(
            EntryBuilder::new(
                "revenue_capture_rate",
                "Revenue capture rate",
                &a.revenue_capture_rate,
                "fraction",
                (0.0, 1.0),
            )
            .impact("Scales every revenue line in every electric scenario")
            .audit("One shared fraction for all electric scenarios")
            .build(),
        );

        entries.push(
            EntryBuilder::new(
                "federal_incentive_per_bus",
                "EPA Clean School Bus Program",
                &a.incentives.federal_per_bus,
                "$/bus",
                (0.0, 375_000.0),
            )
            .publisher("U.S. Environmental Protection Agency")
            .scope(&programs.federal_incentive)
            .policy(UpdatePolicy::Manual)
            .impact("Largest offset to electric bus capital")
            .audit("Competitive grant; do not budget without an award letter")
            .contingent_on("Award under a competitive grant round", Some(0.30))
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "state_incentive_per_bus",
                "State incentive",
                &a.incentives.state_per_bus,
                "$/bus",
                (0.0, 300_000.0),
            )
            .policy(UpdatePolicy::Manual)
            .build(),
        );

        entries.push(
            EntryBuilder::new(
                "residual_value_fraction",
                "Residual value",
                &a.lifecycle.residual_value_fraction,
                "fraction",
                (0.0, 0.5),
            )
            .policy(UpdatePolicy::Static)
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "battery_replacement_year",
                "Battery replacement year",
                &a.lifecycle.battery_replacement_year,
                "year",
                (1.0, 30.0),
            )
            .policy(UpdatePolicy::Static)
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "battery_replacement_cost",
                "Battery replacement cost",
                &a.lifecycle.battery_replacement_cost,
                "$/bus",
                (10_000.0, 150_000.0),
            )
            .impact("Mid-life capital spike for electric scenarios")
            .build(),
        );
        entries.push(
            EntryBuilder::new(
                "weather_derating_cold",
                "Cold-weather range reduction",
                &DataPoint::assumed(
                    defaults.tables().cold_weather_derating,
                    "Cold-climate range reduction",
                ),
                "fraction",
                (0.0, 0.6),
            )
            .scope(&cold)
            .policy(UpdatePolicy::Static)
            .impact("Extra energy per mile in cold-weather states")
            .build(),
        );

        let e = &a.external_costs;
        for (id, dp) in [
            ("external_child_respiratory", &e.child_respiratory),
            ("external_community_health", &e.community_health),
            ("external_driver_exposure", &e.driver_exposure),
            ("external_co2_social_cost", &e.co2_social_cost),
            ("external_methane_leakage", &e.methane_leakage),
            ("external_local_air_quality", &e.local_air_quality),
            ("external_emission_compliance", &e.emission_compliance),
            ("external_future_regulation", &e.future_regulation),
            ("external_carbon_tax_exposure", &e.carbon_tax_exposure),
            ("external_fuel_price_volatility", &e.fuel_price_volatility),
            ("external_supply_chain_risk", &e.supply_chain_risk),
            ("external_reputational_risk", &e.reputational_risk),
        ] {
            entries.push(
                EntryBuilder::new(id, &dp.source, dp, "$/bus/year", (0.0, 5_000.0))
                    .policy(UpdatePolicy::Static)
                    .impact("Societal view only; never part of budget TCO")
                    .build(),
            );
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether the entry's jurisdiction covers `state`.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::UnknownVariable`] for an unknown id.
    pub fn revenue_applicability(&self, id: &str, state: &str) -> Result<Applicability, TcoError> {
        let entry = self
            .get(id)
            .ok_or_else(|| TcoError::UnknownVariable(id.to_string()))?;
        Ok(entry.jurisdiction.applies_to(state))
    }

    /// Entries a planner should confirm before relying on the result.
    pub fn entries_requiring_confirmation(&self) -> Vec<&RegistryEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.classification,
                    EvidenceClassification::UserProvided
                        | EvidenceClassification::Contingent
                        | EvidenceClassification::SourceProvided
                )
            })
            .collect()
    }

    /// Checks a proposed value against the entry's allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::UnknownVariable`] for an unknown id.
    pub fn validate_value(&self, id: &str, value: f64) -> Result<RangeCheck, TcoError> {
        let entry = self
            .get(id)
            .ok_or_else(|| TcoError::UnknownVariable(id.to_string()))?;
        let AllowedRange { min, max } = entry.allowed_range;
        Ok(if value.is_finite() && value >= min && value <= max {
            RangeCheck {
                valid: true,
                message: format!("{value} {} is within {min}–{max}", entry.units),
            }
        } else {
            RangeCheck {
                valid: false,
                message: format!(
                    "{value} {} is outside the allowed range {min}–{max} for {}",
                    entry.units, entry.name
                ),
            }
        })
    }

    /// Pretty-printed JSON of every entry for audit review.
    ///
    /// # Errors
    ///
    /// Returns a serialization error; not expected for well-formed entries.
    pub fn export_for_audit(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&serde_json::json!({
            "entry_count": self.entries.len(),
            "entries": self.entries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_track_defaults() {
        let registry = Registry::standard();
        let defaults = Defaults::standard();
        let entry = registry.get("federal_incentive_per_bus").expect("entry");
        assert_eq!(entry.value, defaults.base_assumptions().incentives.federal_per_bus.value);
        assert_eq!(entry.classification, EvidenceClassification::Contingent);
        assert_eq!(entry.evidence_strength, EvidenceStrength::Low);
        let contingency = entry.contingency.as_ref().expect("contingent entry");
        assert_eq!(contingency.probability, Some(0.30));
        assert_eq!(contingency.fallback_value, 0.0);
    }

    #[test]
    fn ids_are_unique() {
        let registry = Registry::standard();
        let mut ids: Vec<_> = registry.entries().iter().map(|e| e.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn lcfs_gated_to_west_coast() {
        let registry = Registry::standard();
        assert!(
            registry
                .revenue_applicability("lcfs_credit_per_bus", "CA")
                .expect("known id")
                .applicable
        );
        let tx = registry
            .revenue_applicability("lcfs_credit_per_bus", "TX")
            .expect("known id");
        assert!(!tx.applicable);
        assert!(tx.reason.contains("CA, OR, WA"));
        assert!(registry.revenue_applicability("nope", "TX").is_err());
    }

    #[test]
    fn range_check() {
        let registry = Registry::standard();
        assert!(registry.validate_value("electricity_rate_kwh", 0.14).expect("id").valid);
        let bad = registry.validate_value("electricity_rate_kwh", 0.9).expect("id");
        assert!(!bad.valid);
        assert!(bad.message.contains("outside"));
    }

    #[test]
    fn confirmation_list_holds_contingent_and_user_values() {
        let registry = Registry::standard();
        let ids: Vec<_> = registry
            .entries_requiring_confirmation()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert!(ids.contains(&"federal_incentive_per_bus"));
        assert!(ids.contains(&"state_incentive_per_bus"));
        assert!(ids.contains(&"mobile_labor_kwh"));
        assert!(!ids.contains(&"diesel_price_per_gallon"));
    }

    #[test]
    fn audit_export_is_json() {
        let json = Registry::standard().export_for_audit().expect("serializes");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert!(parsed["entry_count"].as_u64().unwrap_or(0) > 30);
        assert_eq!(parsed["entries"][0]["id"], "bus_price_type_a_diesel");
    }
}
