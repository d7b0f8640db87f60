//! The assumption schema and its layered merge.
//!
//! [`Assumptions`] is generic over its leaf type so one schema serves both
//! the fully resolved set ([`TcoAssumptions`], every leaf a [`DataPoint`])
//! and a partial patch ([`AssumptionOverrides`], every leaf optional).
//! [`Assumptions::overlay`] walks the schema field by field; a patch leaf
//! that is `None` leaves the target untouched, so nested groups can be
//! partially overridden.

use serde::{Deserialize, Serialize};

use super::evidence::{DataPoint, EvidenceClassification};

/// Fully resolved assumptions: every value carries provenance.
pub type TcoAssumptions = Assumptions<DataPoint>;

/// Partial assumptions: only the set leaves are applied.
pub type AssumptionOverrides = Assumptions<Option<DataPoint>>;

/// A leaf that can absorb an optional replacement.
pub trait Patch {
    fn apply(&mut self, patch: &Option<DataPoint>);
}

impl Patch for DataPoint {
    fn apply(&mut self, patch: &Option<DataPoint>) {
        if let Some(p) = patch {
            *self = p.clone();
        }
    }
}

impl Patch for Option<DataPoint> {
    fn apply(&mut self, patch: &Option<DataPoint>) {
        if let Some(p) = patch {
            *self = Some(p.clone());
        }
    }
}

/// One value per bus body type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct ByBusType<V> {
    pub type_a: V,
    pub type_c: V,
    pub type_d: V,
}

impl<V: Patch> ByBusType<V> {
    fn overlay(&mut self, patch: &ByBusType<Option<DataPoint>>) {
        self.type_a.apply(&patch.type_a);
        self.type_c.apply(&patch.type_c);
        self.type_d.apply(&patch.type_d);
    }
}

/// One value per drivetrain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct ByFuel<V> {
    pub diesel: V,
    pub electric: V,
}

impl<V: Patch> ByFuel<V> {
    fn overlay(&mut self, patch: &ByFuel<Option<DataPoint>>) {
        self.diesel.apply(&patch.diesel);
        self.electric.apply(&patch.electric);
    }
}

/// Internal landed cost of mobile-charging energy, per kWh delivered.
///
/// These are the operator's own costs, not a customer price list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct MobileChargingCosts<V> {
    /// Landfill-gas PPA energy, where the PPA territory applies.
    pub ppa_rate_kwh: V,
    /// Operator's utility C&I rate, used outside the PPA territory.
    pub utility_rate_kwh: V,
    pub truck_energy_kwh: V,
    pub labor_kwh: V,
    pub depreciation_kwh: V,
    pub maintenance_kwh: V,
    /// Share of a full depot build-out the district still pays for.
    pub depot_infrastructure_fraction: V,
}

impl<V: Patch> MobileChargingCosts<V> {
    fn overlay(&mut self, patch: &MobileChargingCosts<Option<DataPoint>>) {
        self.ppa_rate_kwh.apply(&patch.ppa_rate_kwh);
        self.utility_rate_kwh.apply(&patch.utility_rate_kwh);
        self.truck_energy_kwh.apply(&patch.truck_energy_kwh);
        self.labor_kwh.apply(&patch.labor_kwh);
        self.depreciation_kwh.apply(&patch.depreciation_kwh);
        self.maintenance_kwh.apply(&patch.maintenance_kwh);
        self.depot_infrastructure_fraction
            .apply(&patch.depot_infrastructure_fraction);
    }
}

/// Carbon-credit revenue per bus per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct CarbonCredits<V> {
    /// State low-carbon fuel standard credits.
    pub lcfs_per_bus: V,
    /// Federal carbon-reduction credits.
    pub federal_per_bus: V,
}

impl<V: Patch> CarbonCredits<V> {
    fn overlay(&mut self, patch: &CarbonCredits<Option<DataPoint>>) {
        self.lcfs_per_bus.apply(&patch.lcfs_per_bus);
        self.federal_per_bus.apply(&patch.federal_per_bus);
    }
}

/// Vehicle-to-grid program payments per bus per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct V2gRevenue<V> {
    pub demand_response_per_bus: V,
    pub frequency_regulation_per_bus: V,
    pub vpp_per_bus: V,
}

impl<V: Patch> V2gRevenue<V> {
    fn overlay(&mut self, patch: &V2gRevenue<Option<DataPoint>>) {
        self.demand_response_per_bus
            .apply(&patch.demand_response_per_bus);
        self.frequency_regulation_per_bus
            .apply(&patch.frequency_regulation_per_bus);
        self.vpp_per_bus.apply(&patch.vpp_per_bus);
    }
}

/// One-time purchase incentives per electric bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct Incentives<V> {
    pub federal_per_bus: V,
    pub state_per_bus: V,
}

impl<V: Patch> Incentives<V> {
    fn overlay(&mut self, patch: &Incentives<Option<DataPoint>>) {
        self.federal_per_bus.apply(&patch.federal_per_bus);
        self.state_per_bus.apply(&patch.state_per_bus);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct Lifecycle<V> {
    /// Resale value at the horizon as a fraction of purchase price.
    pub residual_value_fraction: V,
    /// Planning year in which electric buses get a new battery pack.
    pub battery_replacement_year: V,
    /// Pack replacement cost per bus.
    pub battery_replacement_cost: V,
}

impl<V: Patch> Lifecycle<V> {
    fn overlay(&mut self, patch: &Lifecycle<Option<DataPoint>>) {
        self.residual_value_fraction
            .apply(&patch.residual_value_fraction);
        self.battery_replacement_year
            .apply(&patch.battery_replacement_year);
        self.battery_replacement_cost
            .apply(&patch.battery_replacement_cost);
    }
}

/// Societal cost rates for diesel operation, $ per bus per year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct ExternalCostRates<V> {
    pub child_respiratory: V,
    pub community_health: V,
    pub driver_exposure: V,
    pub co2_social_cost: V,
    pub methane_leakage: V,
    pub local_air_quality: V,
    pub emission_compliance: V,
    pub future_regulation: V,
    pub carbon_tax_exposure: V,
    pub fuel_price_volatility: V,
    pub supply_chain_risk: V,
    pub reputational_risk: V,
}

impl<V: Patch> ExternalCostRates<V> {
    fn overlay(&mut self, patch: &ExternalCostRates<Option<DataPoint>>) {
        self.child_respiratory.apply(&patch.child_respiratory);
        self.community_health.apply(&patch.community_health);
        self.driver_exposure.apply(&patch.driver_exposure);
        self.co2_social_cost.apply(&patch.co2_social_cost);
        self.methane_leakage.apply(&patch.methane_leakage);
        self.local_air_quality.apply(&patch.local_air_quality);
        self.emission_compliance.apply(&patch.emission_compliance);
        self.future_regulation.apply(&patch.future_regulation);
        self.carbon_tax_exposure.apply(&patch.carbon_tax_exposure);
        self.fuel_price_volatility.apply(&patch.fuel_price_volatility);
        self.supply_chain_risk.apply(&patch.supply_chain_risk);
        self.reputational_risk.apply(&patch.reputational_risk);
    }
}

impl ExternalCostRates<DataPoint> {
    pub fn health(&self) -> f64 {
        self.child_respiratory.value + self.community_health.value + self.driver_exposure.value
    }

    pub fn climate(&self) -> f64 {
        self.co2_social_cost.value + self.methane_leakage.value + self.local_air_quality.value
    }

    pub fn regulatory(&self) -> f64 {
        self.emission_compliance.value + self.future_regulation.value + self.carbon_tax_exposure.value
    }

    pub fn operational_risk(&self) -> f64 {
        self.fuel_price_volatility.value + self.supply_chain_risk.value + self.reputational_risk.value
    }
}

/// The complete assumption schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    deny_unknown_fields,
    bound(deserialize = "V: Deserialize<'de> + Default")
)]
pub struct Assumptions<V> {
    /// Purchase price per bus.
    pub bus_prices: ByBusType<ByFuel<V>>,
    pub diesel_price_per_gallon: V,
    pub electricity_rate_kwh: V,
    /// Demand charge, $/kW-month.
    pub demand_charge_kw: V,
    pub diesel_mpg: ByBusType<V>,
    pub ev_kwh_per_mile: ByBusType<V>,
    /// Maintenance, $/mile.
    pub maintenance_per_mile: ByFuel<V>,
    pub charger_cost_level2: V,
    pub charger_cost_dcfc: V,
    pub installation_cost_per_charger: V,
    pub mobile_charging: MobileChargingCosts<V>,
    pub carbon_credits: CarbonCredits<V>,
    pub v2g: V2gRevenue<V>,
    /// Fraction of nominal revenue actually captured. Shared by every
    /// electric scenario so comparisons stay apples to apples.
    pub revenue_capture_rate: V,
    pub incentives: Incentives<V>,
    pub lifecycle: Lifecycle<V>,
    /// Extra energy draw from cold-weather range loss (0.30 = +30% kWh).
    pub weather_derating: V,
    pub external_costs: ExternalCostRates<V>,
}

impl<V: Patch> Assumptions<V> {
    /// Applies every set leaf of `patch`, leaving the rest untouched.
    pub fn overlay(&mut self, patch: &AssumptionOverrides) {
        self.bus_prices.type_a.overlay(&patch.bus_prices.type_a);
        self.bus_prices.type_c.overlay(&patch.bus_prices.type_c);
        self.bus_prices.type_d.overlay(&patch.bus_prices.type_d);
        self.diesel_price_per_gallon
            .apply(&patch.diesel_price_per_gallon);
        self.electricity_rate_kwh.apply(&patch.electricity_rate_kwh);
        self.demand_charge_kw.apply(&patch.demand_charge_kw);
        self.diesel_mpg.overlay(&patch.diesel_mpg);
        self.ev_kwh_per_mile.overlay(&patch.ev_kwh_per_mile);
        self.maintenance_per_mile
            .overlay(&patch.maintenance_per_mile);
        self.charger_cost_level2.apply(&patch.charger_cost_level2);
        self.charger_cost_dcfc.apply(&patch.charger_cost_dcfc);
        self.installation_cost_per_charger
            .apply(&patch.installation_cost_per_charger);
        self.mobile_charging.overlay(&patch.mobile_charging);
        self.carbon_credits.overlay(&patch.carbon_credits);
        self.v2g.overlay(&patch.v2g);
        self.revenue_capture_rate.apply(&patch.revenue_capture_rate);
        self.incentives.overlay(&patch.incentives);
        self.lifecycle.overlay(&patch.lifecycle);
        self.weather_derating.apply(&patch.weather_derating);
        self.external_costs.overlay(&patch.external_costs);
    }

    /// Returns a copy with `patch` applied.
    pub fn overlaid(&self, patch: &AssumptionOverrides) -> Self
    where
        V: Clone,
    {
        let mut next = self.clone();
        next.overlay(patch);
        next
    }
}

impl TcoAssumptions {
    /// Relabels every non-zero incentive and program revenue amount as
    /// CONTINGENT. Awards and enrollments are never certain, so a caller
    /// may change the amount and its source but not that label.
    pub fn pin_contingent(&mut self) {
        for dp in [
            &mut self.incentives.federal_per_bus,
            &mut self.incentives.state_per_bus,
            &mut self.carbon_credits.lcfs_per_bus,
            &mut self.carbon_credits.federal_per_bus,
            &mut self.v2g.demand_response_per_bus,
            &mut self.v2g.frequency_regulation_per_bus,
            &mut self.v2g.vpp_per_bus,
        ] {
            if dp.value > 0.0 {
                dp.classification = EvidenceClassification::Contingent;
            }
        }
    }

    /// Purchase prices for the given drivetrain, by bus type.
    pub fn prices_for(&self, electric: bool) -> ByBusType<f64> {
        let pick = |p: &ByFuel<DataPoint>| {
            if electric {
                p.electric.value
            } else {
                p.diesel.value
            }
        };
        ByBusType {
            type_a: pick(&self.bus_prices.type_a),
            type_c: pick(&self.bus_prices.type_c),
            type_d: pick(&self.bus_prices.type_d),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::Defaults;

    #[test]
    fn nested_patch_keeps_siblings() {
        let base = Defaults::standard().base_assumptions().clone();
        let mut patch = AssumptionOverrides::default();
        patch.bus_prices.type_c.electric = Some(DataPoint::user(380_000.0, "Dealer quote"));

        let merged = base.overlaid(&patch);
        assert_eq!(merged.bus_prices.type_c.electric.value, 380_000.0);
        assert_eq!(
            merged.bus_prices.type_c.electric.classification,
            EvidenceClassification::UserProvided
        );
        assert_eq!(merged.bus_prices.type_c.diesel, base.bus_prices.type_c.diesel);
        assert_eq!(merged.bus_prices.type_a, base.bus_prices.type_a);
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = Defaults::standard().base_assumptions().clone();
        assert_eq!(base.overlaid(&AssumptionOverrides::default()), base);
    }

    #[test]
    fn patches_compose_later_wins() {
        let mut first = AssumptionOverrides::default();
        first.electricity_rate_kwh = Some(DataPoint::user(0.10, "first"));
        first.demand_charge_kw = Some(DataPoint::user(12.0, "first"));
        let mut second = AssumptionOverrides::default();
        second.electricity_rate_kwh = Some(DataPoint::user(0.20, "second"));

        first.overlay(&second);
        assert_eq!(first.electricity_rate_kwh.as_ref().map(|d| d.value), Some(0.20));
        assert_eq!(first.demand_charge_kw.as_ref().map(|d| d.value), Some(12.0));
    }

    #[test]
    fn overrides_parse_from_toml() {
        let patch: AssumptionOverrides = toml::from_str(
            r#"
            electricity_rate_kwh = 0.14

            [bus_prices.type_c]
            electric = 380000

            [incentives.federal_per_bus]
            value = 0
            classification = "NOT_APPLICABLE"
            source = "Grant not awarded"
            "#,
        )
        .expect("valid overrides");
        assert_eq!(patch.electricity_rate_kwh.as_ref().map(|d| d.value), Some(0.14));
        assert_eq!(
            patch.bus_prices.type_c.electric.as_ref().map(|d| d.value),
            Some(380_000.0)
        );
        assert!(patch.bus_prices.type_c.diesel.is_none());
        assert_eq!(
            patch.incentives.federal_per_bus.as_ref().map(|d| d.classification),
            Some(EvidenceClassification::NotApplicable)
        );
    }

    #[test]
    fn program_amounts_are_pinned_contingent() {
        let mut a = Defaults::standard().base_assumptions().clone();
        a.incentives.federal_per_bus =
            DataPoint::new(100_000.0, EvidenceClassification::Verified, "Award letter");
        a.incentives.state_per_bus = DataPoint::user(20_000.0, "State voucher");
        a.v2g.vpp_per_bus =
            DataPoint::new(0.0, EvidenceClassification::NotApplicable, "No aggregator");
        a.electricity_rate_kwh = DataPoint::verified(0.10, "Utility bill");

        a.pin_contingent();
        assert_eq!(a.incentives.federal_per_bus.classification, EvidenceClassification::Contingent);
        assert_eq!(a.incentives.federal_per_bus.value, 100_000.0);
        assert_eq!(a.incentives.federal_per_bus.source, "Award letter");
        assert_eq!(a.incentives.state_per_bus.classification, EvidenceClassification::Contingent);
        assert_eq!(a.v2g.vpp_per_bus.classification, EvidenceClassification::NotApplicable);
        assert_eq!(a.electricity_rate_kwh.classification, EvidenceClassification::Verified);
    }

    #[test]
    fn unknown_override_field_rejected() {
        let result: Result<AssumptionOverrides, _> = toml::from_str("fuel_price = 3.0");
        assert!(result.is_err());
    }
}
