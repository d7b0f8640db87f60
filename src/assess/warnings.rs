//! Explains zeroed, adjusted, and at-risk values for one scenario.
//!
//! Warnings are emitted in a fixed order so two runs over the same input
//! produce identical lists.

use crate::engine::TcoEngine;
use crate::model::{
    ApplicabilityWarning, ScenarioType, TcoAssumptions, TcoInput,
    WarningCategory, WarningSeverity,
};

struct WarningBuilder {
    id: &'static str,
    category: WarningCategory,
    severity: WarningSeverity,
}

impl WarningBuilder {
    fn new(id: &'static str, category: WarningCategory, severity: WarningSeverity) -> Self {
        Self {
            id,
            category,
            severity,
        }
    }

    fn build(
        self,
        title: &str,
        message: String,
        affected_parameter: &str,
        applied_value: f64,
        reason: String,
    ) -> ApplicabilityWarning {
        ApplicabilityWarning {
            id: self.id.into(),
            category: self.category,
            severity: self.severity,
            title: title.into(),
            message,
            affected_parameter: affected_parameter.into(),
            applied_value,
            reason,
        }
    }
}

impl TcoEngine {
    /// Warnings for `input` costed under the resolved `assumptions`.
    pub fn generate_warnings(
        &self,
        input: &TcoInput,
        assumptions: &TcoAssumptions,
    ) -> Vec<ApplicabilityWarning> {
        use WarningCategory as C;
        use WarningSeverity as S;

        let mut out = Vec::new();
        if !input.scenario_type.is_electric() {
            return out;
        }

        let state = input.location.state_code();
        let eligibility = self.eligibility(&state);
        let a = assumptions;

        if !eligibility.lcfs.applicable {
            out.push(WarningBuilder::new("lcfs_not_applicable", C::Jurisdiction, S::Warning).build(
                "LCFS credits not available",
                format!(
                    "Low Carbon Fuel Standard credits (${:.0}/bus/year nominal) are excluded for {state}.",
                    a.carbon_credits.lcfs_per_bus.value
                ),
                "carbon_credits.lcfs_per_bus",
                0.0,
                eligibility.lcfs.reason.clone(),
            ));
        }

        if !eligibility.federal_carbon.applicable {
            out.push(
                WarningBuilder::new("federal_carbon_not_applicable", C::Jurisdiction, S::Warning)
                    .build(
                        "Federal carbon credits not available",
                        format!("Federal carbon-reduction credits are excluded for {state}."),
                        "carbon_credits.federal_per_bus",
                        0.0,
                        eligibility.federal_carbon.reason.clone(),
                    ),
            );
        }

        if !eligibility.v2g.applicable {
            let nominal = a.v2g.demand_response_per_bus.value
                + a.v2g.frequency_regulation_per_bus.value
                + a.v2g.vpp_per_bus.value;
            out.push(WarningBuilder::new("v2g_not_applicable", C::Jurisdiction, S::Info).build(
                "V2G revenue not available",
                format!(
                    "Vehicle-to-grid payments (${nominal:.0}/bus/year nominal) are excluded: no participating utility program covers {state}."
                ),
                "v2g",
                0.0,
                eligibility.v2g.reason.clone(),
            ));
        }

        let federal = &a.incentives.federal_per_bus;
        if !eligibility.federal_incentive.applicable {
            out.push(
                WarningBuilder::new("federal_incentive_not_applicable", C::Incentive, S::Warning)
                    .build(
                        "Federal incentive not available",
                        format!("The federal purchase incentive is excluded for {state}."),
                        "incentives.federal_per_bus",
                        0.0,
                        eligibility.federal_incentive.reason.clone(),
                    ),
            );
        } else if federal.value > 0.0 {
            out.push(
                WarningBuilder::new("federal_incentive_contingent", C::Incentive, S::Warning).build(
                    "Federal incentive is not guaranteed",
                    format!(
                        "${:.0}/bus from {} is counted as available, but it is awarded competitively. Without an award year-0 cost rises by ${:.0}.",
                        federal.value,
                        federal.source,
                        federal.value * f64::from(input.fleet.total_buses())
                    ),
                    "incentives.federal_per_bus",
                    federal.value,
                    "Competitive grant; budget only after an award letter".into(),
                ),
            );
        }

        if self.defaults().is_cold_weather(&state) {
            let factor = a.weather_derating.value;
            out.push(WarningBuilder::new("cold_weather_derating", C::Weather, S::Info).build(
                "Cold-weather energy adjustment",
                format!(
                    "{state} is a cold-weather state: electric energy use is increased by a factor of {factor} ({:.0}% more kWh per mile).",
                    factor * 100.0
                ),
                "weather_derating",
                factor,
                "Battery heating and cabin heat reduce winter range".into(),
            ));
        }

        match input.scenario_type {
            ScenarioType::MobileCharging => {
                let fraction = a.mobile_charging.depot_infrastructure_fraction.value;
                out.push(
                    WarningBuilder::new(
                        "mobile_infrastructure_contract",
                        C::Infrastructure,
                        S::Warning,
                    )
                    .build(
                        "Reduced infrastructure assumes a service contract",
                        format!(
                            "Mobile charging carries only {:.0}% of a depot build-out. This relies on the provider supplying and maintaining charging equipment under contract.",
                            fraction * 100.0
                        ),
                        "mobile_charging.depot_infrastructure_fraction",
                        fraction,
                        "Confirm equipment ownership and make-ready scope in the service agreement".into(),
                    ),
                );
                if !eligibility.landfill_gas_ppa.applicable {
                    out.push(WarningBuilder::new("ppa_not_applicable", C::Jurisdiction, S::Info).build(
                        "Landfill-gas PPA not available",
                        format!(
                            "Mobile-charging energy is procured at the operator's utility rate (${:.3}/kWh) instead of the PPA rate.",
                            a.mobile_charging.utility_rate_kwh.value
                        ),
                        "mobile_charging.ppa_rate_kwh",
                        a.mobile_charging.utility_rate_kwh.value,
                        eligibility.landfill_gas_ppa.reason.clone(),
                    ));
                }
            }
            ScenarioType::SelfManagedEv | ScenarioType::Eaas => {
                let pct = input.fleet.park_out_percentage;
                if pct > 0.0 {
                    out.push(
                        WarningBuilder::new("park_out_depot_gap", C::Operational, S::Info).build(
                            "Park-out buses cannot use depot chargers",
                            format!(
                                "{pct:.0}% of the fleet parks off-site overnight; depot charging alone will not serve those buses."
                            ),
                            "fleet.park_out_percentage",
                            pct,
                            "Off-site buses need public charging or a mobile service".into(),
                        ),
                    );
                }
            }
            ScenarioType::DieselBaseline => {}
        }

        out
    }
}
