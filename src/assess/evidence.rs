//! Rolls per-factor provenance up into one evidence tier.

use crate::engine::TcoEngine;
use crate::model::assumptions::ByFuel;
use crate::model::{
    DataPoint, EvidenceClassification, EvidenceFactor, EvidenceStrength, ImpactLevel, ScenarioType,
    TcoAssumptions, TcoInput,
};

/// The classification with the weakest implied strength.
fn weakest<'a>(points: impl IntoIterator<Item = &'a DataPoint>) -> EvidenceClassification {
    points
        .into_iter()
        .map(|p| p.classification)
        .max_by_key(|c| c.strength())
        .unwrap_or(EvidenceClassification::Unverified)
}

fn factor(
    name: &str,
    classification: EvidenceClassification,
    impact: ImpactLevel,
    note: impl Into<String>,
) -> EvidenceFactor {
    EvidenceFactor {
        factor: name.into(),
        classification,
        impact,
        note: note.into(),
    }
}

/// Deterministic roll-up.
///
/// Only applicable factors with HIGH or MEDIUM impact count. Any material
/// contingent factor caps the tier at MEDIUM; three or more drop it to LOW.
/// A high-impact unverified factor, or a majority of unverified ones, makes
/// the result UNCERTAIN. HIGH needs no contingency, nothing unverified, and
/// at least half the material factors verified.
pub fn roll_up(factors: &[EvidenceFactor]) -> EvidenceStrength {
    let material: Vec<&EvidenceFactor> = factors
        .iter()
        .filter(|f| f.impact != ImpactLevel::Low)
        .filter(|f| f.classification != EvidenceClassification::NotApplicable)
        .collect();
    if material.is_empty() {
        return EvidenceStrength::Uncertain;
    }

    let count = |c: EvidenceClassification| material.iter().filter(|f| f.classification == c).count();
    let unverified = count(EvidenceClassification::Unverified);
    let contingent = count(EvidenceClassification::Contingent);
    let verified = count(EvidenceClassification::Verified);
    let high_impact_unverified = material.iter().any(|f| {
        f.impact == ImpactLevel::High && f.classification == EvidenceClassification::Unverified
    });

    if high_impact_unverified || unverified * 2 > material.len() {
        EvidenceStrength::Uncertain
    } else if contingent >= 3 {
        EvidenceStrength::Low
    } else if contingent == 0 && unverified == 0 && verified * 2 >= material.len() {
        EvidenceStrength::High
    } else {
        EvidenceStrength::Medium
    }
}

impl TcoEngine {
    /// Evidence factors for `input` and their overall tier.
    pub fn summarize_evidence(
        &self,
        input: &TcoInput,
        assumptions: &TcoAssumptions,
    ) -> (EvidenceStrength, Vec<EvidenceFactor>) {
        let a = assumptions;
        let fleet = &input.fleet;
        let electric = input.scenario_type.is_electric();
        let eligibility = self.eligibility(&input.location.state_code());

        let price = |p: &ByFuel<DataPoint>| {
            if electric {
                p.electric.clone()
            } else {
                p.diesel.clone()
            }
        };
        let mut priced: Vec<DataPoint> = Vec::new();
        if fleet.type_a_count > 0 {
            priced.push(price(&a.bus_prices.type_a));
        }
        if fleet.type_c_count > 0 || fleet.total_buses() == 0 {
            priced.push(price(&a.bus_prices.type_c));
        }
        if fleet.type_d_count > 0 {
            priced.push(price(&a.bus_prices.type_d));
        }

        let mut factors = vec![factor(
            "Vehicle pricing",
            weakest(&priced),
            ImpactLevel::High,
            "Purchase price of the buses in this fleet",
        )];

        let energy = match input.scenario_type {
            ScenarioType::DieselBaseline => factor(
                "Energy price",
                a.diesel_price_per_gallon.classification,
                ImpactLevel::High,
                a.diesel_price_per_gallon.source.clone(),
            ),
            ScenarioType::MobileCharging => {
                let m = &a.mobile_charging;
                let procurement = if eligibility.landfill_gas_ppa.applicable {
                    &m.ppa_rate_kwh
                } else {
                    &m.utility_rate_kwh
                };
                factor(
                    "Energy price",
                    weakest([
                        procurement,
                        &m.truck_energy_kwh,
                        &m.labor_kwh,
                        &m.depreciation_kwh,
                        &m.maintenance_kwh,
                    ]),
                    ImpactLevel::High,
                    "Mobile-charging landed cost components",
                )
            }
            ScenarioType::SelfManagedEv | ScenarioType::Eaas => factor(
                "Energy price",
                weakest([&a.electricity_rate_kwh, &a.demand_charge_kw]),
                ImpactLevel::High,
                a.electricity_rate_kwh.source.clone(),
            ),
        };
        factors.push(energy);

        let maintenance = if electric {
            &a.maintenance_per_mile.electric
        } else {
            &a.maintenance_per_mile.diesel
        };
        factors.push(factor(
            "Maintenance",
            maintenance.classification,
            ImpactLevel::Medium,
            maintenance.source.clone(),
        ));

        if electric {
            let federal = &a.incentives.federal_per_bus;
            factors.push(if eligibility.federal_incentive.applicable && federal.value > 0.0 {
                factor(
                    "Federal incentive",
                    federal.classification,
                    ImpactLevel::High,
                    federal.source.clone(),
                )
            } else {
                factor(
                    "Federal incentive",
                    EvidenceClassification::NotApplicable,
                    ImpactLevel::High,
                    "No federal incentive counted",
                )
            });

            let state = &a.incentives.state_per_bus;
            factors.push(if state.value > 0.0 {
                factor("State incentive", state.classification, ImpactLevel::Medium, state.source.clone())
            } else {
                factor(
                    "State incentive",
                    EvidenceClassification::NotApplicable,
                    ImpactLevel::Medium,
                    "No state incentive counted",
                )
            });

            let mut credits = Vec::new();
            if eligibility.lcfs.applicable {
                credits.push(&a.carbon_credits.lcfs_per_bus);
            }
            if eligibility.federal_carbon.applicable {
                credits.push(&a.carbon_credits.federal_per_bus);
            }
            factors.push(if credits.is_empty() {
                factor(
                    "Carbon credits",
                    EvidenceClassification::NotApplicable,
                    ImpactLevel::Medium,
                    eligibility.lcfs.reason.clone(),
                )
            } else {
                factor(
                    "Carbon credits",
                    weakest(credits),
                    ImpactLevel::Medium,
                    "Credit revenue counted for this jurisdiction",
                )
            });

            factors.push(if eligibility.v2g.applicable {
                factor(
                    "V2G revenue",
                    weakest([
                        &a.v2g.demand_response_per_bus,
                        &a.v2g.frequency_regulation_per_bus,
                        &a.v2g.vpp_per_bus,
                    ]),
                    ImpactLevel::Medium,
                    eligibility.v2g.reason.clone(),
                )
            } else {
                factor(
                    "V2G revenue",
                    EvidenceClassification::NotApplicable,
                    ImpactLevel::Medium,
                    eligibility.v2g.reason.clone(),
                )
            });

            factors.push(factor(
                "Battery replacement",
                a.lifecycle.battery_replacement_cost.classification,
                ImpactLevel::Medium,
                a.lifecycle.battery_replacement_cost.source.clone(),
            ));
        }

        (roll_up(&factors), factors)
    }
}
