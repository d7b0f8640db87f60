//! Named adverse scenarios and their impact on net TCO.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::info;

use crate::engine::TcoEngine;
use crate::error::TcoError;
use crate::model::{AssumptionOverrides, DataPoint, EvidenceClassification, ScenarioType, TcoInput, TcoResult};

/// Impact above which a stress result is flagged as a budget risk, in percent.
const MATERIAL_IMPACT_PCT: f64 = 20.0;
const CRITICAL_IMPACT_PCT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StressTestId {
    BaseCase,
    EpaFundingFreeze,
    ElectricityRateSpike,
    OemBankruptcy,
    CounterpartyFailure,
    ColdWeatherHigh,
    DemandChargeSpike,
}

impl StressTestId {
    pub const ALL: [StressTestId; 7] = [
        Self::BaseCase,
        Self::EpaFundingFreeze,
        Self::ElectricityRateSpike,
        Self::OemBankruptcy,
        Self::CounterpartyFailure,
        Self::ColdWeatherHigh,
        Self::DemandChargeSpike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BaseCase => "BASE_CASE",
            Self::EpaFundingFreeze => "EPA_FUNDING_FREEZE",
            Self::ElectricityRateSpike => "ELECTRICITY_RATE_SPIKE",
            Self::OemBankruptcy => "OEM_BANKRUPTCY",
            Self::CounterpartyFailure => "COUNTERPARTY_FAILURE",
            Self::ColdWeatherHigh => "COLD_WEATHER_HIGH",
            Self::DemandChargeSpike => "DEMAND_CHARGE_SPIKE",
        }
    }
}

impl fmt::Display for StressTestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StressTestId {
    type Err = TcoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == norm)
            .ok_or_else(|| TcoError::UnknownStressTest(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Tier for the worst stress impact, in percent of base net TCO.
    pub fn from_impact_pct(pct: f64) -> Self {
        if pct < 10.0 {
            Self::Low
        } else if pct < 25.0 {
            Self::Medium
        } else if pct < 50.0 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        })
    }
}

/// Adjustments a stress test applies on top of the caller's assumptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StressModifiers {
    pub federal_incentive_multiplier: Option<f64>,
    pub state_incentive_multiplier: Option<f64>,
    pub electricity_rate_multiplier: Option<f64>,
    pub demand_charge_multiplier: Option<f64>,
    pub battery_cost_multiplier: Option<f64>,
    /// Mobile charging falls back to a self-managed depot.
    pub counterparty_fallback: bool,
    pub weather_derating_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressScenario {
    pub id: StressTestId,
    pub name: &'static str,
    pub description: &'static str,
    pub probability: f64,
    pub severity: RiskLevel,
    pub modifiers: StressModifiers,
}

/// The built-in stress catalog, base case first.
pub fn stress_scenarios() -> Vec<StressScenario> {
    vec![
        StressScenario {
            id: StressTestId::BaseCase,
            name: "Base case",
            description: "Assumptions as entered",
            probability: 0.0,
            severity: RiskLevel::Low,
            modifiers: StressModifiers::default(),
        },
        StressScenario {
            id: StressTestId::EpaFundingFreeze,
            name: "EPA funding freeze",
            description: "Federal grant round cancelled; state programs cut in half",
            probability: 0.15,
            severity: RiskLevel::Critical,
            modifiers: StressModifiers {
                federal_incentive_multiplier: Some(0.0),
                state_incentive_multiplier: Some(0.5),
                ..StressModifiers::default()
            },
        },
        StressScenario {
            id: StressTestId::ElectricityRateSpike,
            name: "Electricity rate spike",
            description: "Energy and demand rates rise 50%",
            probability: 0.20,
            severity: RiskLevel::High,
            modifiers: StressModifiers {
                electricity_rate_multiplier: Some(1.5),
                demand_charge_multiplier: Some(1.5),
                ..StressModifiers::default()
            },
        },
        StressScenario {
            id: StressTestId::OemBankruptcy,
            name: "OEM bankruptcy",
            description: "Warranty lost; battery replacement costs double",
            probability: 0.10,
            severity: RiskLevel::High,
            modifiers: StressModifiers {
                battery_cost_multiplier: Some(2.0),
                ..StressModifiers::default()
            },
        },
        StressScenario {
            id: StressTestId::CounterpartyFailure,
            name: "Charging provider failure",
            description: "Mobile charging provider exits; district builds its own depot",
            probability: 0.08,
            severity: RiskLevel::High,
            modifiers: StressModifiers {
                counterparty_fallback: true,
                ..StressModifiers::default()
            },
        },
        StressScenario {
            id: StressTestId::ColdWeatherHigh,
            name: "Severe winter",
            description: "Range loss of 38% across the fleet",
            probability: 0.25,
            severity: RiskLevel::Medium,
            modifiers: StressModifiers {
                weather_derating_override: Some(0.38),
                ..StressModifiers::default()
            },
        },
        StressScenario {
            id: StressTestId::DemandChargeSpike,
            name: "Demand charge spike",
            description: "Utility doubles demand charges",
            probability: 0.15,
            severity: RiskLevel::Medium,
            modifiers: StressModifiers {
                demand_charge_multiplier: Some(2.0),
                ..StressModifiers::default()
            },
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressResult {
    pub id: StressTestId,
    pub name: &'static str,
    pub probability: f64,
    pub severity: RiskLevel,
    pub base_net_tco: f64,
    pub stressed_net_tco: f64,
    pub impact_delta: f64,
    pub impact_pct: f64,
    pub stressed: TcoResult,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StressSuite {
    pub base: TcoResult,
    /// Every non-base stress test, in catalog order.
    pub results: Vec<StressResult>,
    pub worst_case: Option<StressTestId>,
    /// Probability-weighted net TCO; residual mass goes to the base case.
    pub expected_net_tco: f64,
    pub risk_level: RiskLevel,
}

fn stressed(value: &DataPoint, multiplier: f64, id: StressTestId) -> Option<DataPoint> {
    Some(DataPoint::new(
        value.value * multiplier,
        EvidenceClassification::Unverified,
        format!("Stress test {id}"),
    ))
}

impl TcoEngine {
    /// `input` with the stress modifiers layered over its overrides.
    pub fn stressed_input(&self, input: &TcoInput, scenario: &StressScenario) -> TcoInput {
        let m = &scenario.modifiers;
        let id = scenario.id;
        let resolved = self
            .defaults()
            .resolve(&input.fleet, &input.location, &input.overrides);

        let mut patch = AssumptionOverrides::default();
        if let Some(x) = m.federal_incentive_multiplier {
            patch.incentives.federal_per_bus = stressed(&resolved.incentives.federal_per_bus, x, id);
        }
        if let Some(x) = m.state_incentive_multiplier {
            patch.incentives.state_per_bus = stressed(&resolved.incentives.state_per_bus, x, id);
        }
        if let Some(x) = m.electricity_rate_multiplier {
            patch.electricity_rate_kwh = stressed(&resolved.electricity_rate_kwh, x, id);
        }
        if let Some(x) = m.demand_charge_multiplier {
            patch.demand_charge_kw = stressed(&resolved.demand_charge_kw, x, id);
        }
        if let Some(x) = m.battery_cost_multiplier {
            patch.lifecycle.battery_replacement_cost =
                stressed(&resolved.lifecycle.battery_replacement_cost, x, id);
        }
        if let Some(v) = m.weather_derating_override {
            patch.weather_derating = Some(DataPoint::new(
                v,
                EvidenceClassification::Unverified,
                format!("Stress test {id}"),
            ));
        }

        let mut next = input.clone();
        next.overrides.overlay(&patch);
        if m.counterparty_fallback && next.scenario_type == ScenarioType::MobileCharging {
            next.scenario_type = ScenarioType::SelfManagedEv;
        }
        next
    }

    /// Net TCO of the diesel baseline for an electric `input`. Stress
    /// modifiers never touch diesel inputs, so one baseline serves a suite.
    fn diesel_net_tco(&self, input: &TcoInput) -> Result<Option<f64>, TcoError> {
        if !input.scenario_type.is_electric() {
            return Ok(None);
        }
        let diesel = input.without_scenario().for_scenario(ScenarioType::DieselBaseline);
        Ok(Some(self.calculate_tco(&diesel)?.total_net_tco))
    }

    fn stress_against(
        &self,
        input: &TcoInput,
        base: &TcoResult,
        diesel_net_tco: Option<f64>,
        scenario: &StressScenario,
    ) -> Result<StressResult, TcoError> {
        let stressed = self.calculate_tco(&self.stressed_input(input, scenario))?;
        let impact_delta = stressed.total_net_tco - base.total_net_tco;
        let impact_pct = impact_delta / base.total_net_tco * 100.0;

        let mut warnings = Vec::new();
        if impact_pct > CRITICAL_IMPACT_PCT {
            warnings.push(format!(
                "{} increases net TCO by {impact_pct:.1}%: critical exposure",
                scenario.name
            ));
        } else if impact_pct > MATERIAL_IMPACT_PCT {
            warnings.push(format!(
                "{} increases net TCO by {impact_pct:.1}%: significant budget risk",
                scenario.name
            ));
        }
        if scenario.modifiers.counterparty_fallback
            && input.scenario_type == ScenarioType::MobileCharging
        {
            warnings.push("Mobile charging unavailable; costed as a self-managed depot".into());
        }
        if let Some(diesel) = diesel_net_tco {
            if scenario.id != StressTestId::BaseCase && stressed.total_net_tco > diesel {
                warnings.push(format!(
                    "Electric fleet may not be economical under {}: net TCO {:.0} exceeds the diesel baseline {diesel:.0}",
                    scenario.name, stressed.total_net_tco
                ));
            }
        }

        Ok(StressResult {
            id: scenario.id,
            name: scenario.name,
            probability: scenario.probability,
            severity: scenario.severity,
            base_net_tco: base.total_net_tco,
            stressed_net_tco: stressed.total_net_tco,
            impact_delta,
            impact_pct,
            stressed,
            warnings,
        })
    }

    /// Runs one named stress test against `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::Validation`] for invalid input.
    pub fn run_stress_test(&self, input: &TcoInput, id: StressTestId) -> Result<StressResult, TcoError> {
        let catalog = stress_scenarios();
        let scenario = catalog
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| TcoError::UnknownStressTest(id.to_string()))?;
        let base = self.calculate_tco(input)?;
        let diesel = self.diesel_net_tco(input)?;
        self.stress_against(input, &base, diesel, scenario)
    }

    /// Runs every non-base stress test and summarises the exposure.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::Validation`] for invalid input.
    pub fn run_all_stress_tests(&self, input: &TcoInput) -> Result<StressSuite, TcoError> {
        let base = self.calculate_tco(input)?;
        let diesel = self.diesel_net_tco(input)?;
        let results = stress_scenarios()
            .iter()
            .filter(|s| s.id != StressTestId::BaseCase)
            .map(|s| self.stress_against(input, &base, diesel, s))
            .collect::<Result<Vec<_>, _>>()?;

        let worst = results
            .iter()
            .max_by(|a, b| a.impact_delta.total_cmp(&b.impact_delta));
        let worst_case = worst.map(|r| r.id);
        let worst_pct = worst.map_or(0.0, |r| r.impact_pct);

        let total_p: f64 = results.iter().map(|r| r.probability).sum();
        let residual = (1.0 - total_p).max(0.0);
        let expected_net_tco = base.total_net_tco * residual
            + results
                .iter()
                .map(|r| r.probability * r.stressed_net_tco)
                .sum::<f64>();
        let risk_level = RiskLevel::from_impact_pct(worst_pct);

        info!(
            scenario = %input.scenario_type,
            worst = ?worst_case,
            worst_pct,
            ?risk_level,
            "stress suite complete"
        );

        Ok(StressSuite {
            base,
            results,
            worst_case,
            expected_net_tco,
            risk_level,
        })
    }
}
