//! Side-by-side comparison of all four scenarios.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use super::TcoEngine;
use crate::error::TcoError;
use crate::model::{ApplicabilityWarning, ComparisonInput, ScenarioType, TcoResult};

/// Headline figures across scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonMetrics {
    pub lowest_gross_tco: ScenarioType,
    pub lowest_net_tco: ScenarioType,
    /// Diesel net TCO minus mobile-charging net TCO.
    pub mobile_savings_vs_diesel: f64,
    pub mobile_savings_vs_self_managed: f64,
    /// Years until mobile charging recovers its extra year-0 capital.
    pub payback_years_vs_diesel: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub diesel: TcoResult,
    pub self_managed: TcoResult,
    pub eaas: TcoResult,
    pub mobile_charging: TcoResult,
    pub metrics: ComparisonMetrics,
    /// Union of scenario warnings, first occurrence of each id kept.
    pub warnings: Vec<ApplicabilityWarning>,
}

impl ScenarioComparison {
    /// Results in comparison order.
    pub fn scenarios(&self) -> [&TcoResult; 4] {
        [&self.diesel, &self.self_managed, &self.eaas, &self.mobile_charging]
    }
}

/// Years for `alt` to recover its extra year-0 capital over `baseline`.
///
/// Interpolates linearly within the crossing year. Returns `None` when the
/// alternative needs no extra capital or never recovers it in the horizon.
pub fn payback_years(baseline: &TcoResult, alt: &TcoResult) -> Option<f64> {
    let (base0, alt0) = (baseline.annual_costs.first()?, alt.annual_costs.first()?);
    let extra_capital = alt0.costs.capital_cost - base0.costs.capital_cost;
    if !(extra_capital > 0.0) {
        return None;
    }

    let mut cumulative = 0.0;
    for (b, a) in baseline.annual_costs.iter().zip(&alt.annual_costs).skip(1) {
        let savings = b.costs.net_cost - a.costs.net_cost;
        let before = cumulative;
        cumulative += savings;
        if savings > 0.0 && cumulative >= extra_capital {
            let fraction = (extra_capital - before) / savings;
            return Some(f64::from(a.costs.year) - 1.0 + fraction);
        }
    }
    None
}

impl TcoEngine {
    /// Costs every scenario for the same fleet and compares them.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::Validation`] if the shared input is invalid.
    pub fn compare_scenarios(&self, input: &ComparisonInput) -> Result<ScenarioComparison, TcoError> {
        let [diesel, self_managed, eaas, mobile_charging] = ScenarioType::ALL
            .map(|t| self.calculate_tco(&input.for_scenario(t)));
        let (diesel, self_managed, eaas, mobile_charging) =
            (diesel?, self_managed?, eaas?, mobile_charging?);

        let all = [&diesel, &self_managed, &eaas, &mobile_charging];
        let lowest_gross_tco = all
            .iter()
            .min_by(|a, b| a.total_tco.total_cmp(&b.total_tco))
            .map_or(ScenarioType::DieselBaseline, |r| r.scenario_type);
        let lowest_net_tco = all
            .iter()
            .min_by(|a, b| a.total_net_tco.total_cmp(&b.total_net_tco))
            .map_or(ScenarioType::DieselBaseline, |r| r.scenario_type);

        let mut seen = HashSet::new();
        let warnings: Vec<ApplicabilityWarning> = all
            .iter()
            .flat_map(|r| r.warnings.iter())
            .filter(|w| seen.insert(w.id.clone()))
            .cloned()
            .collect();

        let metrics = ComparisonMetrics {
            lowest_gross_tco,
            lowest_net_tco,
            mobile_savings_vs_diesel: diesel.total_net_tco - mobile_charging.total_net_tco,
            mobile_savings_vs_self_managed: self_managed.total_net_tco
                - mobile_charging.total_net_tco,
            payback_years_vs_diesel: payback_years(&diesel, &mobile_charging),
        };

        info!(
            lowest_gross = %metrics.lowest_gross_tco,
            lowest_net = %metrics.lowest_net_tco,
            savings_vs_diesel = metrics.mobile_savings_vs_diesel,
            warnings = warnings.len(),
            "scenarios compared"
        );

        Ok(ScenarioComparison {
            diesel,
            self_managed,
            eaas,
            mobile_charging,
            metrics,
            warnings,
        })
    }
}
