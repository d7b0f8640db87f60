//! One-at-a-time sweeps of single assumptions and the tornado ranking.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::variables::{AssumptionVariable, SweepRange};
use crate::engine::TcoEngine;
use crate::error::TcoError;
use crate::model::{ScenarioType, TcoInput};

/// A variable and the range to sweep it over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub variable: AssumptionVariable,
    pub range: SweepRange,
}

impl From<AssumptionVariable> for SensitivityVariable {
    fn from(variable: AssumptionVariable) -> Self {
        Self {
            variable,
            range: variable.default_sweep(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub value: f64,
    pub net_tco: f64,
    pub delta_from_base: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub variable: AssumptionVariable,
    /// The variable's resolved value for this input.
    pub base_value: f64,
    pub base_net_tco: f64,
    pub points: Vec<SensitivityPoint>,
    /// Percent change in net TCO per percent change in the variable, across
    /// the sweep endpoints. `None` when either base is zero.
    pub elasticity: Option<f64>,
}

/// Every sweep of one run, with the ranking derived from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityAnalysis {
    pub scenario_type: ScenarioType,
    pub base_net_tco: f64,
    pub results: Vec<SensitivityResult>,
    /// Widest spread first.
    pub tornado: Vec<TornadoBar>,
}

impl SensitivityAnalysis {
    pub fn result(&self, variable: AssumptionVariable) -> Option<&SensitivityResult> {
        self.results.iter().find(|r| r.variable == variable)
    }
}

/// One bar of a tornado chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TornadoBar {
    pub variable: AssumptionVariable,
    pub low_value: f64,
    pub high_value: f64,
    /// Net TCO change at the low end of the sweep.
    pub low_impact: f64,
    pub high_impact: f64,
    pub spread: f64,
}

/// Ranks sweeps by the absolute spread between their endpoint impacts.
pub fn tornado(results: &[SensitivityResult]) -> Vec<TornadoBar> {
    let mut bars: Vec<TornadoBar> = results
        .iter()
        .filter_map(|r| {
            let (first, last) = (r.points.first()?, r.points.last()?);
            Some(TornadoBar {
                variable: r.variable,
                low_value: first.value,
                high_value: last.value,
                low_impact: first.delta_from_base,
                high_impact: last.delta_from_base,
                spread: (last.delta_from_base - first.delta_from_base).abs(),
            })
        })
        .collect();
    bars.sort_by(|a, b| b.spread.total_cmp(&a.spread));
    bars
}

impl TcoEngine {
    /// Sweeps each variable independently, holding everything else at `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::Validation`] for invalid input or
    /// [`TcoError::InvalidRange`] for a malformed sweep.
    pub fn run_sensitivity_analysis(
        &self,
        input: &TcoInput,
        variables: &[SensitivityVariable],
    ) -> Result<SensitivityAnalysis, TcoError> {
        let base = self.calculate_tco(input)?;
        let base_net_tco = base.total_net_tco;

        let results = variables
            .iter()
            .map(|sv| -> Result<SensitivityResult, TcoError> {
                let base_value = sv.variable.current(&base.assumptions).value;
                let source = format!("Sensitivity sweep of {}", sv.variable);
                let points = sv
                    .range
                    .values()?
                    .into_iter()
                    .map(|value| -> Result<SensitivityPoint, TcoError> {
                        let mut swept = input.clone();
                        swept.overrides = sv.variable.overriding(&input.overrides, value, &source);
                        let net_tco = self.calculate_tco(&swept)?.total_net_tco;
                        Ok(SensitivityPoint {
                            value,
                            net_tco,
                            delta_from_base: net_tco - base_net_tco,
                        })
                    })
                    .collect::<Result<Vec<_>, TcoError>>()?;

                let elasticity = match (points.first(), points.last()) {
                    (Some(lo), Some(hi))
                        if base_value != 0.0 && base_net_tco != 0.0 && hi.value != lo.value =>
                    {
                        let pct_tco = (hi.net_tco - lo.net_tco) / base_net_tco;
                        let pct_var = (hi.value - lo.value) / base_value;
                        Some(pct_tco / pct_var)
                    }
                    _ => None,
                };

                debug!(variable = %sv.variable, points = points.len(), ?elasticity, "sweep complete");
                Ok(SensitivityResult {
                    variable: sv.variable,
                    base_value,
                    base_net_tco,
                    points,
                    elasticity,
                })
            })
            .collect::<Result<Vec<_>, TcoError>>()?;

        Ok(SensitivityAnalysis {
            scenario_type: input.scenario_type,
            base_net_tco,
            tornado: tornado(&results),
            results,
        })
    }
}
