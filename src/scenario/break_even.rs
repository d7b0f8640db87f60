//! Locates the value of one assumption at which an electric scenario and
//! diesel cost the same.

use serde::Serialize;
use tracing::debug;

use super::variables::{AssumptionVariable, SweepRange};
use crate::engine::TcoEngine;
use crate::error::TcoError;
use crate::model::{ComparisonInput, ScenarioType};

/// How close the crossing sits to the start of the swept range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensitivityTier {
    /// Crossing in the first 30% of the range.
    High,
    Medium,
    /// Crossing beyond 70% of the range.
    Low,
}

impl SensitivityTier {
    fn from_position(position: f64) -> Self {
        if position < 0.3 {
            Self::High
        } else if position > 0.7 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakEvenResult {
    pub variable: AssumptionVariable,
    pub target: ScenarioType,
    pub found: bool,
    /// Midpoint of the step where the cost difference changed sign.
    pub value: Option<f64>,
    pub sensitivity_tier: Option<SensitivityTier>,
    pub details: String,
}

/// Sweeps used by [`TcoEngine::find_all_break_even_points`].
pub const BREAK_EVEN_SWEEPS: [(AssumptionVariable, SweepRange); 3] = [
    (AssumptionVariable::ElectricityRateKwh, SweepRange::new(0.05, 0.40, 0.01)),
    (AssumptionVariable::DieselPricePerGallon, SweepRange::new(2.0, 8.0, 0.1)),
    (AssumptionVariable::FederalIncentivePerBus, SweepRange::new(0.0, 400_000.0, 10_000.0)),
];

impl TcoEngine {
    /// Target net TCO minus diesel net TCO with `variable` set to `value`.
    fn net_gap(
        &self,
        input: &ComparisonInput,
        variable: AssumptionVariable,
        value: f64,
        target: ScenarioType,
    ) -> Result<f64, TcoError> {
        let mut swept = input.clone();
        swept.overrides = variable.overriding(&input.overrides, value, "Break-even sweep");
        let diesel = self.calculate_tco(&swept.for_scenario(ScenarioType::DieselBaseline))?;
        let alt = self.calculate_tco(&swept.for_scenario(target))?;
        Ok(alt.total_net_tco - diesel.total_net_tco)
    }

    /// Finds where `target` and diesel net TCO cross as `variable` sweeps `range`.
    ///
    /// Both scenarios are recomputed at every step. No value is extrapolated
    /// beyond the range: if the sign never changes, `found` is false.
    ///
    /// # Errors
    ///
    /// [`TcoError::InvalidRange`] for a diesel target or a malformed sweep;
    /// [`TcoError::Validation`] for invalid input.
    pub fn find_break_even_point(
        &self,
        input: &ComparisonInput,
        variable: AssumptionVariable,
        range: SweepRange,
        target: ScenarioType,
    ) -> Result<BreakEvenResult, TcoError> {
        if !target.is_electric() {
            return Err(TcoError::invalid_range(
                "target",
                "break-even target must be an electric scenario",
            ));
        }
        let values = range.values()?;

        let mut prev: Option<(f64, f64)> = None;
        let mut crossing = None;
        for value in values {
            let gap = self.net_gap(input, variable, value, target)?;
            if gap == 0.0 {
                crossing = Some(value);
                break;
            }
            if let Some((_, prev_gap)) = prev {
                if prev_gap.signum() != gap.signum() {
                    crossing = Some(value - range.step / 2.0);
                    break;
                }
            }
            prev = Some((value, gap));
        }

        let span = range.max - range.min;
        let result = match crossing {
            Some(value) => {
                let position = if span > 0.0 { (value - range.min) / span } else { 0.0 };
                BreakEvenResult {
                    variable,
                    target,
                    found: true,
                    value: Some(value),
                    sensitivity_tier: Some(SensitivityTier::from_position(position)),
                    details: format!(
                        "{} matches diesel net TCO at {variable} ≈ {value:.4}",
                        target.label()
                    ),
                }
            }
            None => BreakEvenResult {
                variable,
                target,
                found: false,
                value: None,
                sensitivity_tier: None,
                details: format!(
                    "No break-even for {variable} between {} and {}",
                    range.min, range.max
                ),
            },
        };
        debug!(%variable, %target, found = result.found, value = ?result.value, "break-even search");
        Ok(result)
    }

    /// Break-even search over electricity rate, diesel price, and federal incentive.
    ///
    /// # Errors
    ///
    /// As [`TcoEngine::find_break_even_point`].
    pub fn find_all_break_even_points(
        &self,
        input: &ComparisonInput,
        target: ScenarioType,
    ) -> Result<Vec<BreakEvenResult>, TcoError> {
        BREAK_EVEN_SWEEPS
            .iter()
            .map(|(variable, range)| self.find_break_even_point(input, *variable, *range, target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FleetProfile, LocationProfile};

    fn input() -> ComparisonInput {
        ComparisonInput {
            fleet: FleetProfile {
                type_c_count: 25,
                ..FleetProfile::default()
            },
            location: LocationProfile::default(),
            ..ComparisonInput::default()
        }
    }

    #[test]
    fn tier_by_position() {
        assert_eq!(SensitivityTier::from_position(0.1), SensitivityTier::High);
        assert_eq!(SensitivityTier::from_position(0.5), SensitivityTier::Medium);
        assert_eq!(SensitivityTier::from_position(0.9), SensitivityTier::Low);
    }

    #[test]
    fn diesel_target_rejected() {
        let err = TcoEngine::default()
            .find_break_even_point(
                &input(),
                AssumptionVariable::DieselPricePerGallon,
                SweepRange::new(2.0, 8.0, 0.5),
                ScenarioType::DieselBaseline,
            )
            .expect_err("diesel target");
        assert!(matches!(err, TcoError::InvalidRange { .. }));
    }

    #[test]
    fn found_crossing_lies_inside_range_and_flips_sign() {
        let engine = TcoEngine::default();
        let range = SweepRange::new(0.0, 1_500_000.0, 25_000.0);
        let result = engine
            .find_break_even_point(
                &input(),
                AssumptionVariable::FederalIncentivePerBus,
                range,
                ScenarioType::SelfManagedEv,
            )
            .expect("valid");
        assert!(result.found, "{}", result.details);
        let value = result.value.expect("found");
        assert!(value > range.min && value < range.max);
        let below = engine
            .net_gap(&input(), AssumptionVariable::FederalIncentivePerBus, value - range.step / 2.0, ScenarioType::SelfManagedEv)
            .expect("valid");
        let above = engine
            .net_gap(&input(), AssumptionVariable::FederalIncentivePerBus, value + range.step / 2.0, ScenarioType::SelfManagedEv)
            .expect("valid");
        assert!(below.signum() != above.signum());
    }

    #[test]
    fn no_crossing_is_not_extrapolated() {
        let result = TcoEngine::default()
            .find_break_even_point(
                &input(),
                AssumptionVariable::DemandChargeKw,
                SweepRange::new(5.0, 6.0, 0.5),
                ScenarioType::MobileCharging,
            )
            .expect("valid");
        assert!(!result.found);
        assert!(result.value.is_none());
        assert!(result.sensitivity_tier.is_none());
    }

    #[test]
    fn batch_covers_three_variables() {
        let results = TcoEngine::default()
            .find_all_break_even_points(&input(), ScenarioType::MobileCharging)
            .expect("valid");
        let vars: Vec<_> = results.iter().map(|r| r.variable).collect();
        assert_eq!(
            vars,
            vec![
                AssumptionVariable::ElectricityRateKwh,
                AssumptionVariable::DieselPricePerGallon,
                AssumptionVariable::FederalIncentivePerBus,
            ]
        );
    }
}
