//! The closed set of assumptions that analyses may vary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TcoError;
use crate::model::{AssumptionOverrides, DataPoint, EvidenceClassification, TcoAssumptions};

/// An assumption addressable by sensitivity, break-even, and Monte Carlo runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionVariable {
    ElectricityRateKwh,
    DieselPricePerGallon,
    FederalIncentivePerBus,
    DemandChargeKw,
    BatteryReplacementCost,
    StateIncentivePerBus,
    RevenueCaptureRate,
    WeatherDerating,
}

/// Inclusive sweep `min, min + step, ..., <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

const MAX_SWEEP_POINTS: usize = 10_000;

impl SweepRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// The sweep values, computed by index so they do not drift.
    ///
    /// # Errors
    ///
    /// Returns [`TcoError::InvalidRange`] for a non-positive step, an
    /// inverted range, non-finite bounds, or an excessive point count.
    pub fn values(&self) -> Result<Vec<f64>, TcoError> {
        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            return Err(TcoError::invalid_range("sweep", "bounds and step must be finite"));
        }
        if self.step <= 0.0 {
            return Err(TcoError::invalid_range("sweep", format!("step must be positive (got {})", self.step)));
        }
        if self.min > self.max {
            return Err(TcoError::invalid_range(
                "sweep",
                format!("min {} exceeds max {}", self.min, self.max),
            ));
        }
        let span = ((self.max - self.min) / self.step + 1e-9).floor();
        if span >= MAX_SWEEP_POINTS as f64 {
            return Err(TcoError::invalid_range(
                "sweep",
                format!("more than {MAX_SWEEP_POINTS} points"),
            ));
        }
        let n = span as usize + 1;
        Ok((0..n).map(|i| self.min + i as f64 * self.step).collect())
    }
}

impl AssumptionVariable {
    pub const ALL: [AssumptionVariable; 8] = [
        Self::ElectricityRateKwh,
        Self::DieselPricePerGallon,
        Self::FederalIncentivePerBus,
        Self::DemandChargeKw,
        Self::BatteryReplacementCost,
        Self::StateIncentivePerBus,
        Self::RevenueCaptureRate,
        Self::WeatherDerating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ElectricityRateKwh => "electricity_rate_kwh",
            Self::DieselPricePerGallon => "diesel_price_per_gallon",
            Self::FederalIncentivePerBus => "federal_incentive_per_bus",
            Self::DemandChargeKw => "demand_charge_kw",
            Self::BatteryReplacementCost => "battery_replacement_cost",
            Self::StateIncentivePerBus => "state_incentive_per_bus",
            Self::RevenueCaptureRate => "revenue_capture_rate",
            Self::WeatherDerating => "weather_derating",
        }
    }

    /// Sweep used when no range is given.
    pub fn default_sweep(self) -> SweepRange {
        match self {
            Self::ElectricityRateKwh => SweepRange::new(0.08, 0.25, 0.02),
            Self::DieselPricePerGallon => SweepRange::new(2.5, 6.0, 0.5),
            Self::FederalIncentivePerBus => SweepRange::new(0.0, 375_000.0, 50_000.0),
            Self::DemandChargeKw => SweepRange::new(5.0, 30.0, 5.0),
            Self::BatteryReplacementCost => SweepRange::new(25_000.0, 100_000.0, 12_500.0),
            Self::StateIncentivePerBus => SweepRange::new(0.0, 150_000.0, 25_000.0),
            Self::RevenueCaptureRate => SweepRange::new(0.4, 1.0, 0.1),
            Self::WeatherDerating => SweepRange::new(0.0, 0.4, 0.05),
        }
    }

    /// Variables swept by a default sensitivity run.
    pub fn sensitivity_defaults() -> [AssumptionVariable; 5] {
        [
            Self::ElectricityRateKwh,
            Self::DieselPricePerGallon,
            Self::FederalIncentivePerBus,
            Self::DemandChargeKw,
            Self::BatteryReplacementCost,
        ]
    }

    pub fn current(self, a: &TcoAssumptions) -> &DataPoint {
        match self {
            Self::ElectricityRateKwh => &a.electricity_rate_kwh,
            Self::DieselPricePerGallon => &a.diesel_price_per_gallon,
            Self::FederalIncentivePerBus => &a.incentives.federal_per_bus,
            Self::DemandChargeKw => &a.demand_charge_kw,
            Self::BatteryReplacementCost => &a.lifecycle.battery_replacement_cost,
            Self::StateIncentivePerBus => &a.incentives.state_per_bus,
            Self::RevenueCaptureRate => &a.revenue_capture_rate,
            Self::WeatherDerating => &a.weather_derating,
        }
    }

    fn slot(self, o: &mut AssumptionOverrides) -> &mut Option<DataPoint> {
        match self {
            Self::ElectricityRateKwh => &mut o.electricity_rate_kwh,
            Self::DieselPricePerGallon => &mut o.diesel_price_per_gallon,
            Self::FederalIncentivePerBus => &mut o.incentives.federal_per_bus,
            Self::DemandChargeKw => &mut o.demand_charge_kw,
            Self::BatteryReplacementCost => &mut o.lifecycle.battery_replacement_cost,
            Self::StateIncentivePerBus => &mut o.incentives.state_per_bus,
            Self::RevenueCaptureRate => &mut o.revenue_capture_rate,
            Self::WeatherDerating => &mut o.weather_derating,
        }
    }

    /// Whether the value depends on an award or program enrollment.
    pub fn is_contingent(self) -> bool {
        matches!(self, Self::FederalIncentivePerBus | Self::StateIncentivePerBus)
    }

    /// `base` with this variable set to `value`.
    pub fn overriding(self, base: &AssumptionOverrides, value: f64, source: &str) -> AssumptionOverrides {
        let classification = if self.is_contingent() {
            EvidenceClassification::Contingent
        } else {
            EvidenceClassification::Assumed
        };
        let mut next = base.clone();
        *self.slot(&mut next) = Some(DataPoint::new(value, classification, source));
        next
    }
}

impl fmt::Display for AssumptionVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssumptionVariable {
    type Err = TcoError;

    /// Accepts `snake_case` or `camelCase` names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().replace('_', "") == norm)
            .ok_or_else(|| TcoError::UnknownVariable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!(
            "electricityRateKwh".parse::<AssumptionVariable>().expect("camel"),
            AssumptionVariable::ElectricityRateKwh
        );
        assert_eq!(
            "battery_replacement_cost".parse::<AssumptionVariable>().expect("snake"),
            AssumptionVariable::BatteryReplacementCost
        );
        assert_eq!(
            "fuel".parse::<AssumptionVariable>(),
            Err(TcoError::UnknownVariable("fuel".into()))
        );
    }

    #[test]
    fn sweep_includes_both_endpoints() {
        let values = SweepRange::new(0.08, 0.24, 0.02).values().expect("valid");
        assert_eq!(values.len(), 9);
        assert_eq!(values[0], 0.08);
        assert!((values[8] - 0.24).abs() < 1e-12);

        let single = SweepRange::new(3.0, 3.0, 0.5).values().expect("valid");
        assert_eq!(single, vec![3.0]);
    }

    #[test]
    fn bad_sweeps_rejected() {
        assert!(SweepRange::new(0.0, 1.0, 0.0).values().is_err());
        assert!(SweepRange::new(1.0, 0.0, 0.1).values().is_err());
        assert!(SweepRange::new(0.0, 1.0, 1e-9).values().is_err());
    }

    #[test]
    fn overriding_touches_one_slot() {
        let base = AssumptionOverrides::default();
        let next = AssumptionVariable::DemandChargeKw.overriding(&base, 22.0, "test");
        assert_eq!(next.demand_charge_kw.as_ref().map(|d| d.value), Some(22.0));
        assert!(next.electricity_rate_kwh.is_none());
        assert_eq!(
            next.demand_charge_kw.as_ref().map(|d| d.classification),
            Some(EvidenceClassification::Assumed)
        );
    }

    #[test]
    fn swept_incentives_stay_contingent() {
        let next = AssumptionVariable::FederalIncentivePerBus.overriding(
            &AssumptionOverrides::default(),
            150_000.0,
            "sweep",
        );
        assert_eq!(
            next.incentives.federal_per_bus.as_ref().map(|d| d.classification),
            Some(EvidenceClassification::Contingent)
        );
    }
}
