//! Monte Carlo sampling of uncertain assumptions.
//!
//! Samples are drawn with `rand`; normal draws use the Box-Muller
//! transform and triangular draws the inverse CDF. Iterations are
//! independent and sorted before statistics are taken, so the summary does
//! not depend on evaluation order.

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::variables::AssumptionVariable;
use crate::engine::TcoEngine;
use crate::error::TcoError;
use crate::model::TcoInput;

pub const DEFAULT_ITERATIONS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std_dev: f64 },
    Uniform { min: f64, max: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
}

impl Distribution {
    fn validate(&self) -> Result<(), TcoError> {
        let ok = match *self {
            Self::Normal { mean, std_dev } => mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0,
            Self::Uniform { min, max } => min.is_finite() && max.is_finite() && min <= max,
            Self::Triangular { min, mode, max } => {
                min.is_finite() && max.is_finite() && min <= mode && mode <= max
            }
        };
        if ok {
            Ok(())
        } else {
            Err(TcoError::invalid_range(
                "distribution",
                format!("inconsistent parameters: {self:?}"),
            ))
        }
    }

    /// Draws one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Normal { mean, std_dev } => {
                // Clamp u1 away from 0 so ln() stays finite.
                let u1: f64 = rng.random::<f64>().max(1e-12);
                let u2: f64 = rng.random::<f64>();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
                mean + z * std_dev
            }
            Self::Uniform { min, max } => min + rng.random::<f64>() * (max - min),
            Self::Triangular { min, mode, max } => {
                let span = max - min;
                if span == 0.0 {
                    return min;
                }
                let u: f64 = rng.random();
                let cut = (mode - min) / span;
                if u < cut {
                    min + (u * span * (mode - min)).sqrt()
                } else {
                    max - ((1.0 - u) * span * (max - mode)).sqrt()
                }
            }
        }
    }
}

/// An assumption and the distribution it is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloVariable {
    pub variable: AssumptionVariable,
    pub distribution: Distribution,
}

impl FromStr for MonteCarloVariable {
    type Err = TcoError;

    /// Parses `name:normal:mean:sd`, `name:uniform:min:max`, or
    /// `name:triangular:min:mode:max`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let bad = |msg: &str| TcoError::Config {
            field: "monte_carlo".into(),
            message: format!("`{s}`: {msg}"),
        };
        let (name, kind, params) = match parts.as_slice() {
            [name, kind, params @ ..] => (*name, *kind, params),
            _ => return Err(bad("expected name:distribution:params")),
        };
        let variable: AssumptionVariable = name.parse()?;
        let nums = params
            .iter()
            .map(|p| p.parse::<f64>().map_err(|_| bad("parameters must be numbers")))
            .collect::<Result<Vec<_>, _>>()?;
        let distribution = match (kind.to_ascii_lowercase().as_str(), nums.as_slice()) {
            ("normal", [mean, std_dev]) => Distribution::Normal {
                mean: *mean,
                std_dev: *std_dev,
            },
            ("uniform", [min, max]) => Distribution::Uniform { min: *min, max: *max },
            ("triangular", [min, mode, max]) => Distribution::Triangular {
                min: *min,
                mode: *mode,
                max: *max,
            },
            _ => return Err(bad("unknown distribution or wrong parameter count")),
        };
        Ok(Self {
            variable,
            distribution,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloSummary {
    pub iterations: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub ci95_low: f64,
    pub ci95_high: f64,
    /// Net TCO per iteration, ascending.
    pub samples: Vec<f64>,
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

impl MonteCarloSummary {
    fn from_samples(mut samples: Vec<f64>) -> Self {
        samples.sort_by(f64::total_cmp);
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Self {
            iterations: samples.len(),
            mean,
            std_dev: variance.sqrt(),
            min: samples[0],
            max: samples[samples.len() - 1],
            p5: percentile(&samples, 0.05),
            p25: percentile(&samples, 0.25),
            p50: percentile(&samples, 0.50),
            p75: percentile(&samples, 0.75),
            p95: percentile(&samples, 0.95),
            ci95_low: percentile(&samples, 0.025),
            ci95_high: percentile(&samples, 0.975),
            samples,
        }
    }
}

impl TcoEngine {
    /// Runs `iterations` draws using the thread-local generator.
    ///
    /// # Errors
    ///
    /// See [`TcoEngine::run_monte_carlo_with_rng`].
    pub fn run_monte_carlo_simulation(
        &self,
        input: &TcoInput,
        variables: &[MonteCarloVariable],
        iterations: usize,
    ) -> Result<MonteCarloSummary, TcoError> {
        self.run_monte_carlo_with_rng(input, variables, iterations, &mut rand::rng())
    }

    /// Runs `iterations` draws from `rng`. Each iteration samples every
    /// variable independently and costs the scenario with those values.
    /// Negative draws are floored at zero.
    ///
    /// # Errors
    ///
    /// [`TcoError::InvalidRange`] for zero iterations or inconsistent
    /// distribution parameters; [`TcoError::Validation`] for invalid input.
    pub fn run_monte_carlo_with_rng<R: Rng + ?Sized>(
        &self,
        input: &TcoInput,
        variables: &[MonteCarloVariable],
        iterations: usize,
        rng: &mut R,
    ) -> Result<MonteCarloSummary, TcoError> {
        if iterations == 0 {
            return Err(TcoError::invalid_range("iterations", "must be at least 1"));
        }
        for v in variables {
            v.distribution.validate()?;
        }
        // Surface validation errors once instead of per iteration.
        self.calculate_tco(input)?;

        let mut samples = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let mut trial = input.clone();
            for v in variables {
                let value = v.distribution.sample(rng).max(0.0);
                trial.overrides = v.variable.overriding(&trial.overrides, value, "Monte Carlo draw");
            }
            samples.push(self.calculate_tco(&trial)?.total_net_tco);
        }

        let summary = MonteCarloSummary::from_samples(samples);
        info!(
            scenario = %input.scenario_type,
            iterations,
            mean = summary.mean,
            p5 = summary.p5,
            p95 = summary.p95,
            "monte carlo complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::{FleetProfile, LocationProfile, ScenarioType};

    fn input() -> TcoInput {
        TcoInput {
            scenario_type: ScenarioType::SelfManagedEv,
            fleet: FleetProfile {
                type_c_count: 25,
                ..FleetProfile::default()
            },
            location: LocationProfile::default(),
            parameters: Default::default(),
            overrides: Default::default(),
        }
    }

    #[test]
    fn zero_spread_reproduces_base_case() {
        let engine = TcoEngine::default();
        let base = engine.calculate_tco(&input()).expect("valid");
        let vars = [MonteCarloVariable {
            variable: AssumptionVariable::ElectricityRateKwh,
            distribution: Distribution::Normal {
                mean: 0.11,
                std_dev: 0.0,
            },
        }];
        let mut rng = StdRng::seed_from_u64(7);
        let summary = engine
            .run_monte_carlo_with_rng(&input(), &vars, 50, &mut rng)
            .expect("valid");
        assert!(summary.samples.iter().all(|s| *s == base.total_net_tco));
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.p5, summary.p95);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let engine = TcoEngine::default();
        let vars = [MonteCarloVariable {
            variable: AssumptionVariable::DieselPricePerGallon,
            distribution: Distribution::Triangular {
                min: 2.5,
                mode: 3.5,
                max: 6.0,
            },
        }];
        let run = |seed| {
            engine
                .run_monte_carlo_with_rng(&input(), &vars, 20, &mut StdRng::seed_from_u64(seed))
                .expect("valid")
        };
        assert_eq!(run(42).samples, run(42).samples);
    }

    #[test]
    fn percentiles_are_ordered() {
        let engine = TcoEngine::default();
        let vars = [MonteCarloVariable {
            variable: AssumptionVariable::FederalIncentivePerBus,
            distribution: Distribution::Uniform {
                min: 0.0,
                max: 375_000.0,
            },
        }];
        let mut rng = StdRng::seed_from_u64(1);
        let s = engine
            .run_monte_carlo_with_rng(&input(), &vars, 200, &mut rng)
            .expect("valid");
        assert_eq!(s.iterations, 200);
        assert!(s.min <= s.ci95_low && s.ci95_low <= s.p5);
        assert!(s.p5 <= s.p25 && s.p25 <= s.p50 && s.p50 <= s.p75 && s.p75 <= s.p95);
        assert!(s.p95 <= s.ci95_high && s.ci95_high <= s.max);
        assert!(s.std_dev > 0.0);
    }

    #[test]
    fn samples_stay_inside_triangular_support() {
        let d = Distribution::Triangular {
            min: 1.0,
            mode: 2.0,
            max: 4.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1_000 {
            let x = d.sample(&mut rng);
            assert!((1.0..=4.0).contains(&x), "{x}");
        }
    }

    #[test]
    fn parse_command_line_form() {
        let v: MonteCarloVariable = "electricity_rate_kwh:normal:0.12:0.02".parse().expect("valid");
        assert_eq!(v.variable, AssumptionVariable::ElectricityRateKwh);
        assert_eq!(
            v.distribution,
            Distribution::Normal {
                mean: 0.12,
                std_dev: 0.02
            }
        );
        assert!("electricity_rate_kwh:lognormal:1:2".parse::<MonteCarloVariable>().is_err());
        assert!(matches!(
            "fuel:normal:1:2".parse::<MonteCarloVariable>(),
            Err(TcoError::UnknownVariable(_))
        ));
    }

    #[test]
    fn rejects_bad_parameters() {
        let engine = TcoEngine::default();
        let vars = [MonteCarloVariable {
            variable: AssumptionVariable::DemandChargeKw,
            distribution: Distribution::Normal {
                mean: 15.0,
                std_dev: -1.0,
            },
        }];
        assert!(engine.run_monte_carlo_simulation(&input(), &vars, 10).is_err());
        assert!(engine.run_monte_carlo_simulation(&input(), &[], 0).is_err());
    }
}
