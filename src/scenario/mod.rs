//! What-if analyses layered over the cost engine: stress tests,
//! one-at-a-time sensitivity, break-even search, and Monte Carlo.

pub mod break_even;
pub mod monte_carlo;
pub mod sensitivity;
pub mod stress;
pub mod variables;

pub use break_even::{BreakEvenResult, SensitivityTier};
pub use monte_carlo::{DEFAULT_ITERATIONS, Distribution, MonteCarloSummary, MonteCarloVariable};
pub use sensitivity::{SensitivityAnalysis, SensitivityResult, SensitivityVariable, TornadoBar, tornado};
pub use stress::{RiskLevel, StressResult, StressScenario, StressSuite, StressTestId, stress_scenarios};
pub use variables::{AssumptionVariable, SweepRange};
