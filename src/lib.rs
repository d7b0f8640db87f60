//! School bus fleet total-cost-of-ownership calculator.
//!
//! Costs four ways of running a route fleet over a planning horizon (diesel,
//! a self-managed electric depot, electrification-as-a-service, and mobile
//! charging), tags every input with its evidence, warns where programs do
//! not apply, and stress-tests the result.
//!
//! The free functions below use the standard defaults. Build a
//! [`TcoEngine`] directly to inject other defaults or rule constants.

use std::sync::LazyLock;

#[cfg(feature = "api")]
pub mod api;
pub mod assess;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;
pub mod registry;
pub mod report;
pub mod scenario;

pub use engine::{RuleConstants, ScenarioComparison, TcoEngine};
pub use error::TcoError;
pub use model::{ComparisonInput, ScenarioType, TcoInput, TcoResult};

use scenario::{
    AssumptionVariable, BreakEvenResult, MonteCarloSummary, MonteCarloVariable, SensitivityAnalysis,
    SensitivityVariable, StressResult, StressSuite, StressTestId, SweepRange,
};

static STANDARD_ENGINE: LazyLock<TcoEngine> = LazyLock::new(TcoEngine::default);

/// The engine behind the free functions.
pub fn standard_engine() -> &'static TcoEngine {
    &STANDARD_ENGINE
}

/// See [`TcoEngine::calculate_tco`].
///
/// # Errors
///
/// [`TcoError::Validation`] for out-of-range input.
pub fn calculate_tco(input: &TcoInput) -> Result<TcoResult, TcoError> {
    STANDARD_ENGINE.calculate_tco(input)
}

/// See [`TcoEngine::compare_scenarios`].
///
/// # Errors
///
/// [`TcoError::Validation`] for out-of-range input.
pub fn compare_scenarios(input: &ComparisonInput) -> Result<ScenarioComparison, TcoError> {
    STANDARD_ENGINE.compare_scenarios(input)
}

/// See [`TcoEngine::run_stress_test`].
///
/// # Errors
///
/// [`TcoError::Validation`] for out-of-range input.
pub fn run_stress_test(input: &TcoInput, id: StressTestId) -> Result<StressResult, TcoError> {
    STANDARD_ENGINE.run_stress_test(input, id)
}

/// See [`TcoEngine::run_all_stress_tests`].
///
/// # Errors
///
/// [`TcoError::Validation`] for out-of-range input.
pub fn run_all_stress_tests(input: &TcoInput) -> Result<StressSuite, TcoError> {
    STANDARD_ENGINE.run_all_stress_tests(input)
}

/// See [`TcoEngine::run_sensitivity_analysis`].
///
/// # Errors
///
/// [`TcoError::Validation`] or [`TcoError::InvalidRange`].
pub fn run_sensitivity_analysis(
    input: &TcoInput,
    variables: &[SensitivityVariable],
) -> Result<SensitivityAnalysis, TcoError> {
    STANDARD_ENGINE.run_sensitivity_analysis(input, variables)
}

/// See [`TcoEngine::find_break_even_point`].
///
/// # Errors
///
/// [`TcoError::Validation`] or [`TcoError::InvalidRange`].
pub fn find_break_even_point(
    input: &ComparisonInput,
    variable: AssumptionVariable,
    range: SweepRange,
    target: ScenarioType,
) -> Result<BreakEvenResult, TcoError> {
    STANDARD_ENGINE.find_break_even_point(input, variable, range, target)
}

/// See [`TcoEngine::run_monte_carlo_simulation`].
///
/// # Errors
///
/// [`TcoError::Validation`] or [`TcoError::InvalidRange`].
pub fn run_monte_carlo_simulation(
    input: &TcoInput,
    variables: &[MonteCarloVariable],
    iterations: usize,
) -> Result<MonteCarloSummary, TcoError> {
    STANDARD_ENGINE.run_monte_carlo_simulation(input, variables, iterations)
}
