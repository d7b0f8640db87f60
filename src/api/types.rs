//! Request and response types that exist only at the HTTP boundary.

use serde::{Deserialize, Serialize};

use crate::model::TcoInput;
use crate::scenario::{AssumptionVariable, RiskLevel, SensitivityVariable, StressScenario, StressTestId};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// One stress test catalog entry, without its modifiers.
#[derive(Debug, Serialize)]
pub struct StressTestInfo {
    pub id: StressTestId,
    pub name: &'static str,
    pub description: &'static str,
    pub probability: f64,
    pub severity: RiskLevel,
}

impl From<&StressScenario> for StressTestInfo {
    fn from(s: &StressScenario) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            probability: s.probability,
            severity: s.severity,
        }
    }
}

/// `POST /sensitivity` body. An empty variable list sweeps the defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensitivityRequest {
    pub input: TcoInput,
    #[serde(default)]
    pub variables: Vec<SensitivityVariable>,
}

impl SensitivityRequest {
    pub fn variables(&self) -> Vec<SensitivityVariable> {
        if self.variables.is_empty() {
            AssumptionVariable::sensitivity_defaults()
                .into_iter()
                .map(SensitivityVariable::from)
                .collect()
        } else {
            self.variables.clone()
        }
    }
}
