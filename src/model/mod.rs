//! Domain types: requests, assumptions with provenance, and results.

pub mod assumptions;
pub mod evidence;
pub mod input;
pub mod result;

pub use assumptions::{AssumptionOverrides, Assumptions, TcoAssumptions};
pub use evidence::{
    Applicability, DataPoint, EvidenceClassification, EvidenceStrength, ImpactLevel,
    JurisdictionScope,
};
pub use input::{
    AnalysisParameters, ComparisonInput, FleetProfile, LocationProfile, ParameterOverrides,
    ScenarioType, TcoInput,
};
pub use result::{
    AnnualCosts, ApplicabilityWarning, CostBreakdown, CostCategory, EvidenceFactor,
    ExternalCosts, FleetScale, FleetScaleAdjustment, RuleConstantUsage, TcoResult,
    WarningCategory, WarningSeverity, YearCosts,
};
