//! Output types produced by the engine and the assessors.

use std::fmt;

use serde::Serialize;

use super::assumptions::TcoAssumptions;
use super::evidence::{EvidenceClassification, EvidenceStrength, ImpactLevel};
use super::input::{AnalysisParameters, ScenarioType};

/// Fleet size band that scales per-unit costs and program revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FleetScale {
    Small,
    Medium,
    Large,
}

/// Multipliers derived from fleet size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetScaleAdjustment {
    pub scale: FleetScale,
    /// Applied to maintenance and infrastructure in every scenario.
    pub cost_multiplier: f64,
    /// Applied to every revenue line.
    pub revenue_multiplier: f64,
    /// Whether the fleet is large enough for service economics to pencil out.
    pub break_even_reached: bool,
}

/// Diesel-only societal costs for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExternalCosts {
    pub health: f64,
    pub climate: f64,
    pub regulatory: f64,
    pub operational_risk: f64,
    pub total: f64,
}

/// Cash flows of a single planning year, before accumulation.
///
/// Year 0 holds one-time items (vehicles, infrastructure, incentives);
/// operating years start at 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearCosts {
    pub year: u32,
    pub capital_cost: f64,
    pub energy_cost: f64,
    pub maintenance_cost: f64,
    pub infrastructure_cost: f64,
    pub insurance_cost: f64,
    /// Incentives received; reduces total cost.
    pub incentives_applied: f64,
    pub carbon_credit_revenue: f64,
    pub v2g_revenue: f64,
    pub total_revenue: f64,
    pub external_costs: ExternalCosts,
    /// Capital + energy + maintenance + infrastructure + insurance − incentives.
    pub total_cost: f64,
    /// `total_cost` plus external costs.
    pub total_true_cost: f64,
    /// `total_cost` minus revenue.
    pub net_cost: f64,
    /// `net_cost` plus external costs.
    pub true_net_cost: f64,
}

/// A year's costs together with running and discounted totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualCosts {
    #[serde(flatten)]
    pub costs: YearCosts,
    pub discount_factor: f64,
    pub cumulative_cost: f64,
    pub cumulative_net_cost: f64,
    pub cumulative_true_cost: f64,
    pub npv_cost: f64,
    pub npv_net_cost: f64,
    pub npv_true_cost: f64,
}

impl AnnualCosts {
    /// Extends the running totals of `prev` with `costs`.
    pub fn accumulate(costs: YearCosts, prev: Option<&AnnualCosts>, discount_rate: f64) -> Self {
        let discount_factor = (1.0 + discount_rate).powi(-(costs.year as i32));
        let (cum, cum_net, cum_true) = prev.map_or((0.0, 0.0, 0.0), |p| {
            (p.cumulative_cost, p.cumulative_net_cost, p.cumulative_true_cost)
        });
        Self {
            discount_factor,
            cumulative_cost: cum + costs.total_cost,
            cumulative_net_cost: cum_net + costs.net_cost,
            cumulative_true_cost: cum_true + costs.true_net_cost,
            npv_cost: costs.total_cost * discount_factor,
            npv_net_cost: costs.net_cost * discount_factor,
            npv_true_cost: costs.true_net_cost * discount_factor,
            costs,
        }
    }
}

/// One line of the cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCategory {
    pub category: String,
    /// Horizon total; negative for credits.
    pub amount: f64,
    /// Share of gross TCO, in percent.
    pub percentage: f64,
    /// Classification of the assumption driving this line.
    pub classification: EvidenceClassification,
    pub details: String,
}

/// A structural constant of the cost rules, kept apart from assumptions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConstantUsage {
    pub name: String,
    pub value: f64,
    pub applies_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub categories: Vec<CostCategory>,
    pub rule_constants: Vec<RuleConstantUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCategory {
    Jurisdiction,
    Incentive,
    Weather,
    Infrastructure,
    Operational,
    Risk,
}

/// Explains why a value was zeroed, adjusted, or is at risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicabilityWarning {
    /// Stable identifier; comparisons keep the first warning per id.
    pub id: String,
    pub category: WarningCategory,
    pub severity: WarningSeverity,
    pub title: String,
    pub message: String,
    pub affected_parameter: String,
    /// Value actually used in the calculation.
    pub applied_value: f64,
    pub reason: String,
}

/// One input whose provenance feeds the overall evidence tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceFactor {
    pub factor: String,
    pub classification: EvidenceClassification,
    pub impact: ImpactLevel,
    pub note: String,
}

/// Result of costing one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TcoResult {
    pub scenario_type: ScenarioType,
    pub total_buses: u32,
    pub annual_miles_per_bus: f64,
    pub annual_costs: Vec<AnnualCosts>,
    /// Sum of gross costs over years 0..=horizon.
    pub total_tco: f64,
    pub total_revenue: f64,
    /// Discounted resale value at the horizon.
    pub residual_value: f64,
    /// `total_tco − total_revenue − residual_value`.
    pub total_net_tco: f64,
    pub total_external_costs: f64,
    /// `total_net_tco` plus external costs.
    pub total_true_cost: f64,
    pub npv: f64,
    pub npv_net: f64,
    pub npv_true_cost: f64,
    pub average_annual_cost: f64,
    pub average_annual_net_cost: f64,
    pub cost_per_mile: f64,
    pub net_cost_per_mile: f64,
    pub true_cost_per_mile: f64,
    pub fleet_scale: FleetScaleAdjustment,
    pub breakdown: CostBreakdown,
    pub warnings: Vec<ApplicabilityWarning>,
    pub evidence_strength: EvidenceStrength,
    pub evidence_factors: Vec<EvidenceFactor>,
    pub assumptions: TcoAssumptions,
    pub parameters: AnalysisParameters,
    /// RFC 3339 timestamp.
    pub calculated_at: String,
}
