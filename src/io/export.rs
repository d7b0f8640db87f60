//! CSV and JSON export of a scenario comparison.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::engine::{ComparisonMetrics, ScenarioComparison};
use crate::model::assumptions::MobileChargingCosts;
use crate::model::{
    ApplicabilityWarning, DataPoint, EvidenceFactor, EvidenceStrength, ScenarioType, TcoResult,
};

/// Column header of the per-scenario CSV export.
const HEADER: &str = "scenario,net_tco,gross_tco,npv_net,net_cost_per_mile,total_revenue,evidence_strength";

/// Printed with every JSON export.
pub const DISCLAIMER: &str = "Planning-grade estimate. Values marked CONTINGENT or ASSUMED \
     must be confirmed with program administrators, utilities, and vendors before \
     budget or procurement decisions.";

/// Flat projection of one scenario result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub scenario: ScenarioType,
    pub label: &'static str,
    pub net_tco: f64,
    pub gross_tco: f64,
    pub npv_net: f64,
    pub net_cost_per_mile: f64,
    pub total_revenue: f64,
    pub evidence_strength: EvidenceStrength,
}

impl From<&TcoResult> for ScenarioSummary {
    fn from(r: &TcoResult) -> Self {
        Self {
            scenario: r.scenario_type,
            label: r.scenario_type.label(),
            net_tco: r.total_net_tco,
            gross_tco: r.total_tco,
            npv_net: r.npv_net,
            net_cost_per_mile: r.net_cost_per_mile,
            total_revenue: r.total_revenue,
            evidence_strength: r.evidence_strength,
        }
    }
}

#[derive(Serialize)]
struct MobileChargingSection<'a> {
    assumptions: &'a MobileChargingCosts<DataPoint>,
    evidence_factors: &'a [EvidenceFactor],
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    exported_at: String,
    disclaimer: &'static str,
    scenarios: Vec<ScenarioSummary>,
    metrics: &'a ComparisonMetrics,
    warnings: &'a [ApplicabilityWarning],
    mobile_charging: MobileChargingSection<'a>,
}

/// Writes the per-scenario CSV to a file at `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(comparison: &ScenarioComparison, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(comparison, io::BufWriter::new(file))
}

/// Writes one row per scenario, in comparison order, to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(comparison: &ScenarioComparison, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(','))?;

    for r in comparison.scenarios() {
        let s = ScenarioSummary::from(r);
        wtr.write_record(&[
            s.scenario.as_str().to_string(),
            format!("{:.2}", s.net_tco),
            format!("{:.2}", s.gross_tco),
            format!("{:.2}", s.npv_net),
            format!("{:.4}", s.net_cost_per_mile),
            format!("{:.2}", s.total_revenue),
            s.evidence_strength.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the JSON export to a file at `path`.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization, or writing fails.
pub fn export_json(comparison: &ScenarioComparison, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_json(comparison, io::BufWriter::new(file))
}

/// Writes the comparison as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(comparison: &ScenarioComparison, mut writer: impl Write) -> io::Result<()> {
    let mobile = &comparison.mobile_charging;
    let doc = ExportDocument {
        exported_at: Utc::now().to_rfc3339(),
        disclaimer: DISCLAIMER,
        scenarios: comparison.scenarios().into_iter().map(ScenarioSummary::from).collect(),
        metrics: &comparison.metrics,
        warnings: &comparison.warnings,
        mobile_charging: MobileChargingSection {
            assumptions: &mobile.assumptions.mobile_charging,
            evidence_factors: &mobile.evidence_factors,
        },
    };
    serde_json::to_writer_pretty(&mut writer, &doc)?;
    writeln!(writer)?;
    writer.flush()
}
