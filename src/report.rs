//! Plain-text reports for terminal output.

use std::fmt;

use crate::engine::ScenarioComparison;
use crate::model::{ApplicabilityWarning, TcoResult};
use crate::scenario::{BreakEvenResult, MonteCarloSummary, SensitivityAnalysis, StressSuite};

fn money(v: f64) -> String {
    let sign = if v < 0.0 { "-" } else { "" };
    let whole = format!("{:.0}", v.abs());
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}${grouped}")
}

fn write_warnings(f: &mut fmt::Formatter<'_>, warnings: &[ApplicabilityWarning]) -> fmt::Result {
    if warnings.is_empty() {
        return Ok(());
    }
    writeln!(f, "Warnings:")?;
    for w in warnings {
        writeln!(f, "  [{}] {}: {}", w.severity, w.title, w.message)?;
    }
    Ok(())
}

impl fmt::Display for TcoResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- {} ({} buses, {:.0} mi/bus/yr, {:?} fleet) ---",
            self.scenario_type.label(),
            self.total_buses,
            self.annual_miles_per_bus,
            self.fleet_scale.scale,
        )?;
        writeln!(f, "Gross TCO:          {}", money(self.total_tco))?;
        writeln!(f, "Revenue:            {}", money(self.total_revenue))?;
        writeln!(f, "Residual value:     {}", money(self.residual_value))?;
        writeln!(f, "Net TCO:            {}", money(self.total_net_tco))?;
        writeln!(f, "NPV (net):          {}", money(self.npv_net))?;
        writeln!(f, "Net cost per mile:  ${:.2}", self.net_cost_per_mile)?;
        if self.total_external_costs > 0.0 {
            writeln!(f, "External costs:     {}", money(self.total_external_costs))?;
            writeln!(f, "True cost:          {}", money(self.total_true_cost))?;
        }
        writeln!(f, "Evidence strength:  {}", self.evidence_strength)?;
        for c in &self.breakdown.categories {
            writeln!(
                f,
                "  {:<22} {:>16} {:>6.1}%  {}",
                c.category,
                money(c.amount),
                c.percentage,
                c.classification
            )?;
        }
        write_warnings(f, &self.warnings)
    }
}

impl fmt::Display for ScenarioComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Scenario Comparison ---")?;
        writeln!(
            f,
            "{:<18} {:>16} {:>16} {:>10} {:>10}",
            "Scenario", "Net TCO", "Gross TCO", "$/mile", "Evidence"
        )?;
        for r in self.scenarios() {
            writeln!(
                f,
                "{:<18} {:>16} {:>16} {:>10.2} {:>10}",
                r.scenario_type.label(),
                money(r.total_net_tco),
                money(r.total_tco),
                r.net_cost_per_mile,
                r.evidence_strength.to_string(),
            )?;
        }
        let m = &self.metrics;
        writeln!(f, "Lowest net TCO:            {}", m.lowest_net_tco.label())?;
        writeln!(f, "Lowest gross TCO:          {}", m.lowest_gross_tco.label())?;
        writeln!(f, "Mobile savings vs diesel:  {}", money(m.mobile_savings_vs_diesel))?;
        writeln!(
            f,
            "Mobile savings vs depot:   {}",
            money(m.mobile_savings_vs_self_managed)
        )?;
        match m.payback_years_vs_diesel {
            Some(years) => writeln!(f, "Payback vs diesel:         {years:.1} years")?,
            None => writeln!(f, "Payback vs diesel:         not reached")?,
        }
        write_warnings(f, &self.warnings)
    }
}

impl fmt::Display for StressSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Stress Tests: {} (base net TCO {}) ---",
            self.base.scenario_type.label(),
            money(self.base.total_net_tco)
        )?;
        for r in &self.results {
            writeln!(
                f,
                "{:<34} p={:.2} {:>16} {:>+8.1}%",
                r.name,
                r.probability,
                money(r.stressed_net_tco),
                r.impact_pct
            )?;
            for w in &r.warnings {
                writeln!(f, "    ! {w}")?;
            }
        }
        if let Some(id) = self.worst_case {
            writeln!(f, "Worst case:        {id}")?;
        }
        writeln!(f, "Expected net TCO:  {}", money(self.expected_net_tco))?;
        write!(f, "Risk level:        {}", self.risk_level)
    }
}

impl fmt::Display for BreakEvenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.value, self.sensitivity_tier) {
            (Some(value), Some(tier)) => write!(
                f,
                "{} vs diesel: break-even at {} = {value:.4} ({tier:?} sensitivity)",
                self.target.label(),
                self.variable
            ),
            _ => write!(f, "{}", self.details),
        }
    }
}

impl fmt::Display for MonteCarloSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Monte Carlo ({} iterations) ---", self.iterations)?;
        writeln!(f, "Mean net TCO:  {}", money(self.mean))?;
        writeln!(f, "Std dev:       {}", money(self.std_dev))?;
        writeln!(f, "P5 / P50 / P95: {} / {} / {}", money(self.p5), money(self.p50), money(self.p95))?;
        write!(
            f,
            "95% interval:  {} .. {}",
            money(self.ci95_low),
            money(self.ci95_high)
        )
    }
}

impl fmt::Display for SensitivityAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Sensitivity: {} (base net TCO {}) ---",
            self.scenario_type.label(),
            money(self.base_net_tco)
        )?;
        for bar in &self.tornado {
            writeln!(
                f,
                "{:<26} {:>10.3} .. {:<10.3} {:>16} {:>16}  spread {}",
                bar.variable.as_str(),
                bar.low_value,
                bar.high_value,
                money(bar.low_impact),
                money(bar.high_impact),
                money(bar.spread)
            )?;
            if let Some(e) = self.result(bar.variable).and_then(|r| r.elasticity) {
                writeln!(f, "{:<26} elasticity {e:.3}", "")?;
            }
        }
        Ok(())
    }
}
