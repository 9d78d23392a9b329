//! Capital allocation mix and policy commentary.

use analysis_core::stats::round_to;
use analysis_core::FinancialSnapshot;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Cash-flow uses supplied by the caller for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationInputs {
    #[serde(default)]
    pub dividends: f64,
    #[serde(default)]
    pub buybacks: f64,
    #[serde(default)]
    pub capex: f64,
    #[serde(default)]
    pub rd_expense: f64,
    #[serde(default)]
    pub ma_spending: f64,
}

/// Share of each bucket in total allocation (%, 1 dp).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationMix {
    pub dividends: f64,
    pub buybacks: f64,
    pub capex: f64,
    pub rd: f64,
    pub ma: f64,
    pub debt_change: f64,
}

impl AllocationMix {
    pub fn shareholder_pct(&self) -> f64 {
        self.dividends + self.buybacks
    }

    pub fn investment_pct(&self) -> f64 {
        self.capex + self.rd
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CapitalAllocationAnalysis {
    pub period: String,
    pub dividends: f64,
    pub buybacks: f64,
    pub capex: f64,
    pub rd_expense: f64,
    /// Change in short + long-term debt against the previous period
    pub debt_change: f64,
    pub ma_spending: f64,
    /// `None` when nothing was allocated
    pub allocation_mix: Option<AllocationMix>,
    pub commentary: String,
}

impl CapitalAllocationAnalysis {
    pub fn total_shareholder_returns(&self) -> f64 {
        self.dividends + self.buybacks
    }

    pub fn total_investment(&self) -> f64 {
        self.capex + self.rd_expense + self.ma_spending
    }
}

impl Serialize for CapitalAllocationAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CapitalAllocationAnalysis", 11)?;
        state.serialize_field("period", &self.period)?;
        state.serialize_field("dividends", &self.dividends)?;
        state.serialize_field("buybacks", &self.buybacks)?;
        state.serialize_field("capex", &self.capex)?;
        state.serialize_field("rd_expense", &self.rd_expense)?;
        state.serialize_field("debt_change", &self.debt_change)?;
        state.serialize_field("ma_spending", &self.ma_spending)?;
        state.serialize_field("total_shareholder_returns", &self.total_shareholder_returns())?;
        state.serialize_field("total_investment", &self.total_investment())?;
        state.serialize_field("allocation_mix", &self.allocation_mix)?;
        state.serialize_field("commentary", &self.commentary)?;
        state.end()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CapitalAllocationAnalyzer;

impl CapitalAllocationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Debt delta between two snapshots; zero unless both report debt.
    pub fn debt_change(current: &FinancialSnapshot, previous: Option<&FinancialSnapshot>) -> f64 {
        match (current.total_debt(), previous.and_then(FinancialSnapshot::total_debt)) {
            (Some(now), Some(before)) => now - before,
            _ => 0.0,
        }
    }

    pub fn analyze(
        &self,
        snapshot: &FinancialSnapshot,
        previous: Option<&FinancialSnapshot>,
        inputs: &AllocationInputs,
    ) -> CapitalAllocationAnalysis {
        let debt_change = Self::debt_change(snapshot, previous);
        let allocation_mix = allocation_mix(inputs, debt_change);

        let mut analysis = CapitalAllocationAnalysis {
            period: snapshot.report_period.clone(),
            dividends: inputs.dividends,
            buybacks: inputs.buybacks,
            capex: inputs.capex,
            rd_expense: inputs.rd_expense,
            debt_change,
            ma_spending: inputs.ma_spending,
            allocation_mix,
            commentary: String::new(),
        };
        analysis.commentary = commentary(&analysis);
        analysis
    }
}

fn allocation_mix(inputs: &AllocationInputs, debt_change: f64) -> Option<AllocationMix> {
    let total = inputs.dividends
        + inputs.buybacks
        + inputs.capex
        + inputs.rd_expense
        + inputs.ma_spending
        + debt_change.abs();
    if total <= 0.0 {
        return None;
    }
    let pct = |v: f64| round_to(v / total * 100.0, 1);
    Some(AllocationMix {
        dividends: pct(inputs.dividends),
        buybacks: pct(inputs.buybacks),
        capex: pct(inputs.capex),
        rd: pct(inputs.rd_expense),
        ma: pct(inputs.ma_spending),
        debt_change: pct(debt_change.abs()),
    })
}

fn commentary(a: &CapitalAllocationAnalysis) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(mix) = &a.allocation_mix {
        let shareholder = mix.shareholder_pct();
        let investment = mix.investment_pct();
        if shareholder > 50.0 {
            parts.push("Shareholder-focused allocation (dividends + buybacks > 50%)".into());
        }
        if investment > 50.0 {
            parts.push("Growth-focused allocation (capex + R&D > 50%)".into());
        }
        if (30.0..=60.0).contains(&shareholder) && (30.0..=60.0).contains(&investment) {
            parts.push("Balanced allocation between returns and reinvestment".into());
        }
    }

    if a.dividends > a.buybacks * 2.0 {
        parts.push("Prefers dividends over buybacks".into());
    } else if a.buybacks > a.dividends * 2.0 {
        parts.push("Prefers buybacks over dividends".into());
    }

    if let Some(mix) = &a.allocation_mix {
        if mix.ma > 20.0 {
            parts.push(format!("Significant M&A activity ({:.0}%)", mix.ma));
        }
    }

    if a.debt_change > 0.0 {
        parts.push("Taking on additional debt".into());
    } else if a.debt_change < 0.0 {
        parts.push("Reducing debt levels".into());
    }

    let returns = a.total_shareholder_returns();
    let investment = a.total_investment();
    if investment > returns {
        parts.push("Prioritizing growth over immediate shareholder returns".into());
    } else if returns > investment * 2.0 {
        parts.push("Prioritizing shareholder returns over reinvestment".into());
    }

    if parts.is_empty() {
        return "Capital allocation data not available or minimal activity".to_string();
    }
    parts.join(". ") + "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot(short: Option<f64>, long: Option<f64>) -> FinancialSnapshot {
        FinancialSnapshot {
            stock_code: "2330".to_string(),
            company_name: "TSMC".to_string(),
            report_year: 2023,
            report_season: 3,
            report_period: "2023Q3".to_string(),
            total_assets: 1_000.0,
            total_liabilities: 400.0,
            equity: 600.0,
            short_term_debt: short,
            long_term_debt: long,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_activity() {
        let analysis = CapitalAllocationAnalyzer::new().analyze(
            &snapshot(None, None),
            None,
            &AllocationInputs::default(),
        );
        assert!(analysis.allocation_mix.is_none());
        assert_eq!(analysis.debt_change, 0.0);
        assert_eq!(
            analysis.commentary,
            "Capital allocation data not available or minimal activity"
        );
    }

    #[test]
    fn test_debt_change_needs_both_periods() {
        let current = snapshot(Some(100.0), Some(300.0));
        let previous = snapshot(Some(50.0), Some(250.0));
        assert_relative_eq!(CapitalAllocationAnalyzer::debt_change(&current, Some(&previous)), 100.0);
        assert_eq!(CapitalAllocationAnalyzer::debt_change(&current, None), 0.0);
        assert_eq!(
            CapitalAllocationAnalyzer::debt_change(&current, Some(&snapshot(None, None))),
            0.0
        );
    }

    #[test]
    fn test_growth_focused_mix() {
        let inputs = AllocationInputs {
            dividends: 100.0,
            capex: 600.0,
            rd_expense: 300.0,
            ..Default::default()
        };
        let analysis = CapitalAllocationAnalyzer::new().analyze(&snapshot(None, None), None, &inputs);
        let mix = analysis.allocation_mix.unwrap();
        assert_relative_eq!(mix.capex, 60.0);
        assert_relative_eq!(mix.rd, 30.0);
        assert_relative_eq!(mix.dividends, 10.0);
        assert_relative_eq!(analysis.total_investment(), 900.0);

        assert!(analysis.commentary.contains("Growth-focused allocation"));
        assert!(analysis.commentary.contains("Prefers dividends over buybacks"));
        assert!(analysis
            .commentary
            .ends_with("Prioritizing growth over immediate shareholder returns."));
    }

    #[test]
    fn test_shareholder_focus_and_debt_reduction() {
        let current = snapshot(Some(100.0), Some(100.0));
        let previous = snapshot(Some(100.0), Some(200.0));
        let inputs = AllocationInputs {
            dividends: 200.0,
            buybacks: 500.0,
            capex: 100.0,
            ..Default::default()
        };
        let analysis = CapitalAllocationAnalyzer::new().analyze(&current, Some(&previous), &inputs);
        assert_relative_eq!(analysis.debt_change, -100.0);
        assert_relative_eq!(analysis.total_shareholder_returns(), 700.0);

        assert!(analysis.commentary.contains("Shareholder-focused allocation"));
        assert!(analysis.commentary.contains("Prefers buybacks over dividends"));
        assert!(analysis.commentary.contains("Reducing debt levels"));
        assert!(analysis
            .commentary
            .contains("Prioritizing shareholder returns over reinvestment"));
    }

    #[test]
    fn test_significant_ma_reported() {
        let inputs = AllocationInputs {
            capex: 500.0,
            ma_spending: 500.0,
            ..Default::default()
        };
        let analysis = CapitalAllocationAnalyzer::new().analyze(&snapshot(None, None), None, &inputs);
        assert!(analysis.commentary.contains("Significant M&A activity (50%)"));
    }

    #[test]
    fn test_serialized_totals() {
        let inputs = AllocationInputs {
            dividends: 10.0,
            buybacks: 5.0,
            capex: 20.0,
            ..Default::default()
        };
        let analysis = CapitalAllocationAnalyzer::new().analyze(&snapshot(None, None), None, &inputs);
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["total_shareholder_returns"], 15.0);
        assert_eq!(value["total_investment"], 20.0);
    }
}
