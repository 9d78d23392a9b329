//! ROIC versus WACC value-creation analysis.
//!
//! Book values throughout: invested capital is equity + total liabilities and
//! the WACC weights are book equity and book liabilities over that sum.

use analysis_core::stats::safe_divide;
use analysis_core::{CapitalAssumptions, FinancialSnapshot};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Base pre-tax cost of debt before the leverage spread.
const BASE_DEBT_RATE: f64 = 0.03;

/// Spread added per unit of debt ratio.
const LEVERAGE_SPREAD: f64 = 0.05;

/// Per-call overrides of the configured assumptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalOverrides {
    pub beta: Option<f64>,
    /// Pre-tax cost of debt as a fraction
    pub cost_of_debt: Option<f64>,
    pub tax_rate: Option<f64>,
}

/// Inputs actually used, in percent (beta unitless).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccAssumptions {
    pub beta: f64,
    pub risk_free_rate: f64,
    pub market_risk_premium: f64,
    pub tax_rate: f64,
    pub cost_of_debt_pretax: f64,
    pub equity_weight: f64,
    pub debt_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoicWaccAnalysis {
    pub nopat: f64,
    pub invested_capital: f64,
    /// Return on invested capital (%)
    pub roic: f64,
    /// Cost of equity (%)
    pub cost_of_equity: f64,
    /// After-tax cost of debt (%)
    pub cost_of_debt: f64,
    /// Weighted average cost of capital (%)
    pub wacc: f64,
    #[serde(default)]
    pub commentary: String,
    #[serde(default)]
    pub assumptions: Option<WaccAssumptions>,
}

impl RoicWaccAnalysis {
    /// ROIC - WACC in percentage points.
    pub fn value_creation_gap(&self) -> f64 {
        self.roic - self.wacc
    }

    pub fn is_value_creating(&self) -> bool {
        self.roic > self.wacc
    }
}

impl Serialize for RoicWaccAnalysis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RoicWaccAnalysis", 10)?;
        state.serialize_field("nopat", &self.nopat)?;
        state.serialize_field("invested_capital", &self.invested_capital)?;
        state.serialize_field("roic", &self.roic)?;
        state.serialize_field("cost_of_equity", &self.cost_of_equity)?;
        state.serialize_field("cost_of_debt", &self.cost_of_debt)?;
        state.serialize_field("wacc", &self.wacc)?;
        state.serialize_field("value_creation_gap", &self.value_creation_gap())?;
        state.serialize_field("is_value_creating", &self.is_value_creating())?;
        state.serialize_field("commentary", &self.commentary)?;
        state.serialize_field("assumptions", &self.assumptions)?;
        state.end()
    }
}

/// Computes ROIC, CAPM cost of equity and WACC from one snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostOfCapitalCalculator {
    assumptions: CapitalAssumptions,
}

impl CostOfCapitalCalculator {
    pub fn new(assumptions: CapitalAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn nopat(operating_income: f64, tax_rate: f64) -> f64 {
        operating_income * (1.0 - tax_rate)
    }

    pub fn invested_capital(snapshot: &FinancialSnapshot) -> f64 {
        snapshot.equity + snapshot.total_liabilities
    }

    /// CAPM: risk-free + beta x market risk premium (fraction).
    pub fn cost_of_equity(&self, beta: f64) -> f64 {
        self.assumptions.risk_free_rate + beta * self.assumptions.market_risk_premium
    }

    /// Pre-tax cost of debt proxy: 3% plus 5% per unit of debt ratio (fraction).
    pub fn estimate_cost_of_debt(snapshot: &FinancialSnapshot) -> f64 {
        BASE_DEBT_RATE + (snapshot.debt_ratio() / 100.0) * LEVERAGE_SPREAD
    }

    pub fn analyze(&self, snapshot: &FinancialSnapshot, overrides: &CapitalOverrides) -> RoicWaccAnalysis {
        let beta = overrides.beta.unwrap_or(self.assumptions.beta);
        let tax_rate = overrides.tax_rate.unwrap_or(self.assumptions.tax_rate);

        let nopat = Self::nopat(snapshot.operating_income, tax_rate);
        let invested_capital = Self::invested_capital(snapshot);
        let roic = safe_divide(nopat, invested_capital, 0.0) * 100.0;

        let cost_of_equity = self.cost_of_equity(beta);
        let cost_of_debt = overrides
            .cost_of_debt
            .unwrap_or_else(|| Self::estimate_cost_of_debt(snapshot));
        let after_tax_cost_of_debt = cost_of_debt * (1.0 - tax_rate);

        let total_capital = snapshot.equity + snapshot.total_liabilities;
        let equity_weight = safe_divide(snapshot.equity, total_capital, 0.0);
        let debt_weight = safe_divide(snapshot.total_liabilities, total_capital, 0.0);

        let wacc = (equity_weight * cost_of_equity + debt_weight * after_tax_cost_of_debt) * 100.0;

        RoicWaccAnalysis {
            nopat,
            invested_capital,
            roic,
            cost_of_equity: cost_of_equity * 100.0,
            cost_of_debt: after_tax_cost_of_debt * 100.0,
            wacc,
            commentary: commentary(roic, wacc, snapshot.debt_ratio()),
            assumptions: Some(WaccAssumptions {
                beta,
                risk_free_rate: self.assumptions.risk_free_rate * 100.0,
                market_risk_premium: self.assumptions.market_risk_premium * 100.0,
                tax_rate: tax_rate * 100.0,
                cost_of_debt_pretax: cost_of_debt * 100.0,
                equity_weight: equity_weight * 100.0,
                debt_weight: debt_weight * 100.0,
            }),
        }
    }
}

fn commentary(roic: f64, wacc: f64, debt_ratio: f64) -> String {
    let spread = roic - wacc;
    let mut parts = Vec::new();

    parts.push(if spread > 5.0 {
        format!("Strong value creation: ROIC ({:.1}%) significantly exceeds WACC ({:.1}%)", roic, wacc)
    } else if spread > 2.0 {
        format!("Positive value creation: ROIC ({:.1}%) above WACC ({:.1}%)", roic, wacc)
    } else if spread > 0.0 {
        format!("Marginal value creation: ROIC ({:.1}%) slightly above WACC ({:.1}%)", roic, wacc)
    } else if spread > -2.0 {
        format!("Value neutral: ROIC ({:.1}%) near WACC ({:.1}%)", roic, wacc)
    } else {
        format!("Value destruction: ROIC ({:.1}%) below WACC ({:.1}%)", roic, wacc)
    });

    parts.push(
        match roic {
            r if r >= 15.0 => "Highly efficient capital allocation",
            r if r >= 10.0 => "Good capital efficiency",
            r if r >= 5.0 => "Moderate capital efficiency",
            _ => "Poor capital efficiency",
        }
        .to_string(),
    );

    if debt_ratio > 60.0 {
        parts.push(format!("High leverage ({:.0}%) increases WACC", debt_ratio));
    } else if debt_ratio < 30.0 {
        parts.push(format!("Conservative capital structure ({:.0}%)", debt_ratio));
    }

    parts.join(". ") + "."
}
