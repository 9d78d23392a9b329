use serde::{Deserialize, Serialize};

use crate::stats::round_to;
use crate::AnalysisError;

fn default_currency() -> String {
    "TWD".to_string()
}

fn default_unit() -> String {
    "thousand".to_string()
}

/// One company's normalized financial statements for one reporting period.
///
/// Ratios are computed on read from the raw fields and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    // Identification
    pub stock_code: String,
    pub company_name: String,
    pub report_year: i32,
    /// Fiscal quarter, 1-4
    pub report_season: u8,
    /// Period label such as "2023Q3"
    pub report_period: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_unit")]
    pub unit: String,

    // Balance sheet
    pub cash_and_equivalents: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub equity: f64,

    // Income statement
    pub net_revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    /// May be negative
    pub net_income: f64,
    /// May be negative
    pub eps: f64,

    // Optional detail
    #[serde(default)]
    pub current_assets: Option<f64>,
    #[serde(default)]
    pub current_liabilities: Option<f64>,
    #[serde(default)]
    pub short_term_debt: Option<f64>,
    #[serde(default)]
    pub long_term_debt: Option<f64>,
    #[serde(default)]
    pub retained_earnings: Option<f64>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub investing_cash_flow: Option<f64>,
    #[serde(default)]
    pub financing_cash_flow: Option<f64>,
}

impl Default for FinancialSnapshot {
    fn default() -> Self {
        Self {
            stock_code: String::new(),
            company_name: String::new(),
            report_year: 0,
            report_season: 1,
            report_period: String::new(),
            currency: default_currency(),
            unit: default_unit(),
            cash_and_equivalents: 0.0,
            accounts_receivable: 0.0,
            inventory: 0.0,
            total_assets: 0.0,
            total_liabilities: 0.0,
            equity: 0.0,
            net_revenue: 0.0,
            gross_profit: 0.0,
            operating_income: 0.0,
            net_income: 0.0,
            eps: 0.0,
            current_assets: None,
            current_liabilities: None,
            short_term_debt: None,
            long_term_debt: None,
            retained_earnings: None,
            operating_cash_flow: None,
            investing_cash_flow: None,
            financing_cash_flow: None,
        }
    }
}

impl FinancialSnapshot {
    fn pct_of_revenue(&self, line: f64) -> f64 {
        if self.net_revenue == 0.0 {
            return 0.0;
        }
        (line / self.net_revenue) * 100.0
    }

    /// Gross profit margin (%)
    pub fn gross_margin(&self) -> f64 {
        self.pct_of_revenue(self.gross_profit)
    }

    /// Operating margin (%)
    pub fn operating_margin(&self) -> f64 {
        self.pct_of_revenue(self.operating_income)
    }

    /// Net profit margin (%)
    pub fn net_margin(&self) -> f64 {
        self.pct_of_revenue(self.net_income)
    }

    /// Total liabilities to total assets (%)
    pub fn debt_ratio(&self) -> f64 {
        if self.total_assets == 0.0 {
            return 0.0;
        }
        (self.total_liabilities / self.total_assets) * 100.0
    }

    /// Equity to total assets (%)
    pub fn equity_ratio(&self) -> f64 {
        if self.total_assets == 0.0 {
            return 0.0;
        }
        (self.equity / self.total_assets) * 100.0
    }

    /// Current assets / current liabilities, absent when either side is missing
    /// or liabilities are zero.
    pub fn current_ratio(&self) -> Option<f64> {
        match (self.current_assets, self.current_liabilities) {
            (Some(assets), Some(liabilities)) if liabilities != 0.0 => Some(assets / liabilities),
            _ => None,
        }
    }

    /// Return on assets (%), quarterly figure annualized x4
    pub fn roa(&self) -> f64 {
        if self.total_assets == 0.0 {
            return 0.0;
        }
        (self.net_income / self.total_assets) * 100.0 * 4.0
    }

    /// Return on equity (%), quarterly figure annualized x4
    pub fn roe(&self) -> f64 {
        if self.equity == 0.0 {
            return 0.0;
        }
        (self.net_income / self.equity) * 100.0 * 4.0
    }

    /// Short-term plus long-term debt, when at least one is reported.
    pub fn total_debt(&self) -> Option<f64> {
        match (self.short_term_debt, self.long_term_debt) {
            (None, None) => None,
            (s, l) => Some(s.unwrap_or(0.0) + l.unwrap_or(0.0)),
        }
    }

    /// Chronological sort key (fiscal year, fiscal season).
    pub fn period_key(&self) -> (i32, u8) {
        (self.report_year, self.report_season)
    }

    /// Check the sign and range invariants of the raw fields.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(1..=4).contains(&self.report_season) {
            return Err(AnalysisError::InvalidData(format!(
                "{} {}: report_season {} outside 1-4",
                self.stock_code, self.report_period, self.report_season
            )));
        }

        let non_negative = [
            ("cash_and_equivalents", Some(self.cash_and_equivalents)),
            ("accounts_receivable", Some(self.accounts_receivable)),
            ("inventory", Some(self.inventory)),
            ("total_assets", Some(self.total_assets)),
            ("total_liabilities", Some(self.total_liabilities)),
            ("equity", Some(self.equity)),
            ("net_revenue", Some(self.net_revenue)),
            ("gross_profit", Some(self.gross_profit)),
            ("operating_income", Some(self.operating_income)),
            ("current_assets", self.current_assets),
            ("current_liabilities", self.current_liabilities),
            ("short_term_debt", self.short_term_debt),
            ("long_term_debt", self.long_term_debt),
            ("retained_earnings", self.retained_earnings),
        ];

        for (field, value) in non_negative {
            if let Some(v) = value {
                if v < 0.0 || !v.is_finite() {
                    return Err(AnalysisError::InvalidData(format!(
                        "{} {}: {} must be a non-negative number, got {}",
                        self.stock_code, self.report_period, field, v
                    )));
                }
            }
        }

        Ok(())
    }

    /// Structured key-metric summary for display.
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            identification: Identification {
                stock_code: self.stock_code.clone(),
                company_name: self.company_name.clone(),
                period: self.report_period.clone(),
                currency: self.currency.clone(),
                unit: self.unit.clone(),
            },
            income_statement: IncomeStatement {
                net_revenue: self.net_revenue,
                gross_profit: self.gross_profit,
                operating_income: self.operating_income,
                net_income: self.net_income,
                eps: self.eps,
            },
            margins: Margins {
                gross_margin: round_to(self.gross_margin(), 2),
                operating_margin: round_to(self.operating_margin(), 2),
                net_margin: round_to(self.net_margin(), 2),
            },
            balance_sheet: BalanceSheet {
                total_assets: self.total_assets,
                total_liabilities: self.total_liabilities,
                equity: self.equity,
                cash_and_equivalents: self.cash_and_equivalents,
            },
            financial_structure: FinancialStructure {
                debt_ratio: round_to(self.debt_ratio(), 2),
                equity_ratio: round_to(self.equity_ratio(), 2),
                current_ratio: self.current_ratio().map(|r| round_to(r, 2)),
            },
            returns: Returns {
                roa: round_to(self.roa(), 2),
                roe: round_to(self.roe(), 2),
            },
        }
    }
}

/// Grouped view of one snapshot with presentation rounding applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub identification: Identification,
    pub income_statement: IncomeStatement,
    pub margins: Margins,
    pub balance_sheet: BalanceSheet,
    pub financial_structure: FinancialStructure,
    pub returns: Returns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub stock_code: String,
    pub company_name: String,
    pub period: String,
    pub currency: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub net_revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub net_income: f64,
    pub eps: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub equity: f64,
    pub cash_and_equivalents: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialStructure {
    pub debt_ratio: f64,
    pub equity_ratio: f64,
    pub current_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Returns {
    pub roa: f64,
    pub roe: f64,
}

/// Qualitative band for a 0-100 score.
pub fn interpret_score(score: f64) -> &'static str {
    match score {
        s if s >= 80.0 => "Excellent",
        s if s >= 60.0 => "Good",
        s if s >= 40.0 => "Fair",
        s if s >= 20.0 => "Poor",
        _ => "Critical",
    }
}
