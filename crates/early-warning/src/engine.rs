use crate::models::EarlyWarningReport;
use crate::rules::RULES;
use analysis_core::{EarlyWarningThresholds, FinancialSnapshot};
use tracing::{debug, info};

/// Most trailing periods a detection pass looks at.
pub const MAX_TRAILING_PERIODS: usize = 5;

/// Runs the rule battery and reduces fired signals to a single level.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarlyWarningEngine {
    thresholds: EarlyWarningThresholds,
}

impl EarlyWarningEngine {
    pub fn new(thresholds: EarlyWarningThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &EarlyWarningThresholds {
        &self.thresholds
    }

    /// Evaluate `current` against `history` (chronological).
    ///
    /// Only periods strictly before `current` count as trailing history, and
    /// only the latest five of those.
    pub fn detect(&self, current: &FinancialSnapshot, history: &[FinancialSnapshot]) -> EarlyWarningReport {
        let current_key = current.period_key();
        let prior: Vec<FinancialSnapshot> = history
            .iter()
            .filter(|s| s.period_key() < current_key)
            .cloned()
            .collect();
        let trailing = &prior[prior.len().saturating_sub(MAX_TRAILING_PERIODS)..];

        let signals: Vec<_> = RULES
            .iter()
            .filter_map(|rule| rule(&self.thresholds, current, trailing))
            .collect();

        for signal in &signals {
            debug!(
                stock_code = %current.stock_code,
                signal = %signal.signal_name,
                severity = signal.severity.as_str(),
                current_value = signal.current_value,
                "warning signal fired"
            );
        }

        let report = EarlyWarningReport::from_signals(signals);
        info!(
            stock_code = %current.stock_code,
            period = %current.report_period,
            trailing = trailing.len(),
            level = report.warning_level.as_str(),
            signals = report.signal_count(),
            "early warning scan complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SignalSeverity, WarningLevel};

    fn quarter(year: i32, season: u8) -> FinancialSnapshot {
        FinancialSnapshot {
            stock_code: "2330".to_string(),
            company_name: "TSMC".to_string(),
            report_year: year,
            report_season: season,
            report_period: format!("{}Q{}", year, season),
            cash_and_equivalents: 200_000.0,
            accounts_receivable: 50_000.0,
            inventory: 40_000.0,
            total_assets: 1_000_000.0,
            total_liabilities: 400_000.0,
            equity: 600_000.0,
            net_revenue: 500_000.0,
            gross_profit: 250_000.0,
            operating_income: 125_000.0,
            net_income: 100_000.0,
            operating_cash_flow: Some(120_000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_healthy_company_has_no_signals() {
        let history = vec![quarter(2023, 1), quarter(2023, 2), quarter(2023, 3)];
        let current = quarter(2023, 4);
        let report = EarlyWarningEngine::default().detect(&current, &history);

        assert_eq!(report.warning_level, WarningLevel::None);
        assert_eq!(
            report.commentary,
            "No early warning signals detected. Financial health appears stable."
        );
    }

    #[test]
    fn test_current_period_is_not_its_own_history() {
        let mut current = quarter(2023, 4);
        current.accounts_receivable = 100_000.0;
        // History that ends with the current period itself
        let history = vec![quarter(2023, 3), current.clone()];

        let report = EarlyWarningEngine::default().detect(&current, &history);
        assert_eq!(report.signal_count(), 1);
        assert_eq!(report.triggered_signals[0].signal_name, "Accounts Receivable Spike");
        assert_eq!(report.warning_level, WarningLevel::Low);
    }

    #[test]
    fn test_later_periods_are_ignored() {
        let mut current = quarter(2023, 4);
        current.accounts_receivable = 100_000.0;
        let mut later = quarter(2024, 1);
        later.accounts_receivable = 100_000.0;
        let history = vec![quarter(2023, 3), later];

        let report = EarlyWarningEngine::default().detect(&current, &history);
        assert_eq!(report.signal_count(), 1);
        assert_eq!(report.triggered_signals[0].signal_name, "Accounts Receivable Spike");
    }

    #[test]
    fn test_distressed_company_is_critical() {
        let history = vec![quarter(2023, 1), quarter(2023, 2), quarter(2023, 3)];
        let mut current = quarter(2023, 4);
        current.total_liabilities = 900_000.0;
        current.equity = 100_000.0;
        current.cash_and_equivalents = 50_000.0;
        current.operating_cash_flow = Some(-30_000.0);
        current.operating_income = 25_000.0;

        let report = EarlyWarningEngine::default().detect(&current, &history);
        let names: Vec<&str> = report
            .triggered_signals
            .iter()
            .map(|s| s.signal_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Margin Compression",
                "High Leverage",
                "Cash Depletion",
                "Negative Operating Cash Flow"
            ]
        );
        assert!(report
            .triggered_signals
            .iter()
            .any(|s| s.severity == SignalSeverity::Critical));
        assert_eq!(report.warning_level, WarningLevel::Critical);
        assert!(report.recommendation.starts_with("URGENT"));
    }
}
