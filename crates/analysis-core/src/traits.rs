use crate::FinancialSnapshot;

/// Source of normalized financial snapshots, keyed by stock code and period label.
///
/// Implementations must never fail the engine: unreadable entries are reported as absent.
pub trait SnapshotSource: Send + Sync {
    /// Load one snapshot, or `None` when the (company, period) pair is unknown.
    fn load_snapshot(&self, stock_code: &str, period: &str) -> Option<FinancialSnapshot>;

    /// Load several periods in the requested order, silently dropping unresolvable ones.
    fn load_multiple_periods(&self, stock_code: &str, periods: &[String]) -> Vec<FinancialSnapshot> {
        periods
            .iter()
            .filter_map(|period| self.load_snapshot(stock_code, period))
            .collect()
    }

    /// Period labels available for a company, sorted ascending.
    fn list_available_periods(&self, stock_code: &str) -> Vec<String>;

    /// Every stock code with at least one snapshot, sorted ascending.
    fn list_all_stocks(&self) -> Vec<String>;
}
