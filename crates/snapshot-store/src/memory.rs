use analysis_core::{FinancialSnapshot, SnapshotSource};
use std::collections::{BTreeMap, BTreeSet};

/// Snapshots held in memory, keyed by `(stock_code, report_period)`.
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshotStore {
    snapshots: BTreeMap<(String, String), FinancialSnapshot>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for its `(stock_code, report_period)`.
    pub fn insert(&mut self, snapshot: FinancialSnapshot) -> Option<FinancialSnapshot> {
        let key = (snapshot.stock_code.clone(), snapshot.report_period.clone());
        self.snapshots.insert(key, snapshot)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FromIterator<FinancialSnapshot> for InMemorySnapshotStore {
    fn from_iter<T: IntoIterator<Item = FinancialSnapshot>>(iter: T) -> Self {
        let mut store = Self::new();
        for snapshot in iter {
            store.insert(snapshot);
        }
        store
    }
}

impl SnapshotSource for InMemorySnapshotStore {
    fn load_snapshot(&self, stock_code: &str, period: &str) -> Option<FinancialSnapshot> {
        self.snapshots
            .get(&(stock_code.to_string(), period.to_string()))
            .cloned()
    }

    fn list_available_periods(&self, stock_code: &str) -> Vec<String> {
        self.snapshots
            .keys()
            .filter(|(code, _)| code == stock_code)
            .map(|(_, period)| period.clone())
            .collect()
    }

    fn list_all_stocks(&self) -> Vec<String> {
        let codes: BTreeSet<&String> = self.snapshots.keys().map(|(code, _)| code).collect();
        codes.into_iter().cloned().collect()
    }
}
