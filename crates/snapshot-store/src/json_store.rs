use analysis_core::{AnalysisError, AnalysisResult, FinancialSnapshot, SnapshotSource};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name suffix of every snapshot: `{CODE}_{PERIOD}_enhanced.json`.
pub const SNAPSHOT_FILE_SUFFIX: &str = "_enhanced.json";

/// Reads snapshot JSON files from a flat directory.
///
/// Missing, unparsable or invalid files are logged and reported as absent.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    root: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Like [`JsonSnapshotStore::new`] but fails when `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> AnalysisResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AnalysisError::NotFound(format!(
                "snapshot directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, stock_code: &str, period: &str) -> PathBuf {
        self.root
            .join(format!("{}_{}{}", stock_code, period, SNAPSHOT_FILE_SUFFIX))
    }

    /// Read and validate one file, surfacing the failure reason.
    pub fn read_snapshot(path: &Path) -> AnalysisResult<FinancialSnapshot> {
        let raw = fs::read_to_string(path)?;
        let snapshot: FinancialSnapshot = serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::InvalidData(format!("{}: {}", path.display(), e)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// `(stock_code, period)` pairs of every snapshot file in the directory.
    fn entries(&self) -> Vec<(String, String)> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "cannot list snapshot directory");
                return Vec::new();
            }
        };

        dir.filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| parse_file_name(&name))
            .collect()
    }
}

/// Split `{CODE}_{PERIOD}_enhanced.json` into code and period.
fn parse_file_name(name: &str) -> Option<(String, String)> {
    let stem = name.strip_suffix(SNAPSHOT_FILE_SUFFIX)?;
    let (code, period) = stem.split_once('_')?;
    if code.is_empty() || period.is_empty() || period.contains('_') {
        return None;
    }
    Some((code.to_string(), period.to_string()))
}

impl SnapshotSource for JsonSnapshotStore {
    fn load_snapshot(&self, stock_code: &str, period: &str) -> Option<FinancialSnapshot> {
        let path = self.snapshot_path(stock_code, period);
        if !path.is_file() {
            debug!(stock_code, period, "snapshot file not found");
            return None;
        }

        match Self::read_snapshot(&path) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
                None
            }
        }
    }

    fn list_available_periods(&self, stock_code: &str) -> Vec<String> {
        let periods: BTreeSet<String> = self
            .entries()
            .into_iter()
            .filter(|(code, _)| code == stock_code)
            .map(|(_, period)| period)
            .collect();
        periods.into_iter().collect()
    }

    fn list_all_stocks(&self) -> Vec<String> {
        let codes: BTreeSet<String> = self.entries().into_iter().map(|(code, _)| code).collect();
        codes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn snapshot_json(code: &str, year: i32, season: u8, revenue: f64) -> String {
        format!(
            r#"{{
                "stock_code": "{code}",
                "company_name": "Company {code}",
                "report_year": {year},
                "report_season": {season},
                "report_period": "{year}Q{season}",
                "cash_and_equivalents": 1000.0,
                "accounts_receivable": 200.0,
                "inventory": 150.0,
                "total_assets": 5000.0,
                "total_liabilities": 2000.0,
                "equity": 3000.0,
                "net_revenue": {revenue},
                "gross_profit": 400.0,
                "operating_income": 250.0,
                "net_income": 200.0,
                "eps": 1.5,
                "operating_cash_flow": -50.0
            }}"#
        )
    }

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "2330_2023Q2_enhanced.json", &snapshot_json("2330", 2023, 2, 900.0));
        write(dir.path(), "2330_2023Q1_enhanced.json", &snapshot_json("2330", 2023, 1, 800.0));
        write(dir.path(), "2454_2023Q1_enhanced.json", &snapshot_json("2454", 2023, 1, 700.0));
        write(dir.path(), "notes.txt", "not a snapshot");
        dir
    }

    #[test]
    fn test_load_snapshot_with_defaults() {
        let dir = fixture();
        let store = JsonSnapshotStore::new(dir.path());

        let snapshot = store.load_snapshot("2330", "2023Q2").unwrap();
        assert_eq!(snapshot.company_name, "Company 2330");
        assert_eq!(snapshot.net_revenue, 900.0);
        assert_eq!(snapshot.currency, "TWD");
        assert_eq!(snapshot.unit, "thousand");
        assert_eq!(snapshot.operating_cash_flow, Some(-50.0));
        assert_eq!(snapshot.current_assets, None);
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = fixture();
        let store = JsonSnapshotStore::new(dir.path());
        assert!(store.load_snapshot("2330", "2019Q1").is_none());
        assert!(store.load_snapshot("9999", "2023Q1").is_none());
    }

    #[test]
    fn test_invalid_files_are_absent() {
        let dir = fixture();
        write(dir.path(), "1101_2023Q1_enhanced.json", "{ not json");
        let mut negative = snapshot_json("1102", 2023, 1, 100.0);
        negative = negative.replace("\"inventory\": 150.0", "\"inventory\": -1.0");
        write(dir.path(), "1102_2023Q1_enhanced.json", &negative);

        let store = JsonSnapshotStore::new(dir.path());
        assert!(store.load_snapshot("1101", "2023Q1").is_none());
        assert!(store.load_snapshot("1102", "2023Q1").is_none());
        assert!(matches!(
            JsonSnapshotStore::read_snapshot(&store.snapshot_path("1102", "2023Q1")),
            Err(AnalysisError::InvalidData(_))
        ));
    }

    #[test]
    fn test_listing_is_sorted() {
        let dir = fixture();
        let store = JsonSnapshotStore::new(dir.path());
        assert_eq!(store.list_available_periods("2330"), vec!["2023Q1", "2023Q2"]);
        assert_eq!(store.list_all_stocks(), vec!["2330", "2454"]);
        assert!(store.list_available_periods("9999").is_empty());
    }

    #[test]
    fn test_load_multiple_periods_drops_missing() {
        let dir = fixture();
        let store = JsonSnapshotStore::new(dir.path());
        let periods = vec!["2023Q2".to_string(), "2022Q4".to_string(), "2023Q1".to_string()];
        let loaded = store.load_multiple_periods("2330", &periods);
        let labels: Vec<&str> = loaded.iter().map(|s| s.report_period.as_str()).collect();
        assert_eq!(labels, vec!["2023Q2", "2023Q1"]);
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = fixture();
        assert!(JsonSnapshotStore::open(dir.path()).is_ok());
        let missing = JsonSnapshotStore::open(dir.path().join("absent"));
        assert!(matches!(missing, Err(AnalysisError::NotFound(_))));
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_file_name("2330_2023Q3_enhanced.json"),
            Some(("2330".to_string(), "2023Q3".to_string()))
        );
        assert_eq!(parse_file_name("2330_enhanced.json"), None);
        assert_eq!(parse_file_name("2330_2023Q3.json"), None);
    }
}
