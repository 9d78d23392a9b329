//! Cross-sectional peer comparison for one reporting period.

use analysis_core::{AnalysisError, FinancialSnapshot};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use tracing::debug;

/// Minimum companies needed for a meaningful comparison.
pub const MIN_COMPARISON_COMPANIES: usize = 2;

/// Metrics available for peer comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerMetric {
    GrossMargin,
    OperatingMargin,
    NetMargin,
    Roe,
    Roa,
    DebtRatio,
    CurrentRatio,
}

impl PeerMetric {
    /// Metrics compared when the caller does not choose.
    pub const DEFAULT: [PeerMetric; 6] = [
        PeerMetric::GrossMargin,
        PeerMetric::OperatingMargin,
        PeerMetric::NetMargin,
        PeerMetric::Roe,
        PeerMetric::Roa,
        PeerMetric::DebtRatio,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PeerMetric::GrossMargin => "Gross Margin (%)",
            PeerMetric::OperatingMargin => "Operating Margin (%)",
            PeerMetric::NetMargin => "Net Margin (%)",
            PeerMetric::Roe => "ROE (%)",
            PeerMetric::Roa => "ROA (%)",
            PeerMetric::DebtRatio => "Debt Ratio (%)",
            PeerMetric::CurrentRatio => "Current Ratio",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        !matches!(self, PeerMetric::DebtRatio)
    }

    pub fn extract(&self, s: &FinancialSnapshot) -> f64 {
        match self {
            PeerMetric::GrossMargin => s.gross_margin(),
            PeerMetric::OperatingMargin => s.operating_margin(),
            PeerMetric::NetMargin => s.net_margin(),
            PeerMetric::Roe => s.roe(),
            PeerMetric::Roa => s.roa(),
            PeerMetric::DebtRatio => s.debt_ratio(),
            PeerMetric::CurrentRatio => s.current_ratio().unwrap_or(0.0),
        }
    }

    /// Parse a user-facing name such as "Gross Margin" or "debt_ratio".
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "grossmargin" => Some(PeerMetric::GrossMargin),
            "operatingmargin" => Some(PeerMetric::OperatingMargin),
            "netmargin" => Some(PeerMetric::NetMargin),
            "roe" => Some(PeerMetric::Roe),
            "roa" => Some(PeerMetric::Roa),
            "debtratio" => Some(PeerMetric::DebtRatio),
            "currentratio" => Some(PeerMetric::CurrentRatio),
            _ => None,
        }
    }
}

/// Assign ranks 1..n (1 = best). Ties keep input order: the first
/// occurrence receives the lower rank.
pub fn rank_values(values: &[f64], higher_is_better: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable, which gives the tie-break for free
    order.sort_by(|&a, &b| {
        let cmp = values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal);
        if higher_is_better {
            cmp.reverse()
        } else {
            cmp
        }
    });

    let mut ranking = vec![0; values.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        ranking[idx] = rank + 1;
    }
    ranking
}

/// First index holding the extreme value selected by `better`.
fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some(b) if !better(v, values[b]) => {}
            _ => best = Some(i),
        }
    }
    best
}

/// One metric compared across a company list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PeerComparison {
    pub metric_name: String,
    pub companies: Vec<String>,
    pub stock_codes: Vec<String>,
    pub values: Vec<f64>,
    pub ranking: Vec<usize>,
}

impl PeerComparison {
    pub fn new(
        metric_name: impl Into<String>,
        companies: Vec<String>,
        stock_codes: Vec<String>,
        values: Vec<f64>,
        higher_is_better: bool,
    ) -> Self {
        let ranking = rank_values(&values, higher_is_better);
        Self {
            metric_name: metric_name.into(),
            companies,
            stock_codes,
            values,
            ranking,
        }
    }

    /// Index of the literal maximum value (first occurrence).
    pub fn best_index(&self) -> Option<usize> {
        extreme_index(&self.values, |v, b| v > b)
    }

    /// Index of the literal minimum value (first occurrence).
    pub fn worst_index(&self) -> Option<usize> {
        extreme_index(&self.values, |v, b| v < b)
    }

    /// Company holding the maximum value, regardless of metric polarity.
    pub fn best_performer(&self) -> Option<&str> {
        self.best_index()
            .and_then(|i| self.companies.get(i))
            .map(String::as_str)
    }

    /// Company holding the minimum value, regardless of metric polarity.
    pub fn worst_performer(&self) -> Option<&str> {
        self.worst_index()
            .and_then(|i| self.companies.get(i))
            .map(String::as_str)
    }
}

impl Serialize for PeerComparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PeerComparison", 7)?;
        state.serialize_field("metric_name", &self.metric_name)?;
        state.serialize_field("companies", &self.companies)?;
        state.serialize_field("stock_codes", &self.stock_codes)?;
        state.serialize_field("values", &self.values)?;
        state.serialize_field("ranking", &self.ranking)?;
        state.serialize_field("best_performer", &self.best_performer().unwrap_or("N/A"))?;
        state.serialize_field("worst_performer", &self.worst_performer().unwrap_or("N/A"))?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerAnalysis {
    pub period: String,
    pub comparisons: Vec<PeerComparison>,
    pub summary: String,
}

/// Ranks an undifferentiated list of companies on each selected metric.
#[derive(Debug, Default, Clone, Copy)]
pub struct PeerAnalyzer;

impl PeerAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build one comparison for `metric` over `snapshots` in input order.
    pub fn compare_metric(&self, metric: PeerMetric, snapshots: &[FinancialSnapshot]) -> PeerComparison {
        PeerComparison::new(
            metric.label(),
            snapshots.iter().map(|s| s.company_name.clone()).collect(),
            snapshots.iter().map(|s| s.stock_code.clone()).collect(),
            snapshots.iter().map(|s| metric.extract(s)).collect(),
            metric.higher_is_better(),
        )
    }

    pub fn compare(
        &self,
        period: &str,
        snapshots: &[FinancialSnapshot],
        metrics: &[PeerMetric],
    ) -> Result<PeerAnalysis, AnalysisError> {
        if snapshots.len() < MIN_COMPARISON_COMPANIES {
            return Err(AnalysisError::InsufficientData(format!(
                "peer comparison for {} needs at least {} companies, got {}",
                period,
                MIN_COMPARISON_COMPANIES,
                snapshots.len()
            )));
        }

        let comparisons: Vec<PeerComparison> = metrics
            .iter()
            .map(|m| self.compare_metric(*m, snapshots))
            .collect();
        let summary = summarize(&comparisons, snapshots);
        debug!(period, companies = snapshots.len(), metrics = comparisons.len(), "peer comparison built");

        Ok(PeerAnalysis {
            period: period.to_string(),
            comparisons,
            summary,
        })
    }
}

/// Name the company that is best performer on the most metrics.
///
/// Companies are matched by position, never by code substring.
fn summarize(comparisons: &[PeerComparison], snapshots: &[FinancialSnapshot]) -> String {
    if comparisons.is_empty() {
        return "Peer comparison completed".to_string();
    }

    let mut first_place = vec![0usize; snapshots.len()];
    for comparison in comparisons {
        if let Some(idx) = comparison.best_index() {
            first_place[idx] += 1;
        }
    }

    // Earliest company wins a tie on count
    match extreme_index(
        &first_place.iter().map(|&c| c as f64).collect::<Vec<_>>(),
        |v, b| v > b,
    ) {
        Some(leader) => format!(
            "Overall leader: {} (top rank in {} metrics)",
            snapshots[leader].stock_code, first_place[leader]
        ),
        None => "Peer comparison completed".to_string(),
    }
}
