//! Multi-period trend classification.
//!
//! Direction looks only at the last three observations and requires strict
//! monotonicity, so one counter-move in the tail reads as "stable".

use analysis_core::{AnalysisError, FinancialSnapshot};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Minimum number of periods for a trend analysis.
pub const MIN_TREND_PERIODS: usize = 2;

/// Observations inspected when classifying direction.
const DIRECTION_WINDOW: usize = 3;

/// Observations required before a year-over-year change is reported.
const YOY_MIN_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Declining => "declining",
            TrendDirection::Stable => "stable",
            TrendDirection::InsufficientData => "insufficient_data",
        }
    }
}

/// Classify a chronological value sequence.
pub fn classify_direction(values: &[f64]) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::InsufficientData;
    }
    let recent = &values[values.len().saturating_sub(DIRECTION_WINDOW)..];

    if recent.windows(2).all(|w| w[1] > w[0]) {
        TrendDirection::Improving
    } else if recent.windows(2).all(|w| w[1] < w[0]) {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// One metric observed over ordered periods.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendMetric {
    pub metric_name: String,
    pub periods: Vec<String>,
    pub values: Vec<f64>,
}

impl TrendMetric {
    pub fn new(metric_name: impl Into<String>, periods: Vec<String>, values: Vec<f64>) -> Self {
        Self {
            metric_name: metric_name.into(),
            periods,
            values,
        }
    }

    /// Build the series in the order the snapshots are given; no re-sorting.
    pub fn from_snapshots(
        metric_name: &str,
        snapshots: &[FinancialSnapshot],
        extractor: fn(&FinancialSnapshot) -> f64,
    ) -> Self {
        Self {
            metric_name: metric_name.to_string(),
            periods: snapshots.iter().map(|s| s.report_period.clone()).collect(),
            values: snapshots.iter().map(extractor).collect(),
        }
    }

    pub fn trend_direction(&self) -> TrendDirection {
        classify_direction(&self.values)
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Latest value against the value four periods back (five when that tick
    /// exists), as a percentage. `None` below four points or on a zero base.
    pub fn yoy_change(&self) -> Option<f64> {
        let n = self.values.len();
        if n < YOY_MIN_POINTS {
            return None;
        }
        let current = self.values[n - 1];
        let year_ago = if n >= 5 {
            self.values[n - 5]
        } else {
            self.values[n - 4]
        };
        if year_ago == 0.0 {
            return None;
        }
        Some(((current - year_ago) / year_ago) * 100.0)
    }
}

impl Serialize for TrendMetric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TrendMetric", 6)?;
        state.serialize_field("metric_name", &self.metric_name)?;
        state.serialize_field("periods", &self.periods)?;
        state.serialize_field("values", &self.values)?;
        state.serialize_field("trend_direction", &self.trend_direction())?;
        state.serialize_field("latest_value", &self.latest_value())?;
        state.serialize_field("yoy_change", &self.yoy_change())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub stock_code: String,
    pub company_name: String,
    pub metrics: Vec<TrendMetric>,
    pub summary: String,
}

/// The fixed metric battery of a trend analysis.
pub const TREND_METRICS: &[(&str, fn(&FinancialSnapshot) -> f64)] = &[
    ("Net Revenue", |s| s.net_revenue),
    ("Gross Margin (%)", FinancialSnapshot::gross_margin),
    ("Operating Margin (%)", FinancialSnapshot::operating_margin),
    ("Net Margin (%)", FinancialSnapshot::net_margin),
    ("EPS", |s| s.eps),
    ("Debt Ratio (%)", FinancialSnapshot::debt_ratio),
    ("ROE (%)", FinancialSnapshot::roe),
];

/// Turns an ordered snapshot series into per-metric direction and YoY change.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrendClassifier;

impl TrendClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Analyze `snapshots`, which the caller has already put in period order.
    pub fn analyze(
        &self,
        stock_code: &str,
        snapshots: &[FinancialSnapshot],
    ) -> Result<TrendAnalysis, AnalysisError> {
        if snapshots.len() < MIN_TREND_PERIODS {
            return Err(AnalysisError::InsufficientData(format!(
                "trend analysis for {} needs at least {} periods, got {}",
                stock_code,
                MIN_TREND_PERIODS,
                snapshots.len()
            )));
        }

        let metrics: Vec<TrendMetric> = TREND_METRICS
            .iter()
            .map(|(name, extractor)| TrendMetric::from_snapshots(name, snapshots, *extractor))
            .collect();
        let summary = summarize(&metrics);
        debug!(stock_code, periods = snapshots.len(), "trend analysis built");

        Ok(TrendAnalysis {
            stock_code: stock_code.to_string(),
            company_name: snapshots[0].company_name.clone(),
            metrics,
            summary,
        })
    }
}

/// Group metric names into improving / declining / stable buckets.
pub fn summarize(metrics: &[TrendMetric]) -> String {
    let mut improving = Vec::new();
    let mut declining = Vec::new();
    let mut stable = Vec::new();

    for metric in metrics {
        match metric.trend_direction() {
            TrendDirection::Improving => improving.push(metric.metric_name.as_str()),
            TrendDirection::Declining => declining.push(metric.metric_name.as_str()),
            _ => stable.push(metric.metric_name.as_str()),
        }
    }

    let parts: Vec<String> = [("Improving", improving), ("Declining", declining), ("Stable", stable)]
        .into_iter()
        .filter(|(_, names)| !names.is_empty())
        .map(|(label, names)| format!("{}: {}", label, names.join(", ")))
        .collect();

    if parts.is_empty() {
        "Insufficient data for trend analysis".to_string()
    } else {
        parts.join("; ")
    }
}
