use analysis_core::{
    AnalysisError, AnalysisResult, EngineConfig, FinancialSnapshot, SnapshotSource, SnapshotSummary,
};
use early_warning::{EarlyWarningEngine, EarlyWarningReport, MAX_TRAILING_PERIODS};
use fundamental_analysis::factor::MIN_FACTOR_PEERS;
use fundamental_analysis::{
    AllocationInputs, CapitalAllocationAnalysis, CapitalAllocationAnalyzer, CapitalOverrides,
    CostOfCapitalCalculator, FactorExposures, FactorModel, PeerAnalysis, PeerAnalyzer, PeerMetric,
    RoicWaccAnalysis, TrendAnalysis, TrendClassifier,
};
use quality_scoring::{
    EarningsQualityScore, EarningsQualityScorer, ManagementInputs, ManagementScore, ManagementScorer,
};

#[cfg(test)]
mod tests;

/// Periods of history fed to the earnings-quality scorer by default.
pub const EARNINGS_HISTORY_PERIODS: usize = 8;

/// Largest peer universe drawn automatically for factor exposures.
pub const MAX_AUTO_PEERS: usize = 20;

/// Entry point for every analysis: resolves snapshots from a source and runs
/// the matching engine with the configured thresholds.
pub struct FinancialAnalysisService<S: SnapshotSource> {
    source: S,
    config: EngineConfig,
    trend_classifier: TrendClassifier,
    peer_analyzer: PeerAnalyzer,
    factor_model: FactorModel,
    management_scorer: ManagementScorer,
    earnings_scorer: EarningsQualityScorer,
    cost_of_capital: CostOfCapitalCalculator,
    early_warning: EarlyWarningEngine,
    capital_allocation: CapitalAllocationAnalyzer,
}

impl<S: SnapshotSource> FinancialAnalysisService<S> {
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self {
            source,
            trend_classifier: TrendClassifier::new(),
            peer_analyzer: PeerAnalyzer::new(),
            factor_model: FactorModel::new(),
            management_scorer: ManagementScorer::new(config.management),
            earnings_scorer: EarningsQualityScorer::new(config.earnings_quality),
            cost_of_capital: CostOfCapitalCalculator::new(config.capital),
            early_warning: EarlyWarningEngine::new(config.early_warning),
            capital_allocation: CapitalAllocationAnalyzer::new(),
            config,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self, stock_code: &str, period: &str) -> AnalysisResult<FinancialSnapshot> {
        self.source.load_snapshot(stock_code, period).ok_or_else(|| {
            AnalysisError::NotFound(format!("no financial data for {} in {}", stock_code, period))
        })
    }

    pub fn summary(&self, stock_code: &str, period: &str) -> AnalysisResult<SnapshotSummary> {
        Ok(self.snapshot(stock_code, period)?.summary())
    }

    pub fn latest_snapshot(&self, stock_code: &str) -> AnalysisResult<FinancialSnapshot> {
        let periods = self.source.list_available_periods(stock_code);
        let latest = periods
            .last()
            .ok_or_else(|| AnalysisError::NotFound(format!("no periods available for {}", stock_code)))?;
        self.snapshot(stock_code, latest)
    }

    pub fn list_periods(&self, stock_code: &str) -> Vec<String> {
        self.source.list_available_periods(stock_code)
    }

    pub fn list_stocks(&self) -> Vec<String> {
        self.source.list_all_stocks()
    }

    /// Load `periods` and order them by fiscal year and season.
    fn load_ordered(&self, stock_code: &str, periods: &[String]) -> Vec<FinancialSnapshot> {
        let mut snapshots = self.source.load_multiple_periods(stock_code, periods);
        snapshots.sort_by_key(FinancialSnapshot::period_key);
        snapshots
    }

    /// Available periods strictly before `period`.
    fn periods_before(&self, stock_code: &str, period: &str) -> Vec<String> {
        self.source
            .list_available_periods(stock_code)
            .into_iter()
            .filter(|p| p.as_str() < period)
            .collect()
    }

    /// Trend over `periods`, or every available period when `None`.
    pub fn trend(&self, stock_code: &str, periods: Option<&[String]>) -> AnalysisResult<TrendAnalysis> {
        let periods = match periods {
            Some(p) => p.to_vec(),
            None => self.source.list_available_periods(stock_code),
        };
        let snapshots = self.load_ordered(stock_code, &periods);
        if snapshots.is_empty() {
            return Err(AnalysisError::NotFound(format!("no financial data for {}", stock_code)));
        }

        tracing::info!("Building trend for {} over {} periods", stock_code, snapshots.len());
        self.trend_classifier.analyze(stock_code, &snapshots)
    }

    /// Rank `stock_codes` against each other for one period. Codes without
    /// data for the period are skipped.
    pub fn compare_peers(
        &self,
        stock_codes: &[String],
        period: &str,
        metrics: Option<&[PeerMetric]>,
    ) -> AnalysisResult<PeerAnalysis> {
        let snapshots: Vec<FinancialSnapshot> = stock_codes
            .iter()
            .filter_map(|code| {
                let snapshot = self.source.load_snapshot(code, period);
                if snapshot.is_none() {
                    tracing::warn!("Skipping {} in peer comparison: no data for {}", code, period);
                }
                snapshot
            })
            .collect();

        let metrics = metrics.unwrap_or(&PeerMetric::DEFAULT);
        self.peer_analyzer.compare(period, &snapshots, metrics)
    }

    /// Factor z-scores of `stock_code` against its peers. When fewer than
    /// three peer codes are given, the rest of the universe is used instead.
    pub fn factor_exposures(
        &self,
        stock_code: &str,
        period: &str,
        peers: Option<&[String]>,
    ) -> AnalysisResult<FactorExposures> {
        let target = self.snapshot(stock_code, period)?;

        let peer_codes: Vec<String> = match peers {
            Some(codes) if codes.len() >= MIN_FACTOR_PEERS => codes.to_vec(),
            _ => self
                .source
                .list_all_stocks()
                .into_iter()
                .filter(|code| code != stock_code)
                .take(MAX_AUTO_PEERS)
                .collect(),
        };

        let peer_snapshots: Vec<FinancialSnapshot> = peer_codes
            .iter()
            .filter(|code| code.as_str() != stock_code)
            .filter_map(|code| self.source.load_snapshot(code, period))
            .collect();

        tracing::info!(
            "Computing factor exposures for {} in {} against {} peers",
            stock_code,
            period,
            peer_snapshots.len()
        );
        self.factor_model.exposures(&target, &peer_snapshots)
    }

    pub fn management_score(&self, inputs: &ManagementInputs) -> ManagementScore {
        self.management_scorer.score(inputs)
    }

    /// Earnings quality of `period`. History defaults to the last eight
    /// available periods ending at `period`.
    pub fn earnings_quality(
        &self,
        stock_code: &str,
        period: &str,
        history_periods: Option<&[String]>,
    ) -> AnalysisResult<EarningsQualityScore> {
        let current = self.snapshot(stock_code, period)?;

        let periods = match history_periods {
            Some(p) => p.to_vec(),
            None => {
                let mut upto = self.periods_before(stock_code, period);
                upto.push(period.to_string());
                let skip = upto.len().saturating_sub(EARNINGS_HISTORY_PERIODS);
                upto.split_off(skip)
            }
        };
        let history = self.load_ordered(stock_code, &periods);

        Ok(self.earnings_scorer.score(&current, &history))
    }

    pub fn roic_wacc(
        &self,
        stock_code: &str,
        period: &str,
        overrides: &CapitalOverrides,
    ) -> AnalysisResult<RoicWaccAnalysis> {
        let snapshot = self.snapshot(stock_code, period)?;
        Ok(self.cost_of_capital.analyze(&snapshot, overrides))
    }

    /// Early-warning scan of `period`. History defaults to up to five
    /// available periods before it.
    pub fn early_warnings(
        &self,
        stock_code: &str,
        period: &str,
        history_periods: Option<&[String]>,
    ) -> AnalysisResult<EarlyWarningReport> {
        let current = self.snapshot(stock_code, period)?;

        let periods = match history_periods {
            Some(p) => p.to_vec(),
            None => {
                let mut before = self.periods_before(stock_code, period);
                let skip = before.len().saturating_sub(MAX_TRAILING_PERIODS);
                before.split_off(skip)
            }
        };
        let history = self.load_ordered(stock_code, &periods);

        Ok(self.early_warning.detect(&current, &history))
    }

    /// Capital allocation of `period`; debt change is measured against the
    /// closest earlier available period.
    pub fn capital_allocation(
        &self,
        stock_code: &str,
        period: &str,
        inputs: &AllocationInputs,
    ) -> AnalysisResult<CapitalAllocationAnalysis> {
        let current = self.snapshot(stock_code, period)?;
        let previous = self
            .periods_before(stock_code, period)
            .last()
            .and_then(|p| self.source.load_snapshot(stock_code, p));

        Ok(self.capital_allocation.analyze(&current, previous.as_ref(), inputs))
    }
}
