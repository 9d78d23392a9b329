use crate::FinancialAnalysisService;
use analysis_core::{AnalysisError, EngineConfig, FinancialSnapshot};
use approx::assert_relative_eq;
use early_warning::WarningLevel;
use fundamental_analysis::{AllocationInputs, CapitalOverrides, PeerMetric, TrendDirection};
use quality_scoring::{FourComponentScore, ManagementInputs};
use snapshot_store::InMemorySnapshotStore;

fn snapshot(code: &str, year: i32, season: u8, revenue: f64) -> FinancialSnapshot {
    FinancialSnapshot {
        stock_code: code.to_string(),
        company_name: format!("Company {}", code),
        report_year: year,
        report_season: season,
        report_period: format!("{}Q{}", year, season),
        cash_and_equivalents: 200_000.0,
        accounts_receivable: 50_000.0,
        inventory: 40_000.0,
        total_assets: 1_000_000.0,
        total_liabilities: 400_000.0,
        equity: 600_000.0,
        net_revenue: revenue,
        gross_profit: revenue * 0.5,
        operating_income: revenue * 0.25,
        net_income: revenue * 0.2,
        eps: revenue / 100_000.0,
        operating_cash_flow: Some(revenue * 0.2),
        short_term_debt: Some(50_000.0),
        long_term_debt: Some(150_000.0),
        ..Default::default()
    }
}

/// Company 2330 over six quarters plus four single-quarter peers.
fn service() -> FinancialAnalysisService<InMemorySnapshotStore> {
    let mut snapshots = vec![
        snapshot("2330", 2022, 3, 400_000.0),
        snapshot("2330", 2022, 4, 420_000.0),
        snapshot("2330", 2023, 1, 440_000.0),
        snapshot("2330", 2023, 2, 460_000.0),
        snapshot("2330", 2023, 3, 480_000.0),
        snapshot("2330", 2023, 4, 500_000.0),
    ];
    for (code, revenue, liabilities) in [
        ("2303", 300_000.0, 500_000.0),
        ("2454", 350_000.0, 300_000.0),
        ("3711", 250_000.0, 600_000.0),
        ("2408", 200_000.0, 700_000.0),
    ] {
        let mut peer = snapshot(code, 2023, 4, revenue);
        peer.total_liabilities = liabilities;
        peer.equity = 1_000_000.0 - liabilities;
        snapshots.push(peer);
    }
    FinancialAnalysisService::new(snapshots.into_iter().collect(), EngineConfig::default())
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_missing_snapshot_is_not_found() {
    let service = service();
    let err = service.snapshot("9999", "2023Q4").unwrap_err();
    assert!(err.is_not_found());
    assert!(service.roic_wacc("2330", "2019Q1", &CapitalOverrides::default()).is_err());
    assert!(matches!(
        service.early_warnings("2330", "2019Q1", None),
        Err(AnalysisError::NotFound(_))
    ));
}

#[test]
fn test_summary_and_latest() {
    let service = service();
    let summary = service.summary("2330", "2023Q4").unwrap();
    assert_eq!(summary.identification.period, "2023Q4");
    assert_relative_eq!(summary.margins.gross_margin, 50.0);

    let latest = service.latest_snapshot("2330").unwrap();
    assert_eq!(latest.report_period, "2023Q4");
    assert!(service.latest_snapshot("0000").is_err());
}

#[test]
fn test_trend_orders_requested_periods() {
    let service = service();
    let requested = codes(&["2023Q3", "2022Q4", "2023Q1"]);
    let trend = service.trend("2330", Some(&requested)).unwrap();

    assert_eq!(trend.metrics[0].periods, vec!["2022Q4", "2023Q1", "2023Q3"]);
    assert_eq!(trend.metrics[0].trend_direction(), TrendDirection::Improving);
    assert_eq!(trend.company_name, "Company 2330");
}

#[test]
fn test_trend_over_all_periods() {
    let service = service();
    let trend = service.trend("2330", None).unwrap();
    assert_eq!(trend.metrics[0].values.len(), 6);
    // 500k against 420k four quarters earlier
    assert_relative_eq!(
        trend.metrics[0].yoy_change().unwrap(),
        80_000.0 / 420_000.0 * 100.0,
        epsilon = 1e-9
    );

    assert!(matches!(
        service.trend("2303", None),
        Err(AnalysisError::InsufficientData(_))
    ));
    assert!(service.trend("0000", None).unwrap_err().is_not_found());
}

#[test]
fn test_peer_comparison_skips_missing_codes() {
    let service = service();
    let analysis = service
        .compare_peers(&codes(&["2330", "2454", "9999"]), "2023Q4", Some(&[PeerMetric::DebtRatio]))
        .unwrap();

    let comparison = &analysis.comparisons[0];
    assert_eq!(comparison.stock_codes, vec!["2330", "2454"]);
    // Literal maximum, even though lower debt is better
    assert_eq!(comparison.best_performer(), Some("Company 2330"));
    assert_eq!(comparison.worst_performer(), Some("Company 2454"));
    assert_eq!(analysis.summary, "Overall leader: 2330 (top rank in 1 metrics)");
}

#[test]
fn test_peer_comparison_default_metrics() {
    let service = service();
    let analysis = service
        .compare_peers(&codes(&["2330", "2454", "2303"]), "2023Q4", None)
        .unwrap();
    assert_eq!(analysis.comparisons.len(), PeerMetric::DEFAULT.len());

    assert!(service
        .compare_peers(&codes(&["2330"]), "2023Q4", None)
        .is_err());
}

#[test]
fn test_factor_exposures_use_universe_when_peers_short() {
    let service = service();
    let explicit = codes(&["2303", "2454", "3711", "2408"]);
    let with_peers = service.factor_exposures("2330", "2023Q4", Some(&explicit)).unwrap();
    let auto = service.factor_exposures("2330", "2023Q4", Some(&codes(&["2454"]))).unwrap();

    assert_eq!(with_peers.details.peer_count, 4);
    assert_eq!(auto.details.peer_count, 4);
    assert_relative_eq!(with_peers.quality, auto.quality, epsilon = 1e-9);
}

#[test]
fn test_factor_exposures_need_peers_for_period() {
    let service = service();
    assert!(matches!(
        service.factor_exposures("2330", "2023Q1", None),
        Err(AnalysisError::InsufficientData(_))
    ));
}

#[test]
fn test_management_score_passthrough() {
    let service = service();
    let score = service.management_score(&ManagementInputs {
        ceo_tenure_years: 5.0,
        cfo_tenure_years: 4.0,
        ..Default::default()
    });
    assert_relative_eq!(score.tenure_stability, 90.0);
}

#[test]
fn test_earnings_quality_default_history() {
    let service = service();
    let score = service.earnings_quality("2330", "2023Q4", None).unwrap();

    // Six quarters available, all of them used
    assert!(score.details.earnings_volatility.is_some());
    assert_eq!(score.accrual_quality, 100.0);
    // Net income 20% of revenue vs operating income 25%: a 25% gap
    assert_eq!(score.one_off_dependency, 50.0);
    let [a, b, c, d] = score.components();
    assert_relative_eq!(score.total(), (a + b + c + d) / 4.0);

    let early = service.earnings_quality("2330", "2023Q1", None).unwrap();
    assert_eq!(early.earnings_stability, 50.0);
    assert!(early.details.earnings_volatility.is_none());
}

#[test]
fn test_roic_wacc_from_store() {
    let service = service();
    let analysis = service
        .roic_wacc("2330", "2023Q4", &CapitalOverrides::default())
        .unwrap();
    // NOPAT 125000 x 0.8 on 1,000,000 invested
    assert_relative_eq!(analysis.roic, 10.0, epsilon = 1e-9);
    assert!(analysis.is_value_creating());
}

#[test]
fn test_early_warnings_on_healthy_growth() {
    let service = service();
    let report = service.early_warnings("2330", "2023Q4", None).unwrap();
    assert_eq!(report.warning_level, WarningLevel::None);
    assert_eq!(report.signal_count(), 0);
}

#[test]
fn test_early_warnings_flag_distress() {
    let mut store: Vec<FinancialSnapshot> = Vec::new();
    store.extend([
        snapshot("1101", 2023, 1, 500_000.0),
        snapshot("1101", 2023, 2, 500_000.0),
        snapshot("1101", 2023, 3, 500_000.0),
    ]);
    let mut distressed = snapshot("1101", 2023, 4, 500_000.0);
    distressed.total_liabilities = 850_000.0;
    distressed.equity = 150_000.0;
    distressed.operating_cash_flow = Some(-10_000.0);
    store.push(distressed);

    let service = FinancialAnalysisService::new(
        store.into_iter().collect::<InMemorySnapshotStore>(),
        EngineConfig::default(),
    );
    let report = service.early_warnings("1101", "2023Q4", None).unwrap();
    assert_eq!(report.warning_level, WarningLevel::Critical);
}

#[test]
fn test_capital_allocation_uses_previous_debt() {
    let service = service();
    let analysis = service
        .capital_allocation(
            "2330",
            "2023Q4",
            &AllocationInputs {
                dividends: 100_000.0,
                capex: 300_000.0,
                ..Default::default()
            },
        )
        .unwrap();
    // Debt is flat quarter to quarter
    assert_eq!(analysis.debt_change, 0.0);
    assert_eq!(analysis.period, "2023Q4");
    assert!(analysis.allocation_mix.is_some());
}
