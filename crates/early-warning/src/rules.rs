//! Detection rules. Each is a pure function over the current snapshot and its
//! trailing history (oldest first, strictly before the current period).
//! Rules needing history stay silent when it is missing.

use crate::models::{EarlyWarningSignal, SignalSeverity};
use analysis_core::stats::{growth_rate, mean};
use analysis_core::{EarlyWarningThresholds, FinancialSnapshot};

pub type WarningRule =
    fn(&EarlyWarningThresholds, &FinancialSnapshot, &[FinancialSnapshot]) -> Option<EarlyWarningSignal>;

/// Trailing periods averaged by the margin and cash rules.
const AVERAGE_WINDOW: usize = 3;

/// Debt ratio (fraction) at which leverage becomes critical.
const CRITICAL_LEVERAGE: f64 = 0.8;

/// Cash decline (%) against the trailing average that raises a signal.
const CASH_DECLINE_THRESHOLD: f64 = -30.0;
const CASH_DECLINE_SEVERE: f64 = -50.0;

/// The full battery in evaluation order.
pub const RULES: [WarningRule; 6] = [
    receivables_spike,
    inventory_buildup,
    margin_compression,
    high_leverage,
    cash_depletion,
    negative_operating_cash_flow,
];

fn signal(
    name: &str,
    severity: SignalSeverity,
    current_value: f64,
    threshold_value: f64,
    description: String,
) -> EarlyWarningSignal {
    EarlyWarningSignal {
        signal_name: name.to_string(),
        severity,
        current_value,
        threshold_value,
        description,
    }
}

fn tail(trailing: &[FinancialSnapshot], n: usize) -> &[FinancialSnapshot] {
    &trailing[trailing.len().saturating_sub(n)..]
}

pub fn receivables_spike(
    t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    let previous = trailing.last()?;
    let revenue_growth = growth_rate(current.net_revenue, previous.net_revenue);
    let receivable_growth = growth_rate(current.accounts_receivable, previous.accounts_receivable);
    let limit = revenue_growth + t.receivable_spike_threshold * 100.0;

    (receivable_growth > limit).then(|| {
        signal(
            "Accounts Receivable Spike",
            SignalSeverity::Medium,
            receivable_growth,
            limit,
            format!(
                "AR growing at {:.1}% vs revenue {:.1}%. May indicate revenue recognition issues or collection problems.",
                receivable_growth, revenue_growth
            ),
        )
    })
}

pub fn inventory_buildup(
    t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    let previous = trailing.last()?;
    let revenue_growth = growth_rate(current.net_revenue, previous.net_revenue);
    let inventory_growth = growth_rate(current.inventory, previous.inventory);
    let limit = revenue_growth + t.inventory_spike_threshold * 100.0;

    (inventory_growth > limit).then(|| {
        signal(
            "Inventory Buildup",
            SignalSeverity::Medium,
            inventory_growth,
            limit,
            format!(
                "Inventory growing at {:.1}% vs revenue {:.1}%. May indicate slowing demand or obsolescence risk.",
                inventory_growth, revenue_growth
            ),
        )
    })
}

pub fn margin_compression(
    t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    if trailing.len() < 2 {
        return None;
    }
    let margins: Vec<f64> = tail(trailing, AVERAGE_WINDOW)
        .iter()
        .map(FinancialSnapshot::operating_margin)
        .collect();
    let avg_margin = mean(&margins);
    let current_margin = current.operating_margin();
    let change = current_margin - avg_margin;
    let threshold = t.margin_compression_threshold * 100.0;

    if change >= threshold {
        return None;
    }
    let severity = if change < threshold * 2.0 {
        SignalSeverity::High
    } else {
        SignalSeverity::Medium
    };
    Some(signal(
        "Margin Compression",
        severity,
        current_margin,
        avg_margin + threshold,
        format!(
            "Operating margin declined to {:.1}% from avg {:.1}%. Indicates pricing pressure or cost inflation.",
            current_margin, avg_margin
        ),
    ))
}

pub fn high_leverage(
    t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    _trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    let debt_ratio = current.debt_ratio() / 100.0;
    if debt_ratio < t.debt_ratio_critical {
        return None;
    }
    let severity = if debt_ratio >= CRITICAL_LEVERAGE {
        SignalSeverity::Critical
    } else {
        SignalSeverity::High
    };
    Some(signal(
        "High Leverage",
        severity,
        debt_ratio * 100.0,
        t.debt_ratio_critical * 100.0,
        format!(
            "Debt ratio at {:.1}% exceeds safe threshold. Financial distress risk.",
            debt_ratio * 100.0
        ),
    ))
}

pub fn cash_depletion(
    _t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    if trailing.len() < 2 {
        return None;
    }
    let balances: Vec<f64> = tail(trailing, AVERAGE_WINDOW)
        .iter()
        .map(|s| s.cash_and_equivalents)
        .collect();
    let avg_cash = mean(&balances);
    let decline = if avg_cash > 0.0 {
        (current.cash_and_equivalents - avg_cash) / avg_cash * 100.0
    } else {
        0.0
    };

    if decline >= CASH_DECLINE_THRESHOLD {
        return None;
    }
    let severity = if decline < CASH_DECLINE_SEVERE {
        SignalSeverity::High
    } else {
        SignalSeverity::Medium
    };
    Some(signal(
        "Cash Depletion",
        severity,
        decline,
        CASH_DECLINE_THRESHOLD,
        format!("Cash declined {:.1}%. Liquidity concern.", decline.abs()),
    ))
}

pub fn negative_operating_cash_flow(
    _t: &EarlyWarningThresholds,
    current: &FinancialSnapshot,
    _trailing: &[FinancialSnapshot],
) -> Option<EarlyWarningSignal> {
    let ocf = current.operating_cash_flow.filter(|v| *v < 0.0)?;
    Some(signal(
        "Negative Operating Cash Flow",
        SignalSeverity::High,
        ocf,
        0.0,
        "Negative operating cash flow. Company burning cash from operations.".to_string(),
    ))
}
