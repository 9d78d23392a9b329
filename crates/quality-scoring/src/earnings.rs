//! Earnings quality: accruals, working capital, one-off income and stability.

use crate::composite::{ComponentScore, CompositeScorer, FourComponentScore, ScoringRule};
use analysis_core::stats::coefficient_of_variation;
use analysis_core::{EarningsQualityThresholds, FinancialSnapshot};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Periods of net income needed before stability is scored.
pub const MIN_STABILITY_PERIODS: usize = 4;

/// Points deducted per working-capital anomaly.
const WORKING_CAPITAL_PENALTY: f64 = 25.0;

/// The current period plus its chronological history.
///
/// `history` is oldest first and normally ends with the current period.
#[derive(Debug, Clone, Copy)]
pub struct EarningsWindow<'a> {
    pub current: &'a FinancialSnapshot,
    pub history: &'a [FinancialSnapshot],
}

impl<'a> EarningsWindow<'a> {
    pub fn new(current: &'a FinancialSnapshot, history: &'a [FinancialSnapshot]) -> Self {
        Self { current, history }
    }

    /// Period compared against for growth: the latest history entry strictly
    /// before the current period.
    pub fn previous(&self) -> Option<&'a FinancialSnapshot> {
        let current = self.current.period_key();
        self.history
            .iter()
            .filter(|s| s.period_key() < current)
            .max_by_key(|s| s.period_key())
    }

    pub fn net_incomes(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.net_income).collect()
    }
}

/// Signed accrual ratio (net income - operating cash flow) / total assets.
/// Zero when operating cash flow is missing or zero, or assets are zero.
pub fn accrual_ratio(s: &FinancialSnapshot) -> f64 {
    match s.operating_cash_flow {
        Some(ocf) if ocf != 0.0 && s.total_assets != 0.0 => (s.net_income - ocf) / s.total_assets,
        _ => 0.0,
    }
}

/// Fractional growth, zero when the base is not positive.
fn fractional_growth(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous
    } else {
        0.0
    }
}

/// 100 below half the threshold, 75 below it, 50 below twice it, else 20.
fn stepped_band(ratio: f64, threshold: f64) -> f64 {
    if ratio >= threshold * 2.0 {
        20.0
    } else if ratio >= threshold {
        50.0
    } else if ratio >= threshold * 0.5 {
        75.0
    } else {
        100.0
    }
}

fn accrual_rule(t: &EarningsQualityThresholds, w: &EarningsWindow<'_>) -> ComponentScore {
    let ratio = accrual_ratio(w.current).abs();
    let threshold = t.accrual_ratio_threshold;
    let score = stepped_band(ratio, threshold);

    if ratio >= threshold * 2.0 {
        ComponentScore::flagged(
            score,
            format!("Very high accruals ({:.1}%) - earnings quality concern", ratio * 100.0),
        )
    } else if ratio >= threshold {
        ComponentScore::flagged(score, format!("Elevated accruals ({:.1}%)", ratio * 100.0))
    } else {
        ComponentScore::clean(score)
    }
}

fn working_capital_rule(t: &EarningsQualityThresholds, w: &EarningsWindow<'_>) -> ComponentScore {
    let previous = match w.previous() {
        Some(p) => p,
        None => return ComponentScore::neutral(),
    };
    let current = w.current;

    let revenue_growth = fractional_growth(current.net_revenue, previous.net_revenue);
    let receivable_growth = fractional_growth(current.accounts_receivable, previous.accounts_receivable);
    let inventory_growth = fractional_growth(current.inventory, previous.inventory);
    let threshold = t.working_capital_spike_threshold;

    let mut component = ComponentScore::clean(100.0);
    if receivable_growth > revenue_growth + threshold {
        component.score -= WORKING_CAPITAL_PENALTY;
        component = component.with_flag(format!(
            "Receivables growing faster than revenue (AR: {:.1}% vs Rev: {:.1}%)",
            receivable_growth * 100.0,
            revenue_growth * 100.0
        ));
    }
    if inventory_growth > revenue_growth + threshold {
        component.score -= WORKING_CAPITAL_PENALTY;
        component = component.with_flag(format!(
            "Inventory growing faster than revenue (Inv: {:.1}% vs Rev: {:.1}%)",
            inventory_growth * 100.0,
            revenue_growth * 100.0
        ));
    }
    component.score = component.score.max(0.0);
    component
}

fn one_off_rule(t: &EarningsQualityThresholds, w: &EarningsWindow<'_>) -> ComponentScore {
    let s = w.current;
    if s.net_income == 0.0 {
        return ComponentScore::neutral();
    }

    let ratio = (s.net_income - s.operating_income).abs() / s.net_income.abs();
    let threshold = t.one_off_income_threshold;
    let score = stepped_band(ratio, threshold);

    if ratio >= threshold * 2.0 {
        ComponentScore::flagged(
            score,
            format!("High non-operating income dependency ({:.1}%)", ratio * 100.0),
        )
    } else if ratio >= threshold {
        ComponentScore::flagged(score, format!("Moderate non-operating income ({:.1}%)", ratio * 100.0))
    } else {
        ComponentScore::clean(score)
    }
}

fn stability_rule(_: &EarningsQualityThresholds, w: &EarningsWindow<'_>) -> ComponentScore {
    if w.history.len() < MIN_STABILITY_PERIODS {
        return ComponentScore::neutral();
    }

    let cv = coefficient_of_variation(&w.net_incomes());
    match cv {
        v if v <= 0.1 => ComponentScore::clean(100.0),
        v if v <= 0.2 => ComponentScore::clean(80.0),
        v if v <= 0.3 => ComponentScore::clean(60.0),
        v if v <= 0.5 => ComponentScore::flagged(40.0, format!("High earnings volatility (CV: {:.1}%)", v * 100.0)),
        v => ComponentScore::flagged(20.0, format!("Very high earnings volatility (CV: {:.1}%)", v * 100.0)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarningsQualityDetails {
    pub accrual_ratio: f64,
    /// Coefficient of variation of net income; absent below four periods
    pub earnings_volatility: Option<f64>,
    pub num_red_flags: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EarningsQualityScore {
    pub accrual_quality: f64,
    pub working_capital_behavior: f64,
    pub one_off_dependency: f64,
    pub earnings_stability: f64,
    pub red_flags: Vec<String>,
    pub commentary: String,
    pub details: EarningsQualityDetails,
}

impl FourComponentScore for EarningsQualityScore {
    fn components(&self) -> [f64; 4] {
        [
            self.accrual_quality,
            self.working_capital_behavior,
            self.one_off_dependency,
            self.earnings_stability,
        ]
    }
}

impl Serialize for EarningsQualityScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EarningsQualityScore", 8)?;
        state.serialize_field("accrual_quality", &self.accrual_quality)?;
        state.serialize_field("working_capital_behavior", &self.working_capital_behavior)?;
        state.serialize_field("one_off_dependency", &self.one_off_dependency)?;
        state.serialize_field("earnings_stability", &self.earnings_stability)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("red_flags", &self.red_flags)?;
        state.serialize_field("commentary", &self.commentary)?;
        state.serialize_field("details", &self.details)?;
        state.end()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EarningsQualityScorer {
    thresholds: EarningsQualityThresholds,
}

impl EarningsQualityScorer {
    pub fn new(thresholds: EarningsQualityThresholds) -> Self {
        Self { thresholds }
    }

    /// Score `current` given its chronological `history` (oldest first, ending
    /// with `current`). Short histories yield neutral components, never errors.
    pub fn score(&self, current: &FinancialSnapshot, history: &[FinancialSnapshot]) -> EarningsQualityScore {
        let window = EarningsWindow::new(current, history);
        let scorer = CompositeScorer::new(
            self.thresholds,
            [
                ScoringRule::new("accrual_quality", accrual_rule),
                ScoringRule::new("working_capital_behavior", working_capital_rule),
                ScoringRule::new("one_off_dependency", one_off_rule),
                ScoringRule::new("earnings_stability", stability_rule),
            ],
        );
        let outcome = scorer.evaluate(&window);
        let [accrual_quality, working_capital_behavior, one_off_dependency, earnings_stability] =
            outcome.scores();
        let red_flags = outcome.red_flags();

        let earnings_volatility = if history.len() >= MIN_STABILITY_PERIODS {
            Some(coefficient_of_variation(&window.net_incomes()))
        } else {
            None
        };

        let mut score = EarningsQualityScore {
            accrual_quality,
            working_capital_behavior,
            one_off_dependency,
            earnings_stability,
            details: EarningsQualityDetails {
                accrual_ratio: accrual_ratio(current),
                earnings_volatility,
                num_red_flags: red_flags.len(),
            },
            red_flags,
            commentary: String::new(),
        };
        score.commentary = commentary(&score);
        debug!(
            stock_code = %current.stock_code,
            period = %current.report_period,
            history = history.len(),
            total = score.total(),
            "earnings quality scored"
        );
        score
    }
}

fn commentary(score: &EarningsQualityScore) -> String {
    let total = score.total();
    let quality = match total {
        t if t >= 80.0 => "High",
        t if t >= 60.0 => "Good",
        t if t >= 40.0 => "Fair",
        _ => "Poor",
    };

    let mut parts = vec![format!("{} earnings quality (score: {:.0})", quality, total)];
    if score.red_flags.is_empty() {
        parts.push("No major concerns".to_string());
    } else {
        parts.push(format!("{} concern(s) identified", score.red_flags.len()));
    }

    let weak_spots = [
        (score.accrual_quality, "high accruals"),
        (score.working_capital_behavior, "working capital anomalies"),
        (score.one_off_dependency, "one-off income dependency"),
        (score.earnings_stability, "volatile earnings"),
    ];
    parts.extend(
        weak_spots
            .iter()
            .filter(|(value, _)| *value < 50.0)
            .map(|(_, note)| note.to_string()),
    );

    parts.join(". ") + "."
}
