//! Management quality: tenure, board independence, insider alignment and
//! governance, equally weighted.

use crate::composite::{ComponentScore, CompositeScorer, FourComponentScore, ScoringRule};
use analysis_core::stats::normalize_score;
use analysis_core::ManagementThresholds;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// Board independence ratio that maps to a full score.
const FULL_INDEPENDENCE_RATIO: f64 = 0.5;

/// Multiplier applied to the board score of family-controlled companies.
const FAMILY_CONTROL_PENALTY: f64 = 0.7;

/// Raw governance facts about a company's leadership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementInputs {
    pub ceo_tenure_years: f64,
    pub cfo_tenure_years: f64,
    /// Used only when `total_directors` is zero
    pub board_independence_ratio: f64,
    pub independent_directors: u32,
    pub total_directors: u32,
    pub family_controlled: bool,
    pub insider_buys: u32,
    pub insider_sells: u32,
    pub governance_incidents: u32,
    pub audit_issues: u32,
    pub related_party_transactions: u32,
}

impl ManagementInputs {
    pub fn avg_tenure(&self) -> f64 {
        (self.ceo_tenure_years + self.cfo_tenure_years) / 2.0
    }

    /// Director counts win over the supplied ratio when a board size is known.
    pub fn independence_ratio(&self) -> f64 {
        if self.total_directors > 0 {
            self.independent_directors as f64 / self.total_directors as f64
        } else {
            self.board_independence_ratio
        }
    }

    pub fn insider_net_activity(&self) -> i64 {
        self.insider_buys as i64 - self.insider_sells as i64
    }

    pub fn governance_flags(&self) -> u32 {
        self.governance_incidents
            .saturating_add(self.audit_issues)
            .saturating_add(self.related_party_transactions)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementDetails {
    pub avg_tenure_years: f64,
    pub board_independence_ratio: f64,
    pub insider_net_activity: i64,
    pub total_red_flags: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ManagementScore {
    pub tenure_stability: f64,
    pub board_independence: f64,
    pub insider_alignment: f64,
    pub governance: f64,
    pub red_flags: Vec<String>,
    pub commentary: String,
    pub details: ManagementDetails,
}

impl FourComponentScore for ManagementScore {
    fn components(&self) -> [f64; 4] {
        [
            self.tenure_stability,
            self.board_independence,
            self.insider_alignment,
            self.governance,
        ]
    }
}

impl Serialize for ManagementScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ManagementScore", 8)?;
        state.serialize_field("tenure_stability", &self.tenure_stability)?;
        state.serialize_field("board_independence", &self.board_independence)?;
        state.serialize_field("insider_alignment", &self.insider_alignment)?;
        state.serialize_field("governance", &self.governance)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("red_flags", &self.red_flags)?;
        state.serialize_field("commentary", &self.commentary)?;
        state.serialize_field("details", &self.details)?;
        state.end()
    }
}

/// Piecewise-linear tenure ramp: 0 at zero years, 60 at `good`, 100 at `excellent`.
pub fn tenure_score(avg_tenure: f64, t: &ManagementThresholds) -> f64 {
    if avg_tenure >= t.tenure_excellent_years {
        100.0
    } else if avg_tenure >= t.tenure_good_years {
        60.0 + 40.0 * (avg_tenure - t.tenure_good_years) / (t.tenure_excellent_years - t.tenure_good_years)
    } else {
        (avg_tenure / t.tenure_good_years) * 60.0
    }
}

pub fn board_score(ratio: f64, family_controlled: bool) -> f64 {
    let base = normalize_score(ratio, 0.0, FULL_INDEPENDENCE_RATIO);
    if family_controlled {
        base * FAMILY_CONTROL_PENALTY
    } else {
        base
    }
}

pub fn insider_score(net: i64) -> f64 {
    match net {
        n if n >= 5 => 100.0,
        n if n >= 2 => 80.0,
        n if n >= 0 => 60.0,
        n if n >= -2 => 40.0,
        n if n >= -5 => 20.0,
        _ => 0.0,
    }
}

pub fn governance_score(flags: u32) -> f64 {
    match flags {
        0 => 100.0,
        1 => 70.0,
        2 => 40.0,
        n => (40.0 - 20.0 * (n as f64 - 2.0)).max(0.0),
    }
}

fn tenure_rule(t: &ManagementThresholds, input: &ManagementInputs) -> ComponentScore {
    let avg = input.avg_tenure();
    let score = tenure_score(avg, t);
    if score < 60.0 {
        ComponentScore::flagged(score, format!("Limited management tenure (avg {:.1} years)", avg))
    } else {
        ComponentScore::clean(score)
    }
}

fn board_rule(t: &ManagementThresholds, input: &ManagementInputs) -> ComponentScore {
    let ratio = input.independence_ratio();
    let mut component = ComponentScore::clean(board_score(ratio, input.family_controlled));
    if ratio < t.board_independence_threshold {
        component = component.with_flag(format!(
            "Board independence below {:.0}% ({:.0}%)",
            t.board_independence_threshold * 100.0,
            ratio * 100.0
        ));
    }
    component
}

fn insider_rule(_: &ManagementThresholds, input: &ManagementInputs) -> ComponentScore {
    let net = input.insider_net_activity();
    let score = insider_score(net);
    if net < 0 {
        ComponentScore::flagged(score, format!("Net insider selling ({} transactions)", -net))
    } else {
        ComponentScore::clean(score)
    }
}

fn governance_rule(_: &ManagementThresholds, input: &ManagementInputs) -> ComponentScore {
    let flags = input.governance_flags();
    let score = governance_score(flags);
    if flags > 2 {
        ComponentScore::flagged(score, format!("Multiple governance red flags ({})", flags))
    } else {
        ComponentScore::clean(score)
    }
}

/// Scores management quality against the configured tenure and board thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagementScorer {
    thresholds: ManagementThresholds,
}

impl ManagementScorer {
    pub fn new(thresholds: ManagementThresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(&self, input: &ManagementInputs) -> ManagementScore {
        let scorer = CompositeScorer::new(
            self.thresholds,
            [
                ScoringRule::new("tenure_stability", tenure_rule),
                ScoringRule::new("board_independence", board_rule),
                ScoringRule::new("insider_alignment", insider_rule),
                ScoringRule::new("governance", governance_rule),
            ],
        );
        let outcome = scorer.evaluate(input);
        let [tenure_stability, board_independence, insider_alignment, governance] = outcome.scores();

        let score = ManagementScore {
            tenure_stability,
            board_independence,
            insider_alignment,
            governance,
            red_flags: outcome.red_flags(),
            commentary: commentary(input, tenure_stability, board_independence),
            details: ManagementDetails {
                avg_tenure_years: input.avg_tenure(),
                board_independence_ratio: input.independence_ratio(),
                insider_net_activity: input.insider_net_activity(),
                total_red_flags: input.governance_flags(),
            },
        };
        debug!(total = score.total(), flags = score.red_flags.len(), "management score computed");
        score
    }
}

fn commentary(input: &ManagementInputs, tenure: f64, board: f64) -> String {
    let avg = input.avg_tenure();
    let ratio_pct = input.independence_ratio() * 100.0;
    let net = input.insider_net_activity();
    let flags = input.governance_flags();

    let mut parts = Vec::with_capacity(4);

    parts.push(if tenure >= 80.0 {
        format!("Experienced management team (avg {:.1} years)", avg)
    } else if tenure >= 60.0 {
        format!("Stable management (avg {:.1} years)", avg)
    } else {
        format!("Limited tenure (avg {:.1} years) - execution risk", avg)
    });

    parts.push(if board >= 70.0 {
        format!("Strong board independence ({:.0}%)", ratio_pct)
    } else if board >= 50.0 {
        format!("Moderate board independence ({:.0}%)", ratio_pct)
    } else {
        format!("Weak board independence ({:.0}%) - governance concern", ratio_pct)
    });

    parts.push(match net {
        n if n > 0 => format!("Insider buying ({} net transactions) - positive signal", n),
        n if n < 0 => format!("Insider selling ({} net transactions) - caution", -n),
        _ => "Neutral insider activity".to_string(),
    });

    parts.push(match flags {
        0 => "Clean governance record".to_string(),
        1 | 2 => format!("{} governance concern(s)", flags),
        n => format!("Multiple governance red flags ({}) - serious concern", n),
    });

    parts.join(". ") + "."
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scorer() -> ManagementScorer {
        ManagementScorer::new(ManagementThresholds::default())
    }

    #[test]
    fn test_tenure_between_good_and_excellent() {
        let input = ManagementInputs {
            ceo_tenure_years: 5.0,
            cfo_tenure_years: 4.0,
            ..Default::default()
        };
        let score = scorer().score(&input);
        assert_relative_eq!(score.tenure_stability, 90.0);
        assert_relative_eq!(score.details.avg_tenure_years, 4.5);
    }

    #[test]
    fn test_tenure_ramp_segments() {
        let t = ManagementThresholds::default();
        assert_eq!(tenure_score(0.0, &t), 0.0);
        assert_relative_eq!(tenure_score(1.5, &t), 30.0);
        assert_relative_eq!(tenure_score(3.0, &t), 60.0);
        assert_eq!(tenure_score(5.0, &t), 100.0);
        assert_eq!(tenure_score(12.0, &t), 100.0);
    }

    #[test]
    fn test_board_counts_override_ratio() {
        let input = ManagementInputs {
            board_independence_ratio: 0.1,
            independent_directors: 4,
            total_directors: 10,
            ..Default::default()
        };
        assert_relative_eq!(input.independence_ratio(), 0.4);
        assert_relative_eq!(scorer().score(&input).board_independence, 80.0, epsilon = 1e-9);

        let family = ManagementInputs {
            family_controlled: true,
            ..input
        };
        assert_relative_eq!(scorer().score(&family).board_independence, 56.0, epsilon = 1e-9);
    }

    #[test]
    fn test_board_score_caps_at_half_independent() {
        assert_eq!(board_score(0.8, false), 100.0);
        assert_eq!(board_score(0.0, false), 0.0);
    }

    #[test]
    fn test_insider_steps() {
        let expected = [
            (6, 100.0),
            (5, 100.0),
            (2, 80.0),
            (0, 60.0),
            (-1, 40.0),
            (-2, 40.0),
            (-5, 20.0),
            (-6, 0.0),
        ];
        for (net, score) in expected {
            assert_eq!(insider_score(net), score, "net {}", net);
        }
    }

    #[test]
    fn test_governance_steps() {
        assert_eq!(governance_score(0), 100.0);
        assert_eq!(governance_score(1), 70.0);
        assert_eq!(governance_score(2), 40.0);
        assert_eq!(governance_score(3), 20.0);
        assert_eq!(governance_score(4), 0.0);
        assert_eq!(governance_score(9), 0.0);
    }

    #[test]
    fn test_governance_flag_count_saturates() {
        let input = ManagementInputs {
            governance_incidents: u32::MAX,
            audit_issues: 3,
            related_party_transactions: 1,
            ..Default::default()
        };
        assert_eq!(input.governance_flags(), u32::MAX);
        let score = scorer().score(&input);
        assert_eq!(score.governance, 0.0);
        assert!(score
            .red_flags
            .iter()
            .any(|f| f.starts_with("Multiple governance red flags")));
    }

    #[test]
    fn test_total_is_mean_of_components() {
        let input = ManagementInputs {
            ceo_tenure_years: 2.0,
            cfo_tenure_years: 7.0,
            board_independence_ratio: 0.35,
            insider_buys: 3,
            insider_sells: 1,
            audit_issues: 1,
            ..Default::default()
        };
        let score = scorer().score(&input);
        let expected = (score.tenure_stability
            + score.board_independence
            + score.insider_alignment
            + score.governance)
            / 4.0;
        assert_relative_eq!(score.total(), expected);
    }

    #[test]
    fn test_red_flags_for_weak_management() {
        let input = ManagementInputs {
            ceo_tenure_years: 1.0,
            cfo_tenure_years: 1.0,
            board_independence_ratio: 0.2,
            insider_sells: 3,
            governance_incidents: 2,
            related_party_transactions: 1,
            ..Default::default()
        };
        let score = scorer().score(&input);
        assert_eq!(score.red_flags.len(), 4);
        assert_eq!(score.red_flags[0], "Limited management tenure (avg 1.0 years)");
        assert_eq!(score.red_flags[2], "Net insider selling (3 transactions)");
        assert_eq!(score.details.total_red_flags, 3);
        assert_eq!(score.details.insider_net_activity, -3);
        assert!(score.commentary.contains("Multiple governance red flags (3) - serious concern"));
        assert!(score.commentary.ends_with('.'));
    }

    #[test]
    fn test_clean_management_commentary() {
        let input = ManagementInputs {
            ceo_tenure_years: 8.0,
            cfo_tenure_years: 6.0,
            independent_directors: 5,
            total_directors: 9,
            ..Default::default()
        };
        let score = scorer().score(&input);
        assert!(score.red_flags.is_empty());
        assert_eq!(
            score.commentary,
            "Experienced management team (avg 7.0 years). Strong board independence (56%). \
             Neutral insider activity. Clean governance record."
        );
    }

    #[test]
    fn test_serialized_total() {
        let score = scorer().score(&ManagementInputs::default());
        let value = serde_json::to_value(&score).unwrap();
        assert_relative_eq!(value["total"].as_f64().unwrap(), score.total());
    }
}
