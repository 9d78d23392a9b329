//! Generic equal-weight four-component scorer.
//!
//! A scorer is four pure rules over a config section `C` and an input `I`.
//! Each rule maps to 0-100 and may raise red flags; the total is always the
//! unweighted mean of the four components.

use serde::{Deserialize, Serialize};

/// Number of components in every composite score.
pub const COMPONENT_COUNT: usize = 4;

/// Neutral score used when a rule lacks the history it needs.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Output of one scoring rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: f64,
    pub red_flags: Vec<String>,
}

impl ComponentScore {
    pub fn clean(score: f64) -> Self {
        Self {
            score,
            red_flags: Vec::new(),
        }
    }

    pub fn flagged(score: f64, flag: impl Into<String>) -> Self {
        Self {
            score,
            red_flags: vec![flag.into()],
        }
    }

    pub fn neutral() -> Self {
        Self::clean(NEUTRAL_SCORE)
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.red_flags.push(flag.into());
        self
    }
}

/// A named pure function from config and input to a component score.
pub struct ScoringRule<C, I: ?Sized> {
    pub name: &'static str,
    pub apply: fn(&C, &I) -> ComponentScore,
}

impl<C, I: ?Sized> ScoringRule<C, I> {
    pub const fn new(name: &'static str, apply: fn(&C, &I) -> ComponentScore) -> Self {
        Self { name, apply }
    }
}

impl<C, I: ?Sized> Clone for ScoringRule<C, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, I: ?Sized> Copy for ScoringRule<C, I> {}

/// Unweighted mean of four component scores.
pub fn equal_weight_total(components: &[f64; COMPONENT_COUNT]) -> f64 {
    components.iter().sum::<f64>() / COMPONENT_COUNT as f64
}

/// Any score made of exactly four equally weighted components.
pub trait FourComponentScore {
    fn components(&self) -> [f64; COMPONENT_COUNT];

    fn total(&self) -> f64 {
        equal_weight_total(&self.components())
    }
}

/// Evaluated rules, in rule order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutcome {
    pub components: [ComponentScore; COMPONENT_COUNT],
}

impl CompositeOutcome {
    pub fn scores(&self) -> [f64; COMPONENT_COUNT] {
        [
            self.components[0].score,
            self.components[1].score,
            self.components[2].score,
            self.components[3].score,
        ]
    }

    /// All red flags, grouped by component in rule order.
    pub fn red_flags(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|c| c.red_flags.iter().cloned())
            .collect()
    }
}

impl FourComponentScore for CompositeOutcome {
    fn components(&self) -> [f64; COMPONENT_COUNT] {
        self.scores()
    }
}

pub struct CompositeScorer<C, I: ?Sized> {
    config: C,
    rules: [ScoringRule<C, I>; COMPONENT_COUNT],
}

impl<C, I: ?Sized> CompositeScorer<C, I> {
    pub fn new(config: C, rules: [ScoringRule<C, I>; COMPONENT_COUNT]) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn rule_names(&self) -> [&'static str; COMPONENT_COUNT] {
        self.rules.map(|r| r.name)
    }

    pub fn evaluate(&self, input: &I) -> CompositeOutcome {
        CompositeOutcome {
            components: self.rules.map(|rule| {
                let mut component = (rule.apply)(&self.config, input);
                component.score = component.score.clamp(0.0, 100.0);
                component
            }),
        }
    }
}
