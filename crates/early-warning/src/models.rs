use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Severity of a single fired rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SignalSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSeverity::Low => "low",
            SignalSeverity::Medium => "medium",
            SignalSeverity::High => "high",
            SignalSeverity::Critical => "critical",
        }
    }
}

/// Overall level of a report, ordered none < low < medium < high < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl WarningLevel {
    /// Ordinal reduction of fired signals.
    ///
    /// Any critical wins, then any high. Three or more mediums make the
    /// level medium; one or two make it low.
    pub fn from_signals(signals: &[EarlyWarningSignal]) -> Self {
        if signals.is_empty() {
            return WarningLevel::None;
        }

        let count = |severity: SignalSeverity| signals.iter().filter(|s| s.severity == severity).count();

        if count(SignalSeverity::Critical) > 0 {
            WarningLevel::Critical
        } else if count(SignalSeverity::High) > 0 {
            WarningLevel::High
        } else if count(SignalSeverity::Medium) >= 3 {
            WarningLevel::Medium
        } else {
            WarningLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarningLevel::None => "none",
            WarningLevel::Low => "low",
            WarningLevel::Medium => "medium",
            WarningLevel::High => "high",
            WarningLevel::Critical => "critical",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            WarningLevel::Critical => {
                "URGENT: Immediate review required. Consider reducing position or exiting. High risk of financial distress."
            }
            WarningLevel::High => {
                "Closely monitor position. Conduct deep-dive analysis. Consider reducing exposure."
            }
            WarningLevel::Medium => "Watch list. Monitor next quarter results. Prepare contingency plans.",
            WarningLevel::Low => "Minor concerns identified. Continue regular monitoring.",
            WarningLevel::None => "No significant concerns. Maintain current monitoring cadence.",
        }
    }
}

/// One fired detection rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarningSignal {
    pub signal_name: String,
    pub severity: SignalSeverity,
    pub current_value: f64,
    pub threshold_value: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EarlyWarningReport {
    pub warning_level: WarningLevel,
    pub triggered_signals: Vec<EarlyWarningSignal>,
    pub recommendation: String,
    pub commentary: String,
}

impl EarlyWarningReport {
    pub fn from_signals(signals: Vec<EarlyWarningSignal>) -> Self {
        let warning_level = WarningLevel::from_signals(&signals);
        let commentary = if signals.is_empty() {
            "No early warning signals detected. Financial health appears stable.".to_string()
        } else {
            let names: Vec<&str> = signals.iter().map(|s| s.signal_name.as_str()).collect();
            format!(
                "Warning level: {}. Detected {} signal(s): {}. Recommend detailed investigation.",
                warning_level.as_str().to_uppercase(),
                signals.len(),
                names.join(", ")
            )
        };

        Self {
            warning_level,
            recommendation: warning_level.recommendation().to_string(),
            triggered_signals: signals,
            commentary,
        }
    }

    pub fn signal_count(&self) -> usize {
        self.triggered_signals.len()
    }
}

impl Serialize for EarlyWarningReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EarlyWarningReport", 5)?;
        state.serialize_field("warning_level", &self.warning_level)?;
        state.serialize_field("triggered_signals", &self.triggered_signals)?;
        state.serialize_field("signal_count", &self.signal_count())?;
        state.serialize_field("recommendation", &self.recommendation)?;
        state.serialize_field("commentary", &self.commentary)?;
        state.end()
    }
}
