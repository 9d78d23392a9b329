//! Engine configuration.
//!
//! Every engine receives its own section by value at construction time.
//! `EngineConfig::from_env` overlays environment variables on the defaults.

use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Management-quality scoring thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManagementThresholds {
    /// Average CEO/CFO tenure (years) that scores 60
    pub tenure_good_years: f64,
    /// Average CEO/CFO tenure (years) that scores 100
    pub tenure_excellent_years: f64,
    /// Independent-director ratio below which a red flag is raised
    pub board_independence_threshold: f64,
}

impl Default for ManagementThresholds {
    fn default() -> Self {
        Self {
            tenure_good_years: 3.0,
            tenure_excellent_years: 5.0,
            board_independence_threshold: 0.30,
        }
    }
}

/// Earnings-quality scoring thresholds (all expressed as fractions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarningsQualityThresholds {
    pub accrual_ratio_threshold: f64,
    pub working_capital_spike_threshold: f64,
    pub one_off_income_threshold: f64,
}

impl Default for EarningsQualityThresholds {
    fn default() -> Self {
        Self {
            accrual_ratio_threshold: 0.10,
            working_capital_spike_threshold: 0.15,
            one_off_income_threshold: 0.20,
        }
    }
}

/// Early-warning rule thresholds (fractions; rules convert to percentage points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarningThresholds {
    pub receivable_spike_threshold: f64,
    pub inventory_spike_threshold: f64,
    /// Negative: the allowed drop of operating margin below its trailing average
    pub margin_compression_threshold: f64,
    pub debt_ratio_critical: f64,
}

impl Default for EarlyWarningThresholds {
    fn default() -> Self {
        Self {
            receivable_spike_threshold: 0.20,
            inventory_spike_threshold: 0.20,
            margin_compression_threshold: -0.05,
            debt_ratio_critical: 0.70,
        }
    }
}

/// Cost-of-capital assumptions (fractions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalAssumptions {
    pub risk_free_rate: f64,
    pub market_risk_premium: f64,
    pub beta: f64,
    pub tax_rate: f64,
}

impl Default for CapitalAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            market_risk_premium: 0.06,
            beta: 1.0,
            tax_rate: 0.20,
        }
    }
}

/// Complete, immutable engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub management: ManagementThresholds,
    pub earnings_quality: EarningsQualityThresholds,
    pub early_warning: EarlyWarningThresholds,
    pub capital: CapitalAssumptions,
}

impl EngineConfig {
    /// Defaults overlaid with any recognised environment variables.
    ///
    /// Unparsable values are logged and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] but reading from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str, default: f64| -> f64 {
            match lookup(key) {
                Some(raw) => match raw.trim().parse::<f64>() {
                    Ok(value) => value,
                    Err(_) => {
                        tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
                        default
                    }
                },
                None => default,
            }
        };

        let d = Self::default();
        Self {
            management: ManagementThresholds {
                tenure_good_years: read("MANAGEMENT_TENURE_GOOD", d.management.tenure_good_years),
                tenure_excellent_years: read(
                    "MANAGEMENT_TENURE_EXCELLENT",
                    d.management.tenure_excellent_years,
                ),
                board_independence_threshold: read(
                    "BOARD_INDEPENDENCE_THRESHOLD",
                    d.management.board_independence_threshold,
                ),
            },
            earnings_quality: EarningsQualityThresholds {
                accrual_ratio_threshold: read(
                    "ACCRUAL_RATIO_THRESHOLD",
                    d.earnings_quality.accrual_ratio_threshold,
                ),
                working_capital_spike_threshold: read(
                    "WORKING_CAPITAL_SPIKE_THRESHOLD",
                    d.earnings_quality.working_capital_spike_threshold,
                ),
                one_off_income_threshold: read(
                    "ONE_OFF_INCOME_THRESHOLD",
                    d.earnings_quality.one_off_income_threshold,
                ),
            },
            early_warning: EarlyWarningThresholds {
                receivable_spike_threshold: read(
                    "EWS_RECEIVABLE_SPIKE_THRESHOLD",
                    d.early_warning.receivable_spike_threshold,
                ),
                inventory_spike_threshold: read(
                    "EWS_INVENTORY_SPIKE_THRESHOLD",
                    d.early_warning.inventory_spike_threshold,
                ),
                margin_compression_threshold: read(
                    "EWS_MARGIN_COMPRESSION_THRESHOLD",
                    d.early_warning.margin_compression_threshold,
                ),
                debt_ratio_critical: read("EWS_DEBT_RATIO_CRITICAL", d.early_warning.debt_ratio_critical),
            },
            capital: CapitalAssumptions {
                risk_free_rate: read("DEFAULT_RISK_FREE_RATE", d.capital.risk_free_rate),
                market_risk_premium: read("DEFAULT_MARKET_RISK_PREMIUM", d.capital.market_risk_premium),
                beta: read("DEFAULT_BETA", d.capital.beta),
                tax_rate: read("DEFAULT_TAX_RATE", d.capital.tax_rate),
            },
        }
    }

    fn named_values(&self) -> [(&'static str, f64); 14] {
        let (m, eq, ew, c) = (&self.management, &self.earnings_quality, &self.early_warning, &self.capital);
        [
            ("tenure_good_years", m.tenure_good_years),
            ("tenure_excellent_years", m.tenure_excellent_years),
            ("board_independence_threshold", m.board_independence_threshold),
            ("accrual_ratio_threshold", eq.accrual_ratio_threshold),
            ("working_capital_spike_threshold", eq.working_capital_spike_threshold),
            ("one_off_income_threshold", eq.one_off_income_threshold),
            ("receivable_spike_threshold", ew.receivable_spike_threshold),
            ("inventory_spike_threshold", ew.inventory_spike_threshold),
            ("margin_compression_threshold", ew.margin_compression_threshold),
            ("debt_ratio_critical", ew.debt_ratio_critical),
            ("risk_free_rate", c.risk_free_rate),
            ("market_risk_premium", c.market_risk_premium),
            ("beta", c.beta),
            ("tax_rate", c.tax_rate),
        ]
    }

    /// Reject configurations the engines cannot interpret.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in self.named_values() {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidData(format!(
                    "{} must be a finite number, got {}",
                    name, value
                )));
            }
        }

        let m = &self.management;
        if m.tenure_good_years <= 0.0 || m.tenure_excellent_years <= m.tenure_good_years {
            return Err(AnalysisError::InvalidData(format!(
                "tenure thresholds must satisfy 0 < good ({}) < excellent ({})",
                m.tenure_good_years, m.tenure_excellent_years
            )));
        }
        if !(0.0..=1.0).contains(&m.board_independence_threshold) {
            return Err(AnalysisError::InvalidData(
                "board_independence_threshold must be between 0 and 1".to_string(),
            ));
        }

        let eq = &self.earnings_quality;
        for (name, value) in [
            ("accrual_ratio_threshold", eq.accrual_ratio_threshold),
            ("working_capital_spike_threshold", eq.working_capital_spike_threshold),
            ("one_off_income_threshold", eq.one_off_income_threshold),
        ] {
            if value <= 0.0 {
                return Err(AnalysisError::InvalidData(format!("{} must be positive", name)));
            }
        }

        let ew = &self.early_warning;
        if ew.margin_compression_threshold >= 0.0 {
            return Err(AnalysisError::InvalidData(
                "margin_compression_threshold must be negative".to_string(),
            ));
        }
        if ew.debt_ratio_critical <= 0.0 || ew.debt_ratio_critical > 1.0 {
            return Err(AnalysisError::InvalidData(
                "debt_ratio_critical must be between 0 and 1".to_string(),
            ));
        }

        let c = &self.capital;
        if !(0.0..1.0).contains(&c.tax_rate) {
            return Err(AnalysisError::InvalidData("tax_rate must be in [0, 1)".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_documented_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.management.tenure_good_years, 3.0);
        assert_eq!(config.management.tenure_excellent_years, 5.0);
        assert_eq!(config.management.board_independence_threshold, 0.30);
        assert_eq!(config.earnings_quality.accrual_ratio_threshold, 0.10);
        assert_eq!(config.earnings_quality.working_capital_spike_threshold, 0.15);
        assert_eq!(config.earnings_quality.one_off_income_threshold, 0.20);
        assert_eq!(config.early_warning.receivable_spike_threshold, 0.20);
        assert_eq!(config.early_warning.margin_compression_threshold, -0.05);
        assert_eq!(config.early_warning.debt_ratio_critical, 0.70);
        assert_eq!(config.capital.risk_free_rate, 0.02);
        assert_eq!(config.capital.market_risk_premium, 0.06);
        assert_eq!(config.capital.beta, 1.0);
        assert_eq!(config.capital.tax_rate, 0.20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lookup_overlay_and_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("DEFAULT_BETA", "1.3"),
            ("EWS_DEBT_RATIO_CRITICAL", "0.65"),
            ("DEFAULT_TAX_RATE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.capital.beta, 1.3);
        assert_eq!(config.early_warning.debt_ratio_critical, 0.65);
        assert_eq!(config.capital.tax_rate, 0.20);
    }

    #[test]
    fn test_validate_rejects_inverted_tenure() {
        let mut config = EngineConfig::default();
        config.management.tenure_good_years = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        for (key, raw) in [
            ("EWS_DEBT_RATIO_CRITICAL", "NaN"),
            ("DEFAULT_BETA", "inf"),
            ("MANAGEMENT_TENURE_EXCELLENT", "inf"),
            ("ACCRUAL_RATIO_THRESHOLD", "NaN"),
            ("DEFAULT_MARKET_RISK_PREMIUM", "-inf"),
        ] {
            let config = EngineConfig::from_lookup(|k| (k == key).then(|| raw.to_string()));
            assert!(
                matches!(config.validate(), Err(AnalysisError::InvalidData(_))),
                "{}={} accepted",
                key,
                raw
            );
        }
    }

    #[test]
    fn test_validate_rejects_positive_margin_threshold() {
        let mut config = EngineConfig::default();
        config.early_warning.margin_compression_threshold = 0.05;
        assert!(config.validate().is_err());
    }
}
