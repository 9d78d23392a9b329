//! Factor exposures: z-scores of a target company against its peer universe.
//!
//! Each factor is a fixed composite of snapshot ratios. Mean and sample
//! standard deviation are taken over the peers only; the target never
//! contributes to its own benchmark.

use analysis_core::stats::{mean, peer_std_dev, z_score};
use analysis_core::{AnalysisError, FinancialSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum usable peer values per factor.
pub const MIN_FACTOR_PEERS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Quality,
    Value,
    Momentum,
    Size,
    Volatility,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Quality,
        Factor::Value,
        Factor::Momentum,
        Factor::Size,
        Factor::Volatility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Factor::Quality => "quality",
            Factor::Value => "value",
            Factor::Momentum => "momentum",
            Factor::Size => "size",
            Factor::Volatility => "volatility",
        }
    }

    /// Raw composite for one snapshot.
    pub fn composite(&self, s: &FinancialSnapshot) -> f64 {
        match self {
            Factor::Quality => s.roe() + s.operating_margin() - s.debt_ratio() / 2.0,
            // Higher EPS reads as cheaper relative to peers
            Factor::Value => s.eps,
            // Net margin stands in for price momentum
            Factor::Momentum => s.net_margin(),
            Factor::Size => {
                if s.total_assets > 0.0 {
                    s.total_assets.ln()
                } else {
                    0.0
                }
            }
            // Higher leverage reads as higher risk
            Factor::Volatility => s.debt_ratio(),
        }
    }

    /// Whether a peer's value may enter the benchmark.
    fn is_usable(&self, value: f64) -> bool {
        match self {
            Factor::Value => value > 0.0,
            _ => value.is_finite(),
        }
    }
}

/// Z-score of `value` against `peers` with the peer-universe conventions.
pub fn peer_z_score(value: f64, peers: &[f64]) -> f64 {
    z_score(value, mean(peers), peer_std_dev(peers))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorDetails {
    pub peer_count: usize,
    pub target_roe: f64,
    pub target_total_assets: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExposures {
    pub quality: f64,
    pub value: f64,
    pub momentum: f64,
    pub size: f64,
    pub volatility: f64,
    pub commentary: String,
    pub details: FactorDetails,
}

impl FactorExposures {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Quality => self.quality,
            Factor::Value => self.value,
            Factor::Momentum => self.momentum,
            Factor::Size => self.size,
            Factor::Volatility => self.volatility,
        }
    }
}

/// Computes the five factor z-scores for a target against its peers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactorModel;

impl FactorModel {
    pub fn new() -> Self {
        Self
    }

    /// Z-score a single factor. Fails when fewer than three peers survive filtering.
    pub fn exposure(
        &self,
        factor: Factor,
        target: &FinancialSnapshot,
        peers: &[FinancialSnapshot],
    ) -> Result<f64, AnalysisError> {
        let peer_values: Vec<f64> = peers
            .iter()
            .map(|p| factor.composite(p))
            .filter(|v| factor.is_usable(*v))
            .collect();

        if peer_values.len() < MIN_FACTOR_PEERS {
            return Err(AnalysisError::InsufficientData(format!(
                "{} factor for {} needs {} usable peers, got {}",
                factor.name(),
                target.stock_code,
                MIN_FACTOR_PEERS,
                peer_values.len()
            )));
        }

        Ok(peer_z_score(factor.composite(target), &peer_values))
    }

    pub fn exposures(
        &self,
        target: &FinancialSnapshot,
        peers: &[FinancialSnapshot],
    ) -> Result<FactorExposures, AnalysisError> {
        if peers.len() < MIN_FACTOR_PEERS {
            return Err(AnalysisError::InsufficientData(format!(
                "factor exposures for {} need at least {} peers, got {}",
                target.stock_code,
                MIN_FACTOR_PEERS,
                peers.len()
            )));
        }

        let quality = self.exposure(Factor::Quality, target, peers)?;
        let value = self.exposure(Factor::Value, target, peers)?;
        let momentum = self.exposure(Factor::Momentum, target, peers)?;
        let size = self.exposure(Factor::Size, target, peers)?;
        let volatility = self.exposure(Factor::Volatility, target, peers)?;
        debug!(
            stock_code = %target.stock_code,
            peers = peers.len(),
            quality,
            value,
            "factor exposures computed"
        );

        Ok(FactorExposures {
            quality,
            value,
            momentum,
            size,
            volatility,
            commentary: commentary(quality, value, momentum, size, volatility),
            details: FactorDetails {
                peer_count: peers.len(),
                target_roe: target.roe(),
                target_total_assets: target.total_assets,
            },
        })
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn commentary(quality: f64, value: f64, momentum: f64, size: f64, volatility: f64) -> String {
    let mut parts: Vec<&str> = Vec::new();

    if quality > 1.5 {
        parts.push("strong quality profile");
    } else if quality > 0.5 {
        parts.push("above-average quality");
    } else if quality < -1.5 {
        parts.push("weak quality profile");
    } else if quality < -0.5 {
        parts.push("below-average quality");
    }

    if value > 1.0 {
        parts.push("attractive valuation");
    } else if value < -1.0 {
        parts.push("expensive valuation");
    }

    if momentum > 1.0 {
        parts.push("strong momentum");
    } else if momentum < -1.0 {
        parts.push("weak momentum");
    }

    if size > 1.5 {
        parts.push("large cap");
    } else if size < -1.5 {
        parts.push("small cap");
    } else {
        parts.push("mid cap");
    }

    if volatility > 1.0 {
        parts.push("higher volatility/risk");
    } else if volatility < -1.0 {
        parts.push("lower volatility/risk");
    }

    parts
        .iter()
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(". ")
        + "."
}
