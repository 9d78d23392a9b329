//! Snapshot-level fundamental analytics: trends, peer ranking, factor
//! exposures, cost of capital and capital allocation.

pub mod capital_allocation;
pub mod cost_of_capital;
pub mod factor;
pub mod peer;
pub mod trend;

pub use capital_allocation::{
    AllocationInputs, AllocationMix, CapitalAllocationAnalysis, CapitalAllocationAnalyzer,
};
pub use cost_of_capital::{CapitalOverrides, CostOfCapitalCalculator, RoicWaccAnalysis, WaccAssumptions};
pub use factor::{Factor, FactorDetails, FactorExposures, FactorModel};
pub use peer::{PeerAnalysis, PeerAnalyzer, PeerComparison, PeerMetric};
pub use trend::{TrendAnalysis, TrendClassifier, TrendDirection, TrendMetric};
