//! Four-component quality scores: management quality and earnings quality.

pub mod composite;
pub mod earnings;
pub mod management;

pub use composite::{ComponentScore, CompositeOutcome, CompositeScorer, FourComponentScore, ScoringRule};
pub use earnings::{EarningsQualityDetails, EarningsQualityScore, EarningsQualityScorer, EarningsWindow};
pub use management::{ManagementDetails, ManagementInputs, ManagementScore, ManagementScorer};
