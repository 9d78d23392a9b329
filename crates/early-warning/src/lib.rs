pub mod engine;
pub mod models;
pub mod rules;

pub use engine::{EarlyWarningEngine, MAX_TRAILING_PERIODS};
pub use models::{EarlyWarningReport, EarlyWarningSignal, SignalSeverity, WarningLevel};
pub use rules::{WarningRule, RULES};
