//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! All value types are serializable.

mod feature;
mod history;
mod prediction;
pub mod profile;
pub mod session;

pub use feature::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use history::{parse_timestamp, HistoryRecord, HISTORY_HEADER};
pub use prediction::{classify, PredictionResult, RiskCategory, HIGH_RISK_THRESHOLD};
pub use profile::{
    derive_bmi, BmiCategory, BmiSource, HealthProfile, IntakeForm, PersonalInfo, SecondaryMetrics,
};
pub use session::{SessionState, SubmissionStage};
