//! # Glucorisk
//!
//! Diabetes risk assessment over a pre-trained binary classifier.
//!
//! This crate provides:
//! - Health-metric intake with BMI derivation and categorization
//! - A fixed-order feature vector contract for the classifier
//! - Risk scoring over either a hard-label or a probability classifier
//! - Text/CSV reports and an append-only prediction history
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (HealthProfile, FeatureVector, PredictionResult, SessionState)
//! - `ports`: Trait definitions for the classifier and history storage
//! - `adapters`: Concrete implementations (JSON model export, CSV, SQLite, log sanitizing)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{
    BmiCategory, FeatureVector, HealthProfile, HistoryRecord, IntakeForm, PredictionResult,
    RiskCategory,
};

/// Result type for Glucorisk operations
pub type Result<T> = std::result::Result<T, GlucoriskError>;

/// Main error type for Glucorisk
#[derive(Debug, thiserror::Error)]
pub enum GlucoriskError {
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{field} {value} out of range [{min}, {max}]")]
    OutOfDomain {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Feature vector shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ports::ClassifierError> for GlucoriskError {
    fn from(err: ports::ClassifierError) -> Self {
        match err {
            ports::ClassifierError::ShapeMismatch { expected, actual } => {
                Self::ShapeMismatch { expected, actual }
            }
            other => Self::ClassifierUnavailable(other.to_string()),
        }
    }
}

impl From<adapters::model::ModelError> for GlucoriskError {
    fn from(err: adapters::model::ModelError) -> Self {
        match err {
            adapters::model::ModelError::FeatureMismatch { expected, actual } => {
                Self::ShapeMismatch {
                    expected: expected.len(),
                    actual: actual.len(),
                }
            }
            other => Self::ClassifierUnavailable(other.to_string()),
        }
    }
}
