//! Classifier port: the opaque pre-trained model.
//!
//! A deployment exposes exactly one of two call shapes. The shape is fixed
//! when the model is loaded and carried as a [`ClassifierCapability`] variant.

use std::sync::Arc;

use crate::domain::FeatureVector;

/// Errors raised by a classifier invocation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    #[error("Model not loaded: {0}")]
    Unavailable(String),

    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Invalid classifier output: {0}")]
    InvalidOutput(String),
}

/// Classifier exposing only a hard label (`predict`).
pub trait LabelPredictor: Send + Sync {
    /// Predict the class: 0 = non-diabetic, 1 = diabetic.
    ///
    /// # Errors
    /// Returns error if the model cannot be evaluated.
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError>;
}

/// Classifier exposing class probabilities (`predict_proba`).
pub trait ProbabilityPredictor: Send + Sync {
    /// Probabilities `[p_negative, p_positive]`.
    ///
    /// # Errors
    /// Returns error if the model cannot be evaluated.
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError>;
}

impl<F> LabelPredictor for F
where
    F: Fn(&FeatureVector) -> Result<u8, ClassifierError> + Send + Sync,
{
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        self(features)
    }
}

impl<F> ProbabilityPredictor for F
where
    F: Fn(&FeatureVector) -> Result<[f64; 2], ClassifierError> + Send + Sync,
{
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        self(features)
    }
}

/// The classifier shape selected at load time.
#[derive(Clone)]
pub enum ClassifierCapability {
    HardLabel(Arc<dyn LabelPredictor>),
    Probability(Arc<dyn ProbabilityPredictor>),
}

impl ClassifierCapability {
    pub fn hard_label(predictor: impl LabelPredictor + 'static) -> Self {
        Self::HardLabel(Arc::new(predictor))
    }

    pub fn probability(predictor: impl ProbabilityPredictor + 'static) -> Self {
        Self::Probability(Arc::new(predictor))
    }

    /// Short name for status displays.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HardLabel(_) => "hard label",
            Self::Probability(_) => "probability",
        }
    }

    #[must_use]
    pub fn has_probability(&self) -> bool {
        matches!(self, Self::Probability(_))
    }
}

impl std::fmt::Debug for ClassifierCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClassifierCapability").field(&self.kind()).finish()
    }
}
