//! Prediction result types.
//!
//! Represents the interpreted output of the diabetes classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score (in percent) at which a prediction becomes `High`.
pub const HIGH_RISK_THRESHOLD: f64 = 50.0;

/// Risk classification for diabetes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// Not likely to have diabetes
    #[serde(alias = "Non-Diabetic", alias = "LOW", alias = "low", alias = "0")]
    Low,
    /// Likely to have diabetes
    #[serde(alias = "Diabetic", alias = "HIGH", alias = "high", alias = "1")]
    High,
}

impl RiskCategory {
    /// Map a hard classifier label (0 = non-diabetic, 1 = diabetic).
    #[must_use]
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Verdict line shown to the user.
    #[must_use]
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Low => "You are NOT likely to have diabetes.",
            Self::High => "You ARE likely to have diabetes.",
        }
    }

    /// Caption shown under the verdict.
    #[must_use]
    pub fn encouragement(&self) -> &'static str {
        match self {
            Self::Low => "Keep up the healthy lifestyle!",
            Self::High => "Take steps to lower your risk",
        }
    }

    /// Heading for the advice list.
    #[must_use]
    pub fn advice_title(&self) -> &'static str {
        match self {
            Self::Low => "Health Tips",
            Self::High => "Suggestions to Improve",
        }
    }

    /// Canned lifestyle advice for this category.
    #[must_use]
    pub fn advice(&self) -> &'static [&'static str] {
        match self {
            Self::Low => &[
                "Stay active daily",
                "Eat balanced meals",
                "Limit sugar intake",
                "Get regular checkups",
                "Prioritise sleep",
            ],
            Self::High => &[
                "Reduce sugary drinks",
                "Eat more fibre-rich foods",
                "Exercise 30 mins daily",
                "Monitor blood sugar",
                "Manage stress levels",
            ],
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Map a risk score in percent to a category (`< 50` Low, `>= 50` High).
#[must_use]
pub fn classify(score: f64) -> RiskCategory {
    if score < HIGH_RISK_THRESHOLD {
        RiskCategory::Low
    } else {
        RiskCategory::High
    }
}

/// Interpreted classifier output for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Probability of the positive class in percent. `None` for hard-label classifiers.
    pub risk_score: Option<f64>,

    pub risk_category: RiskCategory,

    /// Scoring time
    pub timestamp: DateTime<Utc>,
}

impl PredictionResult {
    /// Result from a positive-class probability in `[0, 1]`.
    #[must_use]
    pub fn from_probability(positive: f64, timestamp: DateTime<Utc>) -> Self {
        let risk_score = positive * 100.0;
        Self {
            risk_score: Some(risk_score),
            risk_category: classify(risk_score),
            timestamp,
        }
    }

    /// Result from a hard label; carries no score.
    #[must_use]
    pub fn from_category(risk_category: RiskCategory, timestamp: DateTime<Utc>) -> Self {
        Self {
            risk_score: None,
            risk_category,
            timestamp,
        }
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.risk_category == RiskCategory::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_threshold() {
        assert_eq!(classify(0.0), RiskCategory::Low);
        assert_eq!(classify(49.99), RiskCategory::Low);
        assert_eq!(classify(50.0), RiskCategory::High);
        assert_eq!(classify(100.0), RiskCategory::High);
    }

    #[test]
    fn test_from_probability() {
        let result = PredictionResult::from_probability(0.8, Utc::now());
        let score = result.risk_score.expect("Should carry a score");
        assert!((score - 80.0).abs() < 1e-9);
        assert_eq!(result.risk_category, RiskCategory::High);
        assert!(result.is_positive());

        let low = PredictionResult::from_probability(0.2, Utc::now());
        assert_eq!(low.risk_category, RiskCategory::Low);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(RiskCategory::from_label(0), Some(RiskCategory::Low));
        assert_eq!(RiskCategory::from_label(1), Some(RiskCategory::High));
        assert_eq!(RiskCategory::from_label(2), None);

        let result = PredictionResult::from_category(RiskCategory::Low, Utc::now());
        assert!(result.risk_score.is_none());
    }

    #[test]
    fn test_advice_lists() {
        assert_eq!(RiskCategory::Low.advice().len(), 5);
        assert!(RiskCategory::High.advice().contains(&"Monitor blood sugar"));
        assert!(RiskCategory::High.verdict().contains("ARE"));
    }
}
