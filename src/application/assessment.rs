//! Assessment service: intake, scoring and history for one submission.
//!
//! This service coordinates:
//! - Validation of raw intake values into a [`HealthProfile`]
//! - Scoring through whichever classifier capability was loaded
//! - Appending the result to the history log

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::adapters::StorageError;
use crate::domain::{
    FeatureVector, HealthProfile, HistoryRecord, IntakeForm, PersonalInfo, PredictionResult,
    RiskCategory, SessionState, SubmissionStage,
};
use crate::ports::{ClassifierCapability, HistoryStore};
use crate::GlucoriskError;

/// Outcome of a successful submission.
#[derive(Debug)]
pub struct Assessment {
    pub profile: HealthProfile,
    pub result: PredictionResult,
    /// Report-only details entered alongside the metrics.
    pub personal: PersonalInfo,
    /// Values outside the documented input domains. Informational only.
    pub warnings: Vec<GlucoriskError>,
    /// Whether the history row was written.
    pub history_saved: bool,
}

/// Service for scoring submissions and recording them.
pub struct AssessmentService<S>
where
    S: HistoryStore,
{
    classifier: ClassifierCapability,
    history: Arc<S>,
    persist_history: bool,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
}

impl<S> AssessmentService<S>
where
    S: HistoryStore,
    S::Error: Into<StorageError>,
{
    /// Create a new assessment service.
    pub fn new(classifier: ClassifierCapability, history: Arc<S>) -> Self {
        Self {
            classifier,
            history,
            persist_history: true,
            last_timestamp: Mutex::new(None),
        }
    }

    /// Disable or enable history appends.
    #[must_use]
    pub fn with_persistence(mut self, persist_history: bool) -> Self {
        self.persist_history = persist_history;
        self
    }

    #[must_use]
    pub fn classifier(&self) -> &ClassifierCapability {
        &self.classifier
    }

    #[must_use]
    pub fn persists_history(&self) -> bool {
        self.persist_history
    }

    /// Validate raw values into a profile.
    ///
    /// # Errors
    /// Returns `MissingInput` for blank required fields.
    pub fn intake(&self, form: &IntakeForm) -> Result<HealthProfile, GlucoriskError> {
        let profile = HealthProfile::from_intake(form)?;
        for violation in profile.domain_violations() {
            tracing::warn!("Input outside documented domain: {}", violation);
        }
        Ok(profile)
    }

    /// Score a feature vector with the loaded classifier.
    ///
    /// # Errors
    /// Returns `ClassifierUnavailable` if the classifier fails or returns
    /// something other than two finite probabilities in `[0, 1]` or a 0/1
    /// label.
    pub fn score(&self, features: &FeatureVector) -> Result<PredictionResult, GlucoriskError> {
        let timestamp = self.next_timestamp();

        match &self.classifier {
            ClassifierCapability::Probability(model) => {
                let proba = model.predict_proba(features)?;
                if proba
                    .iter()
                    .any(|p| !p.is_finite() || !(0.0..=1.0).contains(p))
                {
                    return Err(GlucoriskError::ClassifierUnavailable(format!(
                        "invalid probabilities {proba:?}"
                    )));
                }
                Ok(PredictionResult::from_probability(proba[1], timestamp))
            }
            ClassifierCapability::HardLabel(model) => {
                let label = model.predict(features)?;
                let category = RiskCategory::from_label(label).ok_or_else(|| {
                    GlucoriskError::ClassifierUnavailable(format!("invalid label {label}"))
                })?;
                Ok(PredictionResult::from_category(category, timestamp))
            }
        }
    }

    /// Validate and score without touching history.
    ///
    /// # Errors
    /// Returns the intake or scoring error.
    pub fn assess(
        &self,
        form: &IntakeForm,
    ) -> Result<(HealthProfile, PredictionResult), GlucoriskError> {
        let profile = self.intake(form)?;
        let result = self.score(&profile.feature_vector())?;
        Ok((profile, result))
    }

    /// Run the full pipeline for the form held in `session`.
    ///
    /// Moves `session.stage` through `Validated` and `Scored`; any failure
    /// sends it back to `Idle` and no history row is written. A failed
    /// history append is logged and reported through `history_saved` but
    /// does not fail the submission.
    ///
    /// # Errors
    /// Returns `InvalidInput`, `MissingInput` or `ClassifierUnavailable`.
    pub fn submit(&self, session: &mut SessionState) -> Result<Assessment, GlucoriskError> {
        session.advance(SubmissionStage::Idle);

        let outcome = self.run_stages(session);
        if let Err(e) = &outcome {
            tracing::warn!("Submission aborted: {}", e);
            session.advance(SubmissionStage::Idle);
        }
        outcome
    }

    fn run_stages(&self, session: &mut SessionState) -> Result<Assessment, GlucoriskError> {
        let (form, personal) = session
            .to_intake()
            .map_err(GlucoriskError::InvalidInput)?;

        let profile = self.intake(&form)?;
        session.advance(SubmissionStage::Validated);
        tracing::debug!(
            "Validated submission: glucose={} bp={} bmi={} age={}",
            profile.glucose,
            profile.blood_pressure,
            profile.bmi,
            profile.age
        );

        let result = self.score(&profile.feature_vector())?;
        session.advance(SubmissionStage::Scored);
        tracing::info!(
            "Scored submission: risk={} capability={}",
            result.risk_category,
            self.classifier.kind()
        );

        let history_saved = self.record(&profile, &result);

        Ok(Assessment {
            warnings: profile.domain_violations(),
            profile,
            result,
            personal,
            history_saved,
        })
    }

    /// Append the history row for a scored submission.
    ///
    /// Returns whether a row was written.
    pub fn record(&self, profile: &HealthProfile, result: &PredictionResult) -> bool {
        if !self.persist_history {
            return false;
        }

        let record = HistoryRecord::from_assessment(profile, result);
        match self.history.append(&record) {
            Ok(()) => true,
            Err(e) => {
                let e: StorageError = e.into();
                tracing::warn!("Failed to save history row: {}", e);
                false
            }
        }
    }

    /// All history rows in insertion order.
    ///
    /// # Errors
    /// Returns error if the history cannot be read.
    pub fn history(&self) -> Result<Vec<HistoryRecord>, GlucoriskError> {
        self.history
            .load_all()
            .map_err(|e| GlucoriskError::Storage(e.into()))
    }

    /// Number of history rows.
    ///
    /// # Errors
    /// Returns error if the history cannot be read.
    pub fn history_count(&self) -> Result<usize, GlucoriskError> {
        self.history
            .count()
            .map_err(|e| GlucoriskError::Storage(e.into()))
    }

    /// Current time, bumped past the previous call so timestamps strictly increase.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().expect("Lock failed");
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_store::CsvHistoryStore;
    use crate::domain::session::FieldId;
    use crate::ports::ClassifierError;
    use tempfile::tempdir;

    fn service(
        classifier: ClassifierCapability,
    ) -> (tempfile::TempDir, AssessmentService<CsvHistoryStore>) {
        let dir = tempdir().expect("tempdir");
        let store = Arc::new(CsvHistoryStore::new(dir.path().join("history.csv")));
        (dir, AssessmentService::new(classifier, store))
    }

    fn probability_stub(p1: f64) -> ClassifierCapability {
        ClassifierCapability::probability(
            move |_: &FeatureVector| -> Result<[f64; 2], ClassifierError> { Ok([1.0 - p1, p1]) },
        )
    }

    fn filled_session() -> SessionState {
        let mut session = SessionState::default();
        session.set(FieldId::Glucose, "148");
        session.set(FieldId::BloodPressure, "72");
        session.set(FieldId::Bmi, "33.6");
        session.set(FieldId::Age, "50");
        session
    }

    #[test]
    fn test_probability_stub_scores_high() {
        let (_dir, service) = service(ClassifierCapability::probability(
            |_: &FeatureVector| -> Result<[f64; 2], ClassifierError> { Ok([0.2, 0.8]) },
        ));

        let result = service
            .score(&FeatureVector::new(148.0, 72.0, 33.6, 50))
            .expect("score");
        assert!((result.risk_score.expect("score") - 80.0).abs() < 1e-9);
        assert_eq!(result.risk_category, RiskCategory::High);
    }

    #[test]
    fn test_label_stub_scores_low_without_score() {
        let (_dir, service) = service(ClassifierCapability::hard_label(
            |_: &FeatureVector| -> Result<u8, ClassifierError> { Ok(0) },
        ));

        let result = service
            .score(&FeatureVector::new(90.0, 70.0, 22.0, 30))
            .expect("score");
        assert_eq!(result.risk_category, RiskCategory::Low);
        assert!(result.risk_score.is_none());
    }

    #[test]
    fn test_classifier_receives_training_order() {
        let (_dir, service) = service(ClassifierCapability::hard_label(
            |features: &FeatureVector| -> Result<u8, ClassifierError> {
                assert_eq!(features.as_slice(), &[148.0, 72.0, 33.6, 50.0]);
                Ok(1)
            },
        ));

        let mut session = filled_session();
        let assessment = service.submit(&mut session).expect("submit");
        assert_eq!(assessment.result.risk_category, RiskCategory::High);
    }

    #[test]
    fn test_invalid_outputs_are_unavailable() {
        for bad in [f64::NAN, 1.5, -0.1] {
            let (_dir, service) = service(ClassifierCapability::probability(
                move |_: &FeatureVector| -> Result<[f64; 2], ClassifierError> { Ok([0.5, bad]) },
            ));
            assert!(matches!(
                service.score(&FeatureVector::new(100.0, 80.0, 25.0, 40)),
                Err(GlucoriskError::ClassifierUnavailable(_))
            ));
        }

        let (_dir, service) = service(ClassifierCapability::hard_label(
            |_: &FeatureVector| -> Result<u8, ClassifierError> { Ok(2) },
        ));
        assert!(matches!(
            service.score(&FeatureVector::new(100.0, 80.0, 25.0, 40)),
            Err(GlucoriskError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn test_failing_classifier_writes_no_row() {
        let (_dir, service) = service(ClassifierCapability::probability(
            |_: &FeatureVector| -> Result<[f64; 2], ClassifierError> {
                Err(ClassifierError::Unavailable("model crashed".into()))
            },
        ));

        let mut session = filled_session();
        let err = service.submit(&mut session).expect_err("must fail");
        assert!(matches!(err, GlucoriskError::ClassifierUnavailable(_)));
        assert_eq!(session.stage, SubmissionStage::Idle);
        assert_eq!(service.history_count().expect("count"), 0);
    }

    #[test]
    fn test_missing_input_aborts_submission() {
        let (_dir, service) = service(probability_stub(0.3));

        let mut session = filled_session();
        session.set(FieldId::Bmi, "");
        let err = service.submit(&mut session).expect_err("must fail");
        assert!(matches!(err, GlucoriskError::MissingInput("BMI or weight")));
        assert_eq!(session.stage, SubmissionStage::Idle);
    }

    #[test]
    fn test_derived_bmi_is_scored() {
        let (_dir, service) = service(probability_stub(0.3));

        let mut session = filled_session();
        session.set(FieldId::Bmi, "");
        session.set(FieldId::HeightCm, "170");
        session.set(FieldId::WeightKg, "70");
        let assessment = service.submit(&mut session).expect("submit");
        assert!((assessment.profile.bmi - 24.22).abs() < 1e-9);
        assert_eq!(session.stage, SubmissionStage::Scored);
    }

    #[test]
    fn test_sequential_submissions_append_increasing_rows() {
        let (_dir, service) = service(probability_stub(0.65));

        let mut session = filled_session();
        let first = service.submit(&mut session).expect("submit");
        let second = service.submit(&mut session).expect("submit");
        assert!(first.history_saved && second.history_saved);

        let rows = service.history().expect("history");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp < rows[1].timestamp);
        assert_eq!(rows[1].prediction, RiskCategory::High);
    }

    #[test]
    fn test_persistence_disabled_skips_history() {
        let (_dir, service) = service(probability_stub(0.1));
        let service = service.with_persistence(false);

        let mut session = filled_session();
        let assessment = service.submit(&mut session).expect("submit");
        assert!(!assessment.history_saved);
        assert_eq!(service.history_count().expect("count"), 0);
    }

    #[test]
    fn test_personal_info_not_in_history() {
        let (dir, service) = service(probability_stub(0.1));

        let mut session = filled_session();
        session.set(FieldId::Name, "Jane Doe");
        let assessment = service.submit(&mut session).expect("submit");
        assert_eq!(assessment.personal.name.as_deref(), Some("Jane Doe"));

        let content =
            std::fs::read_to_string(dir.path().join("history.csv")).expect("read history");
        assert!(!content.contains("Jane"));
    }
}
