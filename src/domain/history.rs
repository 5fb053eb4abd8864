//! History log record.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{HealthProfile, PredictionResult, RiskCategory};

/// Column headers of the history log, in order.
pub const HISTORY_HEADER: [&str; 6] = [
    "Timestamp",
    "Glucose",
    "BloodPressure",
    "BMI",
    "Age",
    "Prediction",
];

/// Parse a history timestamp.
///
/// Accepts RFC 3339 and the offset-less `YYYY-MM-DD HH:MM:SS[.f]` form
/// older logs wrote; the latter is read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
}

/// One persisted submission. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "Timestamp", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "Glucose")]
    pub glucose: f64,

    #[serde(rename = "BloodPressure")]
    pub blood_pressure: f64,

    #[serde(rename = "BMI")]
    pub bmi: f64,

    #[serde(rename = "Age")]
    pub age: u32,

    #[serde(rename = "Prediction")]
    pub prediction: RiskCategory,
}

impl HistoryRecord {
    /// Build the persisted row for a scored submission.
    #[must_use]
    pub fn from_assessment(profile: &HealthProfile, result: &PredictionResult) -> Self {
        Self {
            timestamp: result.timestamp,
            glucose: profile.glucose,
            blood_pressure: profile.blood_pressure,
            bmi: profile.bmi,
            age: profile.age,
            prediction: result.risk_category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IntakeForm;
    use chrono::TimeZone;

    #[test]
    fn test_record_copies_profile_and_result() {
        let profile = HealthProfile::from_intake(&IntakeForm {
            glucose: Some(148.0),
            blood_pressure: Some(72.0),
            bmi: Some(33.6),
            age: Some(50),
            pregnancies: Some(6),
            ..Default::default()
        })
        .expect("Should build");
        let result = PredictionResult::from_probability(0.7, Utc::now());

        let record = HistoryRecord::from_assessment(&profile, &result);
        assert_eq!(record.timestamp, result.timestamp);
        assert!((record.glucose - 148.0).abs() < f64::EPSILON);
        assert!((record.bmi - 33.6).abs() < f64::EPSILON);
        assert_eq!(record.age, 50);
        assert_eq!(record.prediction, RiskCategory::High);
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T11:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01 10:00:00.250000"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert!(parse_timestamp("Timestamp").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_record_json_uses_log_headers() {
        let record = HistoryRecord {
            timestamp: Utc::now(),
            glucose: 100.0,
            blood_pressure: 80.0,
            bmi: 24.0,
            age: 40,
            prediction: RiskCategory::Low,
        };
        let json = serde_json::to_value(&record).expect("Should serialize");
        for header in HISTORY_HEADER {
            assert!(json.get(header).is_some(), "missing {header}");
        }
    }
}
