//! Downloadable reports for a scored submission.
//!
//! Personal details appear here and nowhere else.

use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::domain::{BmiSource, HealthProfile, PersonalInfo, PredictionResult};
use crate::GlucoriskError;

/// Guide shown next to the form and appended to reports.
pub const RECOMMENDED_RANGES: [(&str, &str); 4] = [
    ("Glucose", "70 - 140 mg/dL"),
    ("Blood Pressure", "80 - 120 mmHg"),
    ("BMI", "18.5 - 24.9"),
    ("Age", "All ages accepted, but risk increases with age"),
];

const DISCLAIMER: &str =
    "This report is an indicative estimate and does not replace professional medical evaluation.";

/// Report file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Csv,
}

impl ReportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
        }
    }
}

/// Ordered `(field, value)` pairs shared by both formats.
fn report_fields(
    profile: &HealthProfile,
    result: &PredictionResult,
    personal: Option<&PersonalInfo>,
) -> Vec<(&'static str, String)> {
    let mut fields = vec![(
        "Generated",
        result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )];

    if let Some(personal) = personal {
        if let Some(name) = &personal.name {
            fields.push(("Name", name.clone()));
        }
        if let Some(contact) = &personal.contact {
            fields.push(("Contact", contact.clone()));
        }
    }

    fields.push(("Glucose (mg/dL)", format!("{:.1}", profile.glucose)));
    fields.push(("Blood Pressure (mmHg)", format!("{:.1}", profile.blood_pressure)));
    fields.push(("BMI", format!("{:.2}", profile.bmi)));
    let category = profile.bmi_category();
    fields.push((
        "BMI Category",
        format!("{} ({})", category, category.range_label()),
    ));
    if let BmiSource::Derived {
        height_cm,
        weight_kg,
    } = profile.bmi_source
    {
        fields.push((
            "BMI Source",
            format!("derived from {height_cm:.1} cm, {weight_kg:.1} kg"),
        ));
    }
    fields.push(("Age (years)", profile.age.to_string()));

    let secondary = &profile.secondary;
    if let Some(pregnancies) = secondary.pregnancies {
        fields.push(("Pregnancies", pregnancies.to_string()));
    }
    if let Some(insulin) = secondary.insulin_level {
        fields.push(("Insulin (uU/mL)", format!("{insulin:.1}")));
    }
    if let Some(skin) = secondary.skin_thickness {
        fields.push(("Skin Thickness (mm)", format!("{skin:.1}")));
    }

    fields.push(("Prediction", result.risk_category.to_string()));
    if let Some(score) = result.risk_score {
        fields.push(("Risk Score (%)", format!("{score:.1}")));
    }
    fields.push(("Verdict", result.risk_category.verdict().to_string()));

    fields
}

/// Plain-text report.
#[must_use]
pub fn build_report(
    profile: &HealthProfile,
    result: &PredictionResult,
    personal: Option<&PersonalInfo>,
) -> String {
    let fields = report_fields(profile, result, personal);
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    let mut lines = vec![
        "Diabetes Risk Assessment Report".to_string(),
        "=".repeat(31),
        String::new(),
    ];
    lines.extend(
        fields
            .iter()
            .map(|(key, value)| format!("{key:<width$}  {value}")),
    );

    let category = result.risk_category;
    lines.push(String::new());
    lines.push(category.advice_title().to_string());
    lines.extend(category.advice().iter().map(|tip| format!("  - {tip}")));

    lines.push(String::new());
    lines.push("Recommended Input Ranges".to_string());
    lines.extend(
        RECOMMENDED_RANGES
            .iter()
            .map(|(field, range)| format!("  - {field}: {range}")),
    );

    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());
    lines.push(String::new());

    lines.join("\n")
}

/// Two-column `Field,Value` CSV report.
///
/// # Errors
/// Returns error if CSV encoding fails.
pub fn build_csv_report(
    profile: &HealthProfile,
    result: &PredictionResult,
    personal: Option<&PersonalInfo>,
) -> Result<String, GlucoriskError> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().from_writer(&mut buf);
        let to_storage = |e: csv::Error| GlucoriskError::Storage(e.into());

        writer.write_record(["Field", "Value"]).map_err(to_storage)?;
        for (key, value) in report_fields(profile, result, personal) {
            writer.write_record([key, value.as_str()]).map_err(to_storage)?;
        }
        for (i, tip) in result.risk_category.advice().iter().enumerate() {
            writer
                .write_record([format!("Advice {}", i + 1).as_str(), *tip])
                .map_err(to_storage)?;
        }
        writer.flush()?;
    }

    String::from_utf8(buf).map_err(|e| GlucoriskError::InvalidInput(e.to_string()))
}

/// File name for an exported report, e.g. `diabetes_report_20240501_093000.txt`.
#[must_use]
pub fn report_file_name(result: &PredictionResult, format: ReportFormat) -> String {
    format!(
        "diabetes_report_{}.{}",
        result.timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write a report under `dir`, creating it if needed.
///
/// # Errors
/// Returns error if the directory or file cannot be written.
pub fn export_report(
    dir: &Path,
    format: ReportFormat,
    profile: &HealthProfile,
    result: &PredictionResult,
    personal: Option<&PersonalInfo>,
) -> Result<PathBuf, GlucoriskError> {
    let content = match format {
        ReportFormat::Text => build_report(profile, result, personal),
        ReportFormat::Csv => build_csv_report(profile, result, personal)?,
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(result, format));
    std::fs::write(&path, content)?;

    tracing::info!("Exported {} report to {:?}", format.extension(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IntakeForm, RiskCategory};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    fn profile() -> HealthProfile {
        HealthProfile::from_intake(&IntakeForm {
            glucose: Some(148.0),
            blood_pressure: Some(72.0),
            height_cm: Some(170.0),
            weight_kg: Some(70.0),
            age: Some(50),
            pregnancies: Some(6),
            ..IntakeForm::default()
        })
        .expect("profile")
    }

    fn result() -> PredictionResult {
        PredictionResult::from_probability(
            0.72,
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_text_report_contents() {
        let personal = PersonalInfo {
            name: Some("Jane Doe".into()),
            contact: None,
        };
        let report = build_report(&profile(), &result(), Some(&personal));

        assert!(report.contains("Jane Doe"));
        assert!(report.contains("24.22"));
        assert!(report.contains("Normal (18.5 - 24.9)"));
        assert!(report.contains("derived from 170.0 cm, 70.0 kg"));
        assert!(report.contains("Pregnancies"));
        assert!(report.contains("72.0"));
        assert!(report.contains("You ARE likely to have diabetes."));
        assert!(report.contains("Suggestions to Improve"));
        assert!(report.contains("  - Monitor blood sugar"));
        assert!(report.contains("70 - 140 mg/dL"));
    }

    #[test]
    fn test_hard_label_report_has_no_score() {
        let result = PredictionResult::from_category(RiskCategory::Low, Utc::now());
        let report = build_report(&profile(), &result, None);
        assert!(!report.contains("Risk Score"));
        assert!(report.contains("Health Tips"));
        assert!(!report.contains("Name"));
    }

    #[test]
    fn test_csv_report_parses() {
        let csv_text = build_csv_report(&profile(), &result(), None).expect("csv");

        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let rows: Vec<(String, String)> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("rows");

        assert!(rows.contains(&("Prediction".to_string(), "High".to_string())));
        assert!(rows.contains(&("Risk Score (%)".to_string(), "72.0".to_string())));
        assert_eq!(rows.iter().filter(|(k, _)| k.starts_with("Advice")).count(), 5);
    }

    #[test]
    fn test_export_writes_timestamped_file() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("reports");

        let path = export_report(&out, ReportFormat::Csv, &profile(), &result(), None)
            .expect("export");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("diabetes_report_20240501_093000.csv")
        );
        assert!(std::fs::read_to_string(&path)
            .expect("read")
            .starts_with("Field,Value"));
    }
}
