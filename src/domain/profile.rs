//! Health profile types for diabetes risk prediction.
//!
//! Based on the Pima Indians diabetes dataset columns the classifier was
//! trained on (Glucose, BloodPressure, BMI, Age).

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::GlucoriskError;

/// Plasma glucose in mg/dL.
pub const GLUCOSE_RANGE: RangeInclusive<f64> = 50.0..=300.0;

/// Diastolic blood pressure in mmHg.
pub const BLOOD_PRESSURE_RANGE: RangeInclusive<f64> = 50.0..=200.0;

/// Directly entered BMI.
pub const BMI_RANGE: RangeInclusive<f64> = 10.0..=60.0;

/// Age in years.
pub const AGE_RANGE: RangeInclusive<u32> = 5..=120;

/// Height substituted when a non-positive height reaches the BMI formula.
pub const FALLBACK_HEIGHT_CM: f64 = 1.0;

/// Derive BMI from height (cm) and weight (kg), rounded to 2 decimals.
///
/// A non-positive or non-finite height is replaced by [`FALLBACK_HEIGHT_CM`],
/// so this never divides by zero.
#[must_use]
pub fn derive_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_cm = if height_cm.is_finite() && height_cm > 0.0 {
        height_cm
    } else {
        FALLBACK_HEIGHT_CM
    };
    let height_m = height_cm / 100.0;
    round2(weight_kg / (height_m * height_m))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// BMI classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Categorize a BMI value.
    ///
    /// `< 18.5` Underweight, `[18.5, 25)` Normal, `[25, 30)` Overweight,
    /// everything else (including NaN) Obese.
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    /// Reference range shown next to the category.
    #[must_use]
    pub fn range_label(&self) -> &'static str {
        match self {
            Self::Underweight => "below 18.5",
            Self::Normal => "18.5 - 24.9",
            Self::Overweight => "25.0 - 29.9",
            Self::Obese => "30.0 and above",
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Raw values as collected by the UI. Any field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntakeForm {
    pub glucose: Option<f64>,
    pub blood_pressure: Option<f64>,
    /// Directly entered BMI; takes precedence over height/weight.
    pub bmi: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub age: Option<u32>,
    pub pregnancies: Option<u32>,
    pub insulin_level: Option<f64>,
    pub skin_thickness: Option<f64>,
}

/// Display-only metrics. Never part of the feature vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryMetrics {
    pub pregnancies: Option<u32>,
    /// Insulin in µU/mL
    pub insulin_level: Option<f64>,
    /// Triceps skin fold thickness in mm
    pub skin_thickness: Option<f64>,
}

impl SecondaryMetrics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pregnancies.is_none() && self.insulin_level.is_none() && self.skin_thickness.is_none()
    }
}

/// Identifying details printed on exported reports only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub name: Option<String>,
    pub contact: Option<String>,
}

impl PersonalInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.contact.is_none()
    }
}

/// How the BMI of a profile was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BmiSource {
    Entered,
    Derived { height_cm: f64, weight_kg: f64 },
}

/// Validated health profile for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    pub glucose: f64,
    pub blood_pressure: f64,
    pub bmi: f64,
    pub bmi_source: BmiSource,
    pub age: u32,
    pub secondary: SecondaryMetrics,
}

impl HealthProfile {
    /// Build a profile from raw intake values.
    ///
    /// # Errors
    /// Returns `MissingInput` when glucose, blood pressure or age is blank, or
    /// when BMI is blank and no weight is available to derive it.
    pub fn from_intake(form: &IntakeForm) -> Result<Self, GlucoriskError> {
        let glucose = form.glucose.ok_or(GlucoriskError::MissingInput("glucose"))?;
        let blood_pressure = form
            .blood_pressure
            .ok_or(GlucoriskError::MissingInput("blood pressure"))?;
        let age = form.age.ok_or(GlucoriskError::MissingInput("age"))?;

        let (bmi, bmi_source) = match (form.bmi, form.weight_kg) {
            (Some(bmi), _) => (bmi, BmiSource::Entered),
            (None, Some(weight_kg)) => {
                let height_cm = form.height_cm.unwrap_or(0.0);
                (
                    derive_bmi(height_cm, weight_kg),
                    BmiSource::Derived {
                        height_cm,
                        weight_kg,
                    },
                )
            }
            (None, None) => return Err(GlucoriskError::MissingInput("BMI or weight")),
        };

        Ok(Self {
            glucose,
            blood_pressure,
            bmi,
            bmi_source,
            age,
            secondary: SecondaryMetrics {
                pregnancies: form.pregnancies,
                insulin_level: form.insulin_level,
                skin_thickness: form.skin_thickness,
            },
        })
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi)
    }

    /// Feature vector in training column order.
    #[must_use]
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector::new(self.glucose, self.blood_pressure, self.bmi, self.age)
    }

    /// List values outside the documented input domains.
    ///
    /// Range enforcement belongs to the UI widgets; this only reports, it
    /// never rejects. A derived BMI is not checked against the entry range.
    #[must_use]
    pub fn domain_violations(&self) -> Vec<GlucoriskError> {
        let mut out = Vec::new();
        check_range(&mut out, "Glucose", self.glucose, &GLUCOSE_RANGE);
        check_range(
            &mut out,
            "Blood pressure",
            self.blood_pressure,
            &BLOOD_PRESSURE_RANGE,
        );
        if self.bmi_source == BmiSource::Entered {
            check_range(&mut out, "BMI", self.bmi, &BMI_RANGE);
        }
        if !AGE_RANGE.contains(&self.age) {
            out.push(GlucoriskError::OutOfDomain {
                field: "Age",
                value: f64::from(self.age),
                min: f64::from(*AGE_RANGE.start()),
                max: f64::from(*AGE_RANGE.end()),
            });
        }
        out
    }
}

fn check_range(
    out: &mut Vec<GlucoriskError>,
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) {
    if !range.contains(&value) {
        out.push(GlucoriskError::OutOfDomain {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        });
    }
}
