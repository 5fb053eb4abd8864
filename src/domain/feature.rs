//! Feature vector handed to the classifier.

use serde::{Deserialize, Serialize};

use crate::GlucoriskError;

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 4;

/// Training-time column order. The classifier depends on this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["Glucose", "BloodPressure", "BMI", "Age"];

/// Fixed-order input `[glucose, blood_pressure, bmi, age]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assemble the vector in training order. Values are not re-validated.
    #[must_use]
    pub fn new(glucose: f64, blood_pressure: f64, bmi: f64, age: u32) -> Self {
        Self([glucose, blood_pressure, bmi, f64::from(age)])
    }

    /// Build from a raw slice.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the slice does not hold exactly 4 values.
    pub fn from_slice(values: &[f64]) -> Result<Self, GlucoriskError> {
        let array: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| GlucoriskError::ShapeMismatch {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;
        Ok(Self(array))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    #[must_use]
    pub fn glucose(&self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub fn blood_pressure(&self) -> f64 {
        self.0[1]
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.0[2]
    }

    #[must_use]
    pub fn age(&self) -> f64 {
        self.0[3]
    }
}
