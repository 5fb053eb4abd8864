//! Per-session form state and the submission lifecycle.

use zeroize::Zeroize;

use crate::domain::{IntakeForm, PersonalInfo};

/// Lifecycle of one submission.
///
/// `Idle → Validated → Scored → Reported`. Any failure returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionStage {
    #[default]
    Idle,
    Validated,
    Scored,
    Reported,
}

impl SubmissionStage {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Validated)
                | (Self::Validated, Self::Scored)
                | (Self::Scored, Self::Reported)
                | (_, Self::Idle)
        )
    }
}

impl std::fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validated => write!(f, "validated"),
            Self::Scored => write!(f, "scored"),
            Self::Reported => write!(f, "reported"),
        }
    }
}

/// Form fields collected by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    Name,
    Contact,
    Glucose,
    BloodPressure,
    Bmi,
    HeightCm,
    WeightKg,
    Age,
    Pregnancies,
    InsulinLevel,
    SkinThickness,
}

/// Input kind and bounds for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { max_len: usize },
    Number { min: f64, max: f64 },
    Integer { min: u32, max: u32 },
}

/// Static description of one form field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    /// Value restored on reset.
    pub default: &'static str,
}

/// Form layout and documented defaults.
///
/// Required numeric fields start at their lower bound, the way number
/// widgets do. Everything else starts blank so that an entered BMI never
/// shadows height/weight by accident.
pub static FIELD_SPECS: [FieldSpec; 11] = [
    FieldSpec {
        id: FieldId::Glucose,
        label: "Glucose",
        hint: "mg/dL (50-300)",
        kind: FieldKind::Number { min: 50.0, max: 300.0 },
        default: "50",
    },
    FieldSpec {
        id: FieldId::BloodPressure,
        label: "Blood Pressure",
        hint: "mmHg (50-200)",
        kind: FieldKind::Number { min: 50.0, max: 200.0 },
        default: "50",
    },
    FieldSpec {
        id: FieldId::Bmi,
        label: "BMI",
        hint: "10-60, or leave blank",
        kind: FieldKind::Number { min: 10.0, max: 60.0 },
        default: "",
    },
    FieldSpec {
        id: FieldId::HeightCm,
        label: "Height",
        hint: "cm (50-250)",
        kind: FieldKind::Number { min: 50.0, max: 250.0 },
        default: "",
    },
    FieldSpec {
        id: FieldId::WeightKg,
        label: "Weight",
        hint: "kg (10-300)",
        kind: FieldKind::Number { min: 10.0, max: 300.0 },
        default: "",
    },
    FieldSpec {
        id: FieldId::Age,
        label: "Age",
        hint: "years (5-120)",
        kind: FieldKind::Integer { min: 5, max: 120 },
        default: "5",
    },
    FieldSpec {
        id: FieldId::Pregnancies,
        label: "Pregnancies",
        hint: "optional (0-20)",
        kind: FieldKind::Integer { min: 0, max: 20 },
        default: "",
    },
    FieldSpec {
        id: FieldId::InsulinLevel,
        label: "Insulin",
        hint: "optional, µU/mL (0-900)",
        kind: FieldKind::Number { min: 0.0, max: 900.0 },
        default: "",
    },
    FieldSpec {
        id: FieldId::SkinThickness,
        label: "Skin Thickness",
        hint: "optional, mm (0-100)",
        kind: FieldKind::Number { min: 0.0, max: 100.0 },
        default: "",
    },
    FieldSpec {
        id: FieldId::Name,
        label: "Name",
        hint: "optional, report only",
        kind: FieldKind::Text { max_len: 60 },
        default: "",
    },
    FieldSpec {
        id: FieldId::Contact,
        label: "Contact",
        hint: "optional, report only",
        kind: FieldKind::Text { max_len: 60 },
        default: "",
    },
];

/// Sample values for a quick demo submission (Pima dataset row 1).
const SAMPLE_VALUES: [(FieldId, &str); 6] = [
    (FieldId::Glucose, "148"),
    (FieldId::BloodPressure, "72"),
    (FieldId::Bmi, "33.6"),
    (FieldId::Age, "50"),
    (FieldId::Pregnancies, "6"),
    (FieldId::SkinThickness, "35"),
];

/// Editable session state. Reset replaces the whole value with defaults.
#[derive(Debug, Clone)]
pub struct SessionState {
    values: Vec<String>,
    pub stage: SubmissionStage,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            values: FIELD_SPECS.iter().map(|s| s.default.to_string()).collect(),
            stage: SubmissionStage::Idle,
        }
    }
}

impl SessionState {
    #[must_use]
    pub fn fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> {
        FIELD_SPECS.iter().zip(self.values.iter().map(String::as_str))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn value(&self, id: FieldId) -> &str {
        index_of(id).map_or("", |i| self.values[i].as_str())
    }

    pub fn set(&mut self, id: FieldId, value: impl Into<String>) {
        if let Some(i) = index_of(id) {
            self.values[i] = value.into();
        }
    }

    /// Append a typed character to field `index` if the field accepts it.
    pub fn push_char(&mut self, index: usize, c: char) -> bool {
        let Some(spec) = FIELD_SPECS.get(index) else {
            return false;
        };
        let value = &mut self.values[index];
        let accepted = match spec.kind {
            FieldKind::Text { max_len } => !c.is_control() && value.chars().count() < max_len,
            FieldKind::Number { .. } => c.is_ascii_digit() || (c == '.' && !value.contains('.')),
            FieldKind::Integer { .. } => c.is_ascii_digit(),
        };
        if accepted {
            value.push(c);
        }
        accepted
    }

    pub fn pop_char(&mut self, index: usize) {
        if let Some(value) = self.values.get_mut(index) {
            value.pop();
        }
    }

    pub fn clear_field(&mut self, index: usize) {
        if let Some(value) = self.values.get_mut(index) {
            value.zeroize();
        }
    }

    pub fn load_sample(&mut self) {
        *self = Self::default();
        for (id, value) in SAMPLE_VALUES {
            self.set(id, value);
        }
    }

    /// Wipe every buffer and restore the documented defaults.
    pub fn reset(&mut self) {
        for value in &mut self.values {
            value.zeroize();
        }
        *self = Self::default();
    }

    /// Move the lifecycle to `next`, refusing illegal transitions.
    pub fn advance(&mut self, next: SubmissionStage) -> bool {
        if self.stage.can_advance_to(next) {
            self.stage = next;
            true
        } else {
            false
        }
    }

    /// Parse the buffers into an intake form plus report-only details.
    ///
    /// Blank fields become `None`. Unparseable or out-of-bounds values are
    /// rejected with a message naming the field.
    pub fn to_intake(&self) -> Result<(IntakeForm, PersonalInfo), String> {
        let mut form = IntakeForm::default();
        let mut personal = PersonalInfo::default();

        for (spec, raw) in self.fields() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match spec.kind {
                FieldKind::Text { .. } => {
                    let text = Some(raw.to_string());
                    match spec.id {
                        FieldId::Name => personal.name = text,
                        FieldId::Contact => personal.contact = text,
                        _ => {}
                    }
                }
                FieldKind::Number { min, max } => {
                    let value: f64 = raw
                        .parse()
                        .map_err(|_| format!("{}: Invalid number", spec.label))?;
                    if !(min..=max).contains(&value) {
                        return Err(format!(
                            "{}: Value must be between {} and {}",
                            spec.label, min, max
                        ));
                    }
                    match spec.id {
                        FieldId::Glucose => form.glucose = Some(value),
                        FieldId::BloodPressure => form.blood_pressure = Some(value),
                        FieldId::Bmi => form.bmi = Some(value),
                        FieldId::HeightCm => form.height_cm = Some(value),
                        FieldId::WeightKg => form.weight_kg = Some(value),
                        FieldId::InsulinLevel => form.insulin_level = Some(value),
                        FieldId::SkinThickness => form.skin_thickness = Some(value),
                        _ => {}
                    }
                }
                FieldKind::Integer { min, max } => {
                    let value: u32 = raw
                        .parse()
                        .map_err(|_| format!("{}: Invalid whole number", spec.label))?;
                    if !(min..=max).contains(&value) {
                        return Err(format!(
                            "{}: Value must be between {} and {}",
                            spec.label, min, max
                        ));
                    }
                    match spec.id {
                        FieldId::Age => form.age = Some(value),
                        FieldId::Pregnancies => form.pregnancies = Some(value),
                        _ => {}
                    }
                }
            }
        }

        Ok((form, personal))
    }
}

fn index_of(id: FieldId) -> Option<usize> {
    FIELD_SPECS.iter().position(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_transitions() {
        use SubmissionStage::*;
        assert!(Idle.can_advance_to(Validated));
        assert!(Validated.can_advance_to(Scored));
        assert!(Scored.can_advance_to(Reported));
        assert!(Scored.can_advance_to(Idle));
        assert!(!Idle.can_advance_to(Scored));
        assert!(!Reported.can_advance_to(Validated));
    }

    #[test]
    fn test_defaults_parse() {
        let state = SessionState::default();
        assert_eq!(state.len(), FIELD_SPECS.len());
        let (form, personal) = state.to_intake().expect("Defaults should parse");
        assert_eq!(form.glucose, Some(50.0));
        assert_eq!(form.blood_pressure, Some(50.0));
        assert_eq!(form.age, Some(5));
        assert!(form.bmi.is_none());
        assert!(personal.is_empty());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = SessionState::default();
        state.set(FieldId::Glucose, "180");
        state.set(FieldId::Name, "Ada");
        assert!(state.advance(SubmissionStage::Validated));

        state.reset();
        assert_eq!(state.value(FieldId::Glucose), "50");
        assert_eq!(state.value(FieldId::Name), "");
        assert_eq!(state.stage, SubmissionStage::Idle);
    }

    #[test]
    fn test_sample_data() {
        let mut state = SessionState::default();
        state.load_sample();
        let (form, _) = state.to_intake().expect("Sample should parse");
        assert_eq!(form.glucose, Some(148.0));
        assert_eq!(form.bmi, Some(33.6));
        assert_eq!(form.pregnancies, Some(6));
    }

    #[test]
    fn test_push_char_filters_input() {
        let mut state = SessionState::default();
        let glucose = index_of(FieldId::Glucose).expect("field exists");
        state.clear_field(glucose);
        assert!(state.push_char(glucose, '1'));
        assert!(state.push_char(glucose, '.'));
        assert!(!state.push_char(glucose, '.'));
        assert!(!state.push_char(glucose, 'x'));

        let name = index_of(FieldId::Name).expect("field exists");
        assert!(state.push_char(name, 'A'));
        assert_eq!(state.value(FieldId::Name), "A");
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut state = SessionState::default();
        state.set(FieldId::Glucose, "400");
        let err = state.to_intake().expect_err("Should reject");
        assert!(err.starts_with("Glucose"));

        state.set(FieldId::Glucose, "abc");
        assert!(state.to_intake().is_err());
    }

    #[test]
    fn test_personal_info_collected() {
        let mut state = SessionState::default();
        state.set(FieldId::Name, "  Jane Doe ");
        let (_, personal) = state.to_intake().expect("Should parse");
        assert_eq!(personal.name.as_deref(), Some("Jane Doe"));
        assert!(personal.contact.is_none());
    }
}
