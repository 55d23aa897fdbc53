use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::Gender;

/// Symptom codes understood by the classifier feature vector, in feature order.
pub const SYMPTOM_CODES: &[&str] = &[
    "chest_pain", "shortness_of_breath", "palpitations", "arm_pain",
    "jaw_pain", "headache", "dizziness", "vision_changes", "numbness",
    "confusion", "speech_difficulty", "fever", "cough", "wheezing",
    "breathlessness", "sore_throat", "nausea", "vomiting",
    "abdominal_pain", "diarrhea", "fatigue", "joint_pain",
    "back_pain", "swelling", "rash", "cold_sweats", "pale_skin",
    "frequent_urination", "weight_loss", "muscle_weakness",
];

/// Pre-existing condition codes understood by the classifier, in feature order.
pub const CONDITION_CODES: &[&str] = &[
    "diabetes", "hypertension", "heart_disease", "asthma", "copd",
    "chronic_kidney_disease", "obesity", "cancer", "stroke_history",
    "thyroid_disorder", "epilepsy",
];

/// Placeholder some intake forms send when no condition applies.
const NO_CONDITION: &str = "none";

/// Longest insurer response a submission may declare (one week).
pub const MAX_INSURANCE_RESPONSE_HOURS: f64 = 168.0;

// ---------------------------------------------------------------------------
// Vitals
// ---------------------------------------------------------------------------

/// One vitals reading. Temperature is always degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub bp_systolic: f64,
    pub bp_diastolic: f64,
    pub heart_rate: f64,
    pub temperature: f64,
    pub spo2: f64,
}

impl Vitals {
    pub fn pulse_pressure(&self) -> f64 {
        self.bp_systolic - self.bp_diastolic
    }

    /// Mean arterial pressure, diastolic + pulse pressure / 3.
    pub fn mean_arterial_pressure(&self) -> f64 {
        self.bp_diastolic + self.pulse_pressure() / 3.0
    }

    /// Heart rate over systolic pressure; systolic floored at 1 mmHg.
    pub fn shock_index(&self) -> f64 {
        self.heart_rate / self.bp_systolic.max(1.0)
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            bp_systolic: 120.0,
            bp_diastolic: 80.0,
            heart_rate: 75.0,
            temperature: 36.8,
            spo2: 98.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PatientSnapshot
// ---------------------------------------------------------------------------

/// Immutable triage input for a single submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    #[serde(default = "default_name")]
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(flatten)]
    pub vitals: Vitals,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default, rename = "pre_existing_conditions")]
    pub conditions: Vec<String>,
    #[serde(default = "default_insurer")]
    pub insurance_provider: String,
    #[serde(default)]
    pub insurance_response_hours: f64,
}

fn default_name() -> String {
    "Unknown".to_string()
}

fn default_insurer() -> String {
    "Self-Pay".to_string()
}

/// Boundary validation failure. Out-of-range input is rejected, never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} = {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl PatientSnapshot {
    /// Reject non-finite or physiologically impossible values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("age", f64::from(self.age), 0.0, 120.0)?;
        check_range("bp_systolic", self.vitals.bp_systolic, 0.0, 300.0)?;
        check_range("bp_diastolic", self.vitals.bp_diastolic, 0.0, 200.0)?;
        check_range("heart_rate", self.vitals.heart_rate, 0.0, 250.0)?;
        check_range("temperature", self.vitals.temperature, 30.0, 45.0)?;
        check_range("spo2", self.vitals.spo2, 50.0, 100.0)?;
        check_range(
            "insurance_response_hours",
            self.insurance_response_hours,
            0.0,
            MAX_INSURANCE_RESPONSE_HOURS,
        )?;
        Ok(())
    }

    /// Copy with symptom and condition codes lowercased, trimmed and
    /// de-duplicated in first-seen order. The `none` placeholder is dropped.
    pub fn normalized(&self) -> Self {
        Self {
            symptoms: normalize_codes(&self.symptoms),
            conditions: normalize_codes(&self.conditions),
            ..self.clone()
        }
    }

    pub fn has_symptom(&self, code: &str) -> bool {
        self.symptoms.iter().any(|s| s == code)
    }

    pub fn has_condition(&self, code: &str) -> bool {
        self.conditions.iter().any(|c| c == code)
    }

    /// Symptoms from `set`, in the patient's reported order.
    pub fn symptoms_in<'a>(&'a self, set: &[&str]) -> Vec<&'a str> {
        self.symptoms
            .iter()
            .filter(|s| set.contains(&s.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Conditions from `set`, in the patient's reported order.
    pub fn conditions_in<'a>(&'a self, set: &[&str]) -> Vec<&'a str> {
        self.conditions
            .iter()
            .filter(|c| set.contains(&c.as_str()))
            .map(String::as_str)
            .collect()
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

fn normalize_codes(codes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = code.trim().to_lowercase();
        if code.is_empty() || code == NO_CONDITION || out.contains(&code) {
            continue;
        }
        out.push(code);
    }
    out
}

#[cfg(test)]
pub(crate) fn make_patient() -> PatientSnapshot {
    PatientSnapshot {
        name: "Test Patient".into(),
        age: 40,
        gender: Gender::Female,
        vitals: Vitals::default(),
        symptoms: Vec::new(),
        conditions: Vec::new(),
        insurance_provider: "Self-Pay".into(),
        insurance_response_hours: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_features() {
        let v = Vitals {
            bp_systolic: 120.0,
            bp_diastolic: 90.0,
            heart_rate: 60.0,
            temperature: 37.0,
            spo2: 98.0,
        };
        assert_eq!(v.pulse_pressure(), 30.0);
        assert_eq!(v.mean_arterial_pressure(), 100.0);
        assert_eq!(v.shock_index(), 0.5);
    }

    #[test]
    fn shock_index_guards_zero_systolic() {
        let v = Vitals { bp_systolic: 0.0, ..Vitals::default() };
        assert_eq!(v.shock_index(), 75.0);
    }

    #[test]
    fn validate_accepts_normal_patient() {
        assert!(make_patient().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_spo2() {
        let mut p = make_patient();
        p.vitals.spo2 = 101.0;
        let err = p.validate().unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "spo2", .. }));
    }

    #[test]
    fn validate_rejects_nan() {
        let mut p = make_patient();
        p.vitals.heart_rate = f64::NAN;
        assert_eq!(
            p.validate().unwrap_err(),
            ValidationError::NotFinite { field: "heart_rate" }
        );
    }

    #[test]
    fn validate_rejects_negative_insurance_hours() {
        let mut p = make_patient();
        p.insurance_response_hours = -1.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_insurance_hours_beyond_a_week() {
        let mut p = make_patient();
        p.insurance_response_hours = MAX_INSURANCE_RESPONSE_HOURS;
        assert!(p.validate().is_ok());

        p.insurance_response_hours = 168.5;
        assert!(matches!(
            p.validate().unwrap_err(),
            ValidationError::OutOfRange { field: "insurance_response_hours", .. }
        ));

        p.insurance_response_hours = 1e307;
        assert!(p.validate().is_err());
    }

    #[test]
    fn normalized_dedups_and_drops_none() {
        let mut p = make_patient();
        p.symptoms = vec![" Fever".into(), "cough".into(), "fever".into(), "".into()];
        p.conditions = vec!["none".into(), "Diabetes".into()];
        let n = p.normalized();
        assert_eq!(n.symptoms, vec!["fever", "cough"]);
        assert_eq!(n.conditions, vec!["diabetes"]);
    }

    #[test]
    fn deserializes_flat_intake_json() {
        let json = serde_json::json!({
            "age": 68,
            "gender": "Male",
            "bp_systolic": 195.0,
            "bp_diastolic": 110.0,
            "heart_rate": 92.0,
            "temperature": 37.0,
            "spo2": 88.0,
            "symptoms": ["chest_pain"],
        });
        let p: PatientSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(p.name, "Unknown");
        assert_eq!(p.insurance_provider, "Self-Pay");
        assert_eq!(p.vitals.bp_systolic, 195.0);
        assert!(p.conditions.is_empty());
    }
}
