//! Classifier adapter seam.
//!
//! The statistical model is an external collaborator behind
//! [`RiskClassifier`]. This module owns the fixed-order feature vector it
//! consumes, validation of what it returns, and [`BaselineClassifier`], a
//! deterministic linear scorer used when no trained model is wired in.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FactorDirection, Gender, PatientSnapshot, RiskLevel, CONDITION_CODES, SYMPTOM_CODES};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed classifier output: {0}")]
    MalformedOutput(String),
}

// ---------------------------------------------------------------------------
// Feature vector
// ---------------------------------------------------------------------------

/// Column names in the order the model was trained on.
pub static FEATURE_NAMES: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut names: Vec<String> = [
        "age",
        "gender_enc",
        "bp_systolic",
        "bp_diastolic",
        "heart_rate",
        "temperature",
        "spo2",
        "pulse_pressure",
        "map_pressure",
        "shock_index",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    names.extend(SYMPTOM_CODES.iter().map(|s| format!("sym_{s}")));
    names.extend(CONDITION_CODES.iter().map(|c| format!("cond_{c}")));
    names.push("symptom_count".into());
    names.push("condition_count".into());
    names.push("insurance_response_hours".into());
    names
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn from_patient(patient: &PatientSnapshot) -> Self {
        let v = &patient.vitals;
        let gender_enc = match patient.gender {
            Gender::Male => 0.0,
            Gender::Female => 1.0,
            Gender::Other => 2.0,
        };

        let mut values = vec![
            f64::from(patient.age),
            gender_enc,
            v.bp_systolic,
            v.bp_diastolic,
            v.heart_rate,
            v.temperature,
            v.spo2,
            v.pulse_pressure(),
            v.mean_arterial_pressure(),
            v.shock_index(),
        ];

        let symptom_flags: Vec<f64> = SYMPTOM_CODES
            .iter()
            .map(|s| if patient.has_symptom(s) { 1.0 } else { 0.0 })
            .collect();
        let condition_flags: Vec<f64> = CONDITION_CODES
            .iter()
            .map(|c| if patient.has_condition(c) { 1.0 } else { 0.0 })
            .collect();
        let symptom_count: f64 = symptom_flags.iter().sum();
        let condition_count: f64 = condition_flags.iter().sum();

        values.extend(symptom_flags);
        values.extend(condition_flags);
        values.push(symptom_count);
        values.push(condition_count);
        values.push(patient.insurance_response_hours);

        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// `(name, value)` pairs in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        FEATURE_NAMES
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

// ---------------------------------------------------------------------------
// Classifier output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFactor {
    pub name: String,
    pub magnitude: f64,
    pub direction: FactorDirection,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    pub risk_label: RiskLevel,
    pub class_probabilities: BTreeMap<RiskLevel, f64>,
    pub ranked_factors: Vec<RankedFactor>,
}

impl ClassifierOutput {
    /// Probability of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.class_probabilities
            .get(&self.risk_label)
            .copied()
            .unwrap_or(0.0)
    }

    /// Reject output the pipeline cannot trust: missing classes,
    /// probabilities outside [0, 1] or not summing to 1, non-finite factors.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        for level in RiskLevel::ALL {
            match self.class_probabilities.get(level) {
                Some(p) if p.is_finite() && (0.0..=1.0).contains(p) => {}
                Some(p) => {
                    return Err(ClassifierError::MalformedOutput(format!(
                        "probability for {level} out of range: {p}"
                    )))
                }
                None => {
                    return Err(ClassifierError::MalformedOutput(format!(
                        "missing probability for {level}"
                    )))
                }
            }
        }
        let total: f64 = self.class_probabilities.values().sum();
        if (total - 1.0).abs() > 0.01 {
            return Err(ClassifierError::MalformedOutput(format!(
                "probabilities sum to {total:.4}"
            )));
        }
        if let Some(f) = self.ranked_factors.iter().find(|f| !f.magnitude.is_finite()) {
            return Err(ClassifierError::MalformedOutput(format!(
                "non-finite factor magnitude for {}",
                f.name
            )));
        }
        Ok(())
    }
}

/// Capability the orchestrator consumes. Implementations must be
/// thread-safe; one instance serves concurrent triage requests.
pub trait RiskClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError>;

    fn name(&self) -> &str {
        "external"
    }
}

/// Human-readable factor name, e.g. `sym_chest_pain` -> `Symptom: Chest Pain`.
pub fn readable_feature(name: &str) -> String {
    let (prefix, rest) = if let Some(rest) = name.strip_prefix("sym_") {
        ("Symptom: ", rest)
    } else if let Some(rest) = name.strip_prefix("cond_") {
        ("Condition: ", rest)
    } else {
        ("", name)
    };
    let words: Vec<String> = rest
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("{prefix}{}", words.join(" "))
}

// ---------------------------------------------------------------------------
// Baseline classifier
// ---------------------------------------------------------------------------

const INTERCEPT: f64 = -2.0;

/// Symptom weights; symptoms not listed contribute `DEFAULT_SYMPTOM_WEIGHT`.
const SYMPTOM_WEIGHTS: &[(&str, f64)] = &[
    ("chest_pain", 1.0),
    ("shortness_of_breath", 0.9),
    ("confusion", 1.0),
    ("speech_difficulty", 1.0),
    ("numbness", 0.8),
    ("vision_changes", 0.6),
    ("cold_sweats", 0.7),
    ("pale_skin", 0.5),
    ("arm_pain", 0.6),
    ("jaw_pain", 0.5),
    ("palpitations", 0.5),
    ("breathlessness", 0.8),
    ("wheezing", 0.5),
];
const DEFAULT_SYMPTOM_WEIGHT: f64 = 0.2;

const CONDITION_WEIGHTS: &[(&str, f64)] = &[
    ("heart_disease", 0.6),
    ("stroke_history", 0.6),
    ("chronic_kidney_disease", 0.5),
    ("copd", 0.5),
    ("cancer", 0.5),
];
const DEFAULT_CONDITION_WEIGHT: f64 = 0.3;

/// Deterministic linear scorer over the feature vector. Each vital only
/// contributes outside its normal band.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineClassifier;

impl BaselineClassifier {
    fn contribution(name: &str, x: f64) -> f64 {
        match name {
            "age" => 0.03 * (x - 50.0),
            "bp_systolic" => 0.04 * (x - 140.0).max(0.0) + 0.06 * (100.0 - x).max(0.0),
            "bp_diastolic" => 0.03 * (x - 90.0).max(0.0),
            "heart_rate" => 0.04 * (x - 100.0).max(0.0) + 0.05 * (55.0 - x).max(0.0),
            "temperature" => 0.8 * (x - 37.8).max(0.0) + 0.8 * (36.0 - x).max(0.0),
            "spo2" => 0.35 * (95.0 - x).max(0.0),
            "shock_index" => 3.0 * (x - 0.9).max(0.0),
            _ if x == 0.0 => 0.0,
            n if n.starts_with("sym_") => {
                let code = &n[4..];
                weight_for(SYMPTOM_WEIGHTS, code, DEFAULT_SYMPTOM_WEIGHT) * x
            }
            n if n.starts_with("cond_") => {
                let code = &n[5..];
                weight_for(CONDITION_WEIGHTS, code, DEFAULT_CONDITION_WEIGHT) * x
            }
            _ => 0.0,
        }
    }
}

fn weight_for(table: &[(&str, f64)], code: &str, default: f64) -> f64 {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, w)| *w)
        .unwrap_or(default)
}

fn softmax(logits: [f64; 3]) -> [f64; 3] {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps = logits.map(|l| (l - max).exp());
    let sum: f64 = exps.iter().sum();
    exps.map(|e| e / sum)
}

impl RiskClassifier for BaselineClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<ClassifierOutput, ClassifierError> {
        if features.len() != FEATURE_NAMES.len() {
            return Err(ClassifierError::MalformedOutput(format!(
                "expected {} features, got {}",
                FEATURE_NAMES.len(),
                features.len()
            )));
        }

        let mut factors: Vec<RankedFactor> = Vec::new();
        let mut z = INTERCEPT;
        for (name, value) in features.iter() {
            let c = Self::contribution(name, value);
            if c == 0.0 {
                continue;
            }
            z += c;
            factors.push(RankedFactor {
                name: readable_feature(name),
                magnitude: c.abs(),
                direction: if c > 0.0 {
                    FactorDirection::Up
                } else {
                    FactorDirection::Down
                },
                value,
            });
        }
        factors.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

        let [low, medium, high] = softmax([-z, 1.0 - 0.5 * z.abs(), z]);
        let class_probabilities =
            BTreeMap::from([(RiskLevel::Low, low), (RiskLevel::Medium, medium), (RiskLevel::High, high)]);
        let risk_label = class_probabilities
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(level, _)| *level)
            .unwrap_or(RiskLevel::Medium);

        Ok(ClassifierOutput {
            risk_label,
            class_probabilities,
            ranked_factors: factors,
        })
    }

    fn name(&self) -> &str {
        "baseline-linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::make_patient;

    #[test]
    fn feature_vector_has_fixed_layout() {
        assert_eq!(FEATURE_NAMES.len(), 10 + 30 + 11 + 3);
        assert_eq!(FEATURE_NAMES[0], "age");
        assert_eq!(FEATURE_NAMES[10], "sym_chest_pain");
        assert_eq!(FEATURE_NAMES[40], "cond_diabetes");
        assert_eq!(FEATURE_NAMES.last().unwrap(), "insurance_response_hours");

        let fv = FeatureVector::from_patient(&make_patient());
        assert_eq!(fv.len(), FEATURE_NAMES.len());
    }

    #[test]
    fn feature_values_and_derived() {
        let mut p = make_patient();
        p.symptoms = vec!["fever".into(), "cough".into(), "not_a_code".into()];
        p.conditions = vec!["asthma".into()];
        p.insurance_response_hours = 2.5;
        let fv = FeatureVector::from_patient(&p);
        assert_eq!(fv.get("gender_enc"), Some(1.0));
        assert_eq!(fv.get("pulse_pressure"), Some(40.0));
        assert_eq!(fv.get("sym_fever"), Some(1.0));
        assert_eq!(fv.get("sym_rash"), Some(0.0));
        assert_eq!(fv.get("cond_asthma"), Some(1.0));
        assert_eq!(fv.get("symptom_count"), Some(2.0));
        assert_eq!(fv.get("condition_count"), Some(1.0));
        assert_eq!(fv.get("insurance_response_hours"), Some(2.5));
        assert_eq!(fv.get("nope"), None);
    }

    #[test]
    fn readable_names() {
        assert_eq!(readable_feature("sym_chest_pain"), "Symptom: Chest Pain");
        assert_eq!(readable_feature("cond_copd"), "Condition: Copd");
        assert_eq!(readable_feature("bp_systolic"), "Bp Systolic");
    }

    #[test]
    fn baseline_low_for_healthy_patient() {
        let out = BaselineClassifier
            .predict(&FeatureVector::from_patient(&make_patient()))
            .unwrap();
        assert_eq!(out.risk_label, RiskLevel::Low);
        assert!(out.validate().is_ok());
        assert!(out.confidence() > 0.5);
    }

    #[test]
    fn baseline_high_for_unstable_patient() {
        let mut p = make_patient();
        p.age = 68;
        p.vitals.bp_systolic = 195.0;
        p.vitals.bp_diastolic = 110.0;
        p.vitals.heart_rate = 92.0;
        p.vitals.temperature = 37.0;
        p.vitals.spo2 = 88.0;
        p.symptoms = vec!["chest_pain".into()];
        let out = BaselineClassifier.predict(&FeatureVector::from_patient(&p)).unwrap();
        assert_eq!(out.risk_label, RiskLevel::High);
        assert_eq!(out.ranked_factors[0].name, "Spo2");
        assert!(out
            .ranked_factors
            .windows(2)
            .all(|w| w[0].magnitude >= w[1].magnitude));
    }

    #[test]
    fn young_age_pushes_down() {
        let mut p = make_patient();
        p.age = 20;
        let out = BaselineClassifier.predict(&FeatureVector::from_patient(&p)).unwrap();
        let age = out.ranked_factors.iter().find(|f| f.name == "Age").unwrap();
        assert_eq!(age.direction, FactorDirection::Down);
    }

    #[test]
    fn validate_rejects_bad_output() {
        let mut out = BaselineClassifier
            .predict(&FeatureVector::from_patient(&make_patient()))
            .unwrap();
        out.class_probabilities.insert(RiskLevel::High, 0.9);
        assert!(matches!(out.validate(), Err(ClassifierError::MalformedOutput(_))));

        out.class_probabilities.remove(&RiskLevel::Medium);
        assert!(out.validate().is_err());
    }
}
