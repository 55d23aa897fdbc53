//! Early Deterioration Detector.
//!
//! Pattern-based urgency scores for patients heading toward shock, stroke
//! or sepsis. Never reads classifier output: it is a parallel signal so a
//! classifier failure cannot mask an obvious deterioration.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::{DeteriorationPattern, IssueSeverity, PatientSnapshot, RiskLevel};

use super::messages::MessageTemplates;
use super::rules::{clamp_score, round_score, Rule, RuleSet};

pub const SEPSIS_WEIGHT: f64 = 0.40;
pub const SHOCK_WEIGHT: f64 = 0.35;
pub const STROKE_WEIGHT: f64 = 0.25;

pub const CRITICAL_BAND: f64 = 60.0;
pub const WARNING_BAND: f64 = 30.0;
pub const INFO_BAND: f64 = 15.0;

const FEVER_MIN_C: f64 = 38.0; // 100.4 °F
const HYPOTHERMIA_MAX_C: f64 = 36.0; // 96.8 °F

const IMMUNOCOMPROMISE_CONDITIONS: &[&str] = &[
    "diabetes", "cancer", "chronic_kidney_disease", "copd", "liver_disease", "hiv",
];
const INFECTION_SYMPTOMS: &[&str] = &[
    "fever", "confusion", "cough", "diarrhea", "vomiting", "abdominal_pain", "rash",
    "sore_throat",
];
const PERFUSION_SYMPTOMS: &[&str] = &[
    "fainting", "bleeding", "cold_sweats", "pale_skin", "dizziness",
];
const CEREBROVASCULAR_CONDITIONS: &[&str] = &[
    "stroke_history", "hypertension", "heart_disease", "atrial_fibrillation",
];
const NEURO_SYMPTOMS: &[&str] = &[
    "headache", "numbness", "vision_changes", "confusion", "speech_difficulty",
    "muscle_weakness",
];

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

static SEPSIS_RULES: LazyLock<RuleSet<PatientSnapshot>> = LazyLock::new(|| {
    RuleSet::new(vec![
        Rule::fixed("SEP-TEMP", "abnormal_temperature", 25.0, |p: &PatientSnapshot| {
            p.vitals.temperature >= FEVER_MIN_C || p.vitals.temperature <= HYPOTHERMIA_MAX_C
        }),
        Rule::new(
            "SEP-HR",
            "tachycardia",
            |p: &PatientSnapshot| p.vitals.heart_rate > 90.0,
            |p: &PatientSnapshot| 15.0 + 0.4 * (p.vitals.heart_rate - 90.0),
        ),
        Rule::new(
            "SEP-SPO2",
            "hypoxia",
            |p: &PatientSnapshot| p.vitals.spo2 < 95.0,
            |p: &PatientSnapshot| 20.0 + 2.0 * (95.0 - p.vitals.spo2),
        ),
        Rule::new(
            "SEP-BP",
            "hypotension",
            |p: &PatientSnapshot| p.vitals.bp_systolic < 100.0,
            |p: &PatientSnapshot| 15.0 + 0.3 * (100.0 - p.vitals.bp_systolic),
        ),
        Rule::fixed("SEP-AGE", "advanced_age", 8.0, |p: &PatientSnapshot| p.age > 65),
        Rule::fixed("SEP-IMMUNO", "immunocompromise", 10.0, |p: &PatientSnapshot| {
            !p.conditions_in(IMMUNOCOMPROMISE_CONDITIONS).is_empty()
        }),
        Rule::fixed("SEP-INFECTION", "infection_symptoms", 12.0, |p: &PatientSnapshot| {
            !p.symptoms_in(INFECTION_SYMPTOMS).is_empty()
        }),
    ])
});

static SHOCK_RULES: LazyLock<RuleSet<PatientSnapshot>> = LazyLock::new(|| {
    RuleSet::new(vec![
        Rule::new(
            "SHK-BP",
            "hypotension",
            |p: &PatientSnapshot| p.vitals.bp_systolic < 100.0,
            |p: &PatientSnapshot| 20.0 + 0.8 * (100.0 - p.vitals.bp_systolic),
        ),
        Rule::new(
            "SHK-INDEX",
            "elevated_shock_index",
            |p: &PatientSnapshot| p.vitals.shock_index() > 0.9,
            |p: &PatientSnapshot| 10.0 + 40.0 * (p.vitals.shock_index() - 0.9),
        ),
        Rule::new(
            "SHK-HR",
            "tachycardia",
            |p: &PatientSnapshot| p.vitals.heart_rate > 100.0,
            |p: &PatientSnapshot| 10.0 + 0.5 * (p.vitals.heart_rate - 100.0),
        ),
        Rule::new(
            "SHK-SPO2",
            "hypoxia",
            |p: &PatientSnapshot| p.vitals.spo2 < 94.0,
            |p: &PatientSnapshot| 10.0 + 1.5 * (94.0 - p.vitals.spo2),
        ),
        Rule::new(
            "SHK-PERFUSION",
            "perfusion_symptoms",
            |p: &PatientSnapshot| !p.symptoms_in(PERFUSION_SYMPTOMS).is_empty(),
            |p: &PatientSnapshot| 8.0 * p.symptoms_in(PERFUSION_SYMPTOMS).len() as f64,
        ),
        Rule::fixed("SHK-AGE", "advanced_age", 6.0, |p: &PatientSnapshot| p.age > 70),
    ])
});

static STROKE_RULES: LazyLock<RuleSet<PatientSnapshot>> = LazyLock::new(|| {
    RuleSet::new(vec![
        Rule::new(
            "STR-SBP",
            "severe_hypertension",
            |p: &PatientSnapshot| p.vitals.bp_systolic > 160.0,
            |p: &PatientSnapshot| 15.0 + 0.5 * (p.vitals.bp_systolic - 160.0),
        ),
        Rule::new(
            "STR-DBP",
            "diastolic_hypertension",
            |p: &PatientSnapshot| p.vitals.bp_diastolic > 100.0,
            |p: &PatientSnapshot| 5.0 + 0.5 * (p.vitals.bp_diastolic - 100.0),
        ),
        Rule::new(
            "STR-AGE",
            "age_risk",
            |p: &PatientSnapshot| p.age > 55,
            |p: &PatientSnapshot| 5.0 + 0.4 * (f64::from(p.age) - 55.0),
        ),
        Rule::new(
            "STR-COND",
            "cerebrovascular_conditions",
            |p: &PatientSnapshot| !p.conditions_in(CEREBROVASCULAR_CONDITIONS).is_empty(),
            |p: &PatientSnapshot| 10.0 * p.conditions_in(CEREBROVASCULAR_CONDITIONS).len() as f64,
        ),
        Rule::new(
            "STR-NEURO",
            "neurological_symptoms",
            |p: &PatientSnapshot| !p.symptoms_in(NEURO_SYMPTOMS).is_empty(),
            |p: &PatientSnapshot| 12.0 * p.symptoms_in(NEURO_SYMPTOMS).len() as f64,
        ),
        Rule::new(
            "STR-HR",
            "tachycardia",
            |p: &PatientSnapshot| p.vitals.heart_rate > 100.0,
            |p: &PatientSnapshot| 5.0 + 0.2 * (p.vitals.heart_rate - 100.0),
        ),
    ])
});

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeteriorationAlert {
    pub pattern: DeteriorationPattern,
    pub severity: IssueSeverity,
    pub score: u8,
    pub triggers: Vec<String>,
    pub recommendation: String,
}

/// Unrounded sub-scores, each clamped to [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub pre_shock: f64,
    pub pre_stroke: f64,
    pub pre_sepsis: f64,
}

impl SubScores {
    /// Weighted composite, clamped but not rounded.
    pub fn composite(&self) -> f64 {
        clamp_score(
            SEPSIS_WEIGHT * self.pre_sepsis
                + SHOCK_WEIGHT * self.pre_shock
                + STROKE_WEIGHT * self.pre_stroke,
            100.0,
        )
    }

    pub fn get(&self, pattern: DeteriorationPattern) -> f64 {
        match pattern {
            DeteriorationPattern::PreShock => self.pre_shock,
            DeteriorationPattern::PreStroke => self.pre_stroke,
            DeteriorationPattern::PreSepsis => self.pre_sepsis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeteriorationReport {
    pub sub_scores: SubScores,
    pub deterioration_score: u8,
    pub has_critical_alert: bool,
    pub alert_count: usize,
    pub alerts: Vec<DeteriorationAlert>,
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

fn rules_for(pattern: DeteriorationPattern) -> &'static RuleSet<PatientSnapshot> {
    match pattern {
        DeteriorationPattern::PreShock => &SHOCK_RULES,
        DeteriorationPattern::PreStroke => &STROKE_RULES,
        DeteriorationPattern::PreSepsis => &SEPSIS_RULES,
    }
}

/// Severity band for a sub-score, `None` below the info band.
pub fn severity_for(score: f64) -> Option<IssueSeverity> {
    if score >= CRITICAL_BAND {
        Some(IssueSeverity::Critical)
    } else if score >= WARNING_BAND {
        Some(IssueSeverity::Warning)
    } else if score >= INFO_BAND {
        Some(IssueSeverity::Info)
    } else {
        None
    }
}

/// Run all three pattern checks.
pub fn detect(patient: &PatientSnapshot) -> DeteriorationReport {
    let mut alerts = Vec::new();
    let mut scores = [0.0f64; 3];

    for (slot, pattern) in DeteriorationPattern::ALL.iter().enumerate() {
        let result = rules_for(*pattern).score(patient);
        let score = clamp_score(result.total, 100.0);
        scores[slot] = score;

        if let Some(severity) = severity_for(score) {
            alerts.push(DeteriorationAlert {
                pattern: *pattern,
                severity,
                score: round_score(score),
                triggers: result.hits.into_iter().map(|h| h.label).collect(),
                recommendation: MessageTemplates::deterioration_recommendation(*pattern, severity)
                    .to_string(),
            });
        }
    }

    let sub_scores = SubScores {
        pre_shock: scores[0],
        pre_stroke: scores[1],
        pre_sepsis: scores[2],
    };
    let has_critical_alert = alerts.iter().any(|a| a.severity == IssueSeverity::Critical);

    if has_critical_alert {
        tracing::warn!(
            pre_shock = sub_scores.pre_shock,
            pre_stroke = sub_scores.pre_stroke,
            pre_sepsis = sub_scores.pre_sepsis,
            "Critical deterioration pattern detected"
        );
    }

    DeteriorationReport {
        sub_scores,
        deterioration_score: round_score(sub_scores.composite()),
        has_critical_alert,
        alert_count: alerts.len(),
        alerts,
    }
}

/// Map the composite onto the three-level scale (degraded-mode fallback).
pub fn composite_risk_level(deterioration_score: u8) -> RiskLevel {
    let score = f64::from(deterioration_score);
    if score >= CRITICAL_BAND {
        RiskLevel::High
    } else if score >= WARNING_BAND {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
