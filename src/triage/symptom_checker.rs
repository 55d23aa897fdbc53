//! Symptom Consistency Checker.
//!
//! Flags contradictory or suspicious symptom/vital combinations before the
//! classifier sees them. Advisory only: issues never block triage.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::{IssueSeverity, PatientSnapshot};

use super::messages::MessageTemplates;
use super::rules::{Rule, RuleSet};

/// Temperature below which a reported fever is not corroborated.
const FEVER_CORROBORATION_MIN_C: f64 = 37.3;

const SUBJECTIVE_SYMPTOMS: &[&str] = &[
    "dizziness", "headache", "nausea", "abdominal_pain", "joint_pain", "back_pain",
];

const ADULT_ONSET_CONDITIONS: &[&str] = &["hypertension", "heart_disease", "copd"];

/// One consistency finding. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub has_issues: bool,
    pub issue_count: usize,
    pub issues: Vec<SymptomIssue>,
}

fn issue(severity: IssueSeverity, code: &str, message: String) -> SymptomIssue {
    SymptomIssue {
        severity,
        code: code.to_string(),
        message,
    }
}

static CONSISTENCY_RULES: LazyLock<RuleSet<PatientSnapshot, SymptomIssue>> =
    LazyLock::new(|| {
        RuleSet::new(vec![
            Rule::new(
                "FEVER_TEMP_MISMATCH",
                "Fever without elevated temperature",
                |p: &PatientSnapshot| {
                    p.has_symptom("fever") && p.vitals.temperature < FEVER_CORROBORATION_MIN_C
                },
                |p: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Warning,
                        "FEVER_TEMP_MISMATCH",
                        MessageTemplates::fever_temp_mismatch(p.vitals.temperature),
                    )
                },
            ),
            Rule::new(
                "CONFUSION_SELF_REPORT",
                "Confused patient self-reporting",
                |p: &PatientSnapshot| {
                    p.has_symptom("confusion") && p.symptoms_in(SUBJECTIVE_SYMPTOMS).len() >= 3
                },
                |_: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Warning,
                        "CONFUSION_SELF_REPORT",
                        MessageTemplates::confusion_self_report(),
                    )
                },
            ),
            Rule::new(
                "PEDIATRIC_ADULT_CONDITION",
                "Adult-onset condition in a child",
                |p: &PatientSnapshot| {
                    p.age < 12 && !p.conditions_in(ADULT_ONSET_CONDITIONS).is_empty()
                },
                |p: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Critical,
                        "PEDIATRIC_ADULT_CONDITION",
                        MessageTemplates::pediatric_adult_condition(
                            p.age,
                            &p.conditions_in(ADULT_ONSET_CONDITIONS),
                        ),
                    )
                },
            ),
            Rule::new(
                "PALPITATION_LOW_HR",
                "Palpitations with low heart rate",
                |p: &PatientSnapshot| p.has_symptom("palpitations") && p.vitals.heart_rate < 65.0,
                |p: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Warning,
                        "PALPITATION_LOW_HR",
                        MessageTemplates::palpitation_low_hr(p.vitals.heart_rate),
                    )
                },
            ),
            Rule::new(
                "DYSPNEA_NORMAL_SPO2",
                "Dyspnea with normal saturation",
                |p: &PatientSnapshot| {
                    p.has_symptom("shortness_of_breath") && p.vitals.spo2 >= 98.0
                },
                |p: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Info,
                        "DYSPNEA_NORMAL_SPO2",
                        MessageTemplates::dyspnea_normal_spo2(p.vitals.spo2),
                    )
                },
            ),
            Rule::new(
                "CHEST_PAIN_NORMAL_VITALS",
                "Chest pain with normal hemodynamics",
                |p: &PatientSnapshot| {
                    let v = &p.vitals;
                    p.has_symptom("chest_pain")
                        && (60.0..=100.0).contains(&v.heart_rate)
                        && (90.0..=140.0).contains(&v.bp_systolic)
                        && (60.0..=90.0).contains(&v.bp_diastolic)
                },
                |_: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Info,
                        "CHEST_PAIN_NORMAL_VITALS",
                        MessageTemplates::chest_pain_normal_vitals(),
                    )
                },
            ),
            Rule::new(
                "CHEST_PAIN_BRADYCARDIA",
                "Chest pain, hypotension, no compensatory tachycardia",
                |p: &PatientSnapshot| {
                    p.has_symptom("chest_pain")
                        && p.vitals.bp_systolic < 85.0
                        && p.vitals.heart_rate < 70.0
                },
                |_: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Warning,
                        "CHEST_PAIN_BRADYCARDIA",
                        MessageTemplates::chest_pain_bradycardia(),
                    )
                },
            ),
            Rule::new(
                "MANY_SYMPTOMS",
                "Unusually many symptoms",
                |p: &PatientSnapshot| p.symptoms.len() >= 6,
                |p: &PatientSnapshot| {
                    issue(
                        IssueSeverity::Info,
                        "MANY_SYMPTOMS",
                        MessageTemplates::many_symptoms(p.symptoms.len()),
                    )
                },
            ),
        ])
    });

/// Run every consistency rule. Pure function of the snapshot.
///
/// Each rule yields at most one issue, so rule-declaration order is also
/// the (declaration, severity) order.
pub fn check(patient: &PatientSnapshot) -> ConsistencyReport {
    let issues: Vec<SymptomIssue> = CONSISTENCY_RULES
        .evaluate(patient)
        .into_iter()
        .map(|fired| fired.value)
        .collect();

    if !issues.is_empty() {
        tracing::debug!(
            issue_count = issues.len(),
            codes = ?issues.iter().map(|i| i.code.as_str()).collect::<Vec<_>>(),
            "Symptom consistency issues found"
        );
    }

    ConsistencyReport {
        has_issues: !issues.is_empty(),
        issue_count: issues.len(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::make_patient;

    fn codes(report: &ConsistencyReport) -> Vec<&str> {
        report.issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn clean_patient_has_no_issues() {
        let report = check(&make_patient());
        assert!(!report.has_issues);
        assert_eq!(report.issue_count, 0);
    }

    #[test]
    fn fever_with_normal_temperature_warns() {
        let mut p = make_patient();
        p.symptoms = vec!["fever".into()];
        p.vitals.temperature = 36.9;
        let report = check(&p);
        assert_eq!(codes(&report), vec!["FEVER_TEMP_MISMATCH"]);
        assert_eq!(report.issues[0].severity, IssueSeverity::Warning);
        assert!(report.issues[0].message.contains("36.9"));
    }

    #[test]
    fn fever_with_high_temperature_is_consistent() {
        let mut p = make_patient();
        p.symptoms = vec!["fever".into()];
        p.vitals.temperature = 38.6;
        assert!(!check(&p).has_issues);
    }

    #[test]
    fn chest_pain_with_normal_vitals_is_info() {
        let mut p = make_patient();
        p.symptoms = vec!["chest_pain".into()];
        let report = check(&p);
        assert_eq!(codes(&report), vec!["CHEST_PAIN_NORMAL_VITALS"]);
        assert_eq!(report.issues[0].severity, IssueSeverity::Info);
    }

    #[test]
    fn pediatric_adult_condition_is_critical() {
        let mut p = make_patient();
        p.age = 8;
        p.conditions = vec!["asthma".into(), "hypertension".into()];
        let report = check(&p);
        assert_eq!(codes(&report), vec!["PEDIATRIC_ADULT_CONDITION"]);
        assert_eq!(report.issues[0].severity, IssueSeverity::Critical);
        assert!(report.issues[0].message.contains("hypertension"));
        assert!(!report.issues[0].message.contains("asthma"));
    }

    #[test]
    fn all_rules_evaluated_in_declaration_order() {
        let mut p = make_patient();
        p.symptoms = vec![
            "fever".into(),
            "confusion".into(),
            "dizziness".into(),
            "headache".into(),
            "nausea".into(),
            "palpitations".into(),
        ];
        p.vitals.temperature = 36.5;
        p.vitals.heart_rate = 60.0;
        let report = check(&p);
        assert_eq!(
            codes(&report),
            vec![
                "FEVER_TEMP_MISMATCH",
                "CONFUSION_SELF_REPORT",
                "PALPITATION_LOW_HR",
                "MANY_SYMPTOMS",
            ]
        );
    }

    #[test]
    fn dyspnea_with_perfect_saturation() {
        let mut p = make_patient();
        p.symptoms = vec!["shortness_of_breath".into()];
        p.vitals.spo2 = 99.0;
        assert_eq!(codes(&check(&p)), vec!["DYSPNEA_NORMAL_SPO2"]);
    }

    #[test]
    fn chest_pain_hypotension_without_tachycardia() {
        let mut p = make_patient();
        p.symptoms = vec!["chest_pain".into()];
        p.vitals.bp_systolic = 80.0;
        p.vitals.heart_rate = 62.0;
        assert_eq!(codes(&check(&p)), vec!["CHEST_PAIN_BRADYCARDIA"]);
    }
}
