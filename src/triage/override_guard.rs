//! Critical Override Guard.
//!
//! Hard-coded vital-sign limits evaluated before any statistical step.
//! The first matching rule (declaration order) wins; its reason is the only
//! one reported. These thresholds are constants, never learned.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::Vitals;

use super::rules::{Rule, RuleSet};

pub const SPO2_CRITICAL_MAX: f64 = 85.0;
pub const SYSTOLIC_CRITICAL_MIN: f64 = 200.0;
pub const HEART_RATE_CRITICAL_MIN: f64 = 150.0;
pub const TEMPERATURE_CRITICAL_MIN_C: f64 = 40.5;
pub const SYSTOLIC_COLLAPSE_MAX: f64 = 70.0;
pub const HEART_RATE_COLLAPSE_MAX: f64 = 35.0;

/// Result of the guard. When `fired`, downstream classifier output is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDecision {
    pub fired: bool,
    pub rule_id: Option<String>,
    pub reason: Option<String>,
}

impl OverrideDecision {
    pub fn not_fired() -> Self {
        Self {
            fired: false,
            rule_id: None,
            reason: None,
        }
    }
}

static OVERRIDE_RULES: LazyLock<RuleSet<Vitals, String>> = LazyLock::new(|| {
    RuleSet::new(vec![
        Rule::new(
            "OVR-SPO2",
            "Severe hypoxia",
            |v: &Vitals| v.spo2 <= SPO2_CRITICAL_MAX,
            |v: &Vitals| format!("Severe hypoxia (SpO2 {}% <= {}%)", v.spo2, SPO2_CRITICAL_MAX),
        ),
        Rule::new(
            "OVR-BP-HIGH",
            "Critically high blood pressure",
            |v: &Vitals| v.bp_systolic >= SYSTOLIC_CRITICAL_MIN,
            |v: &Vitals| {
                format!(
                    "Critically high systolic BP ({} mmHg >= {} mmHg)",
                    v.bp_systolic, SYSTOLIC_CRITICAL_MIN
                )
            },
        ),
        Rule::new(
            "OVR-HR-HIGH",
            "Extreme tachycardia",
            |v: &Vitals| v.heart_rate >= HEART_RATE_CRITICAL_MIN,
            |v: &Vitals| {
                format!(
                    "Extreme tachycardia (HR {} bpm >= {} bpm)",
                    v.heart_rate, HEART_RATE_CRITICAL_MIN
                )
            },
        ),
        Rule::new(
            "OVR-TEMP",
            "Hyperpyrexia",
            |v: &Vitals| v.temperature >= TEMPERATURE_CRITICAL_MIN_C,
            |v: &Vitals| {
                format!(
                    "Hyperpyrexia (temperature {}°C >= {}°C)",
                    v.temperature, TEMPERATURE_CRITICAL_MIN_C
                )
            },
        ),
        Rule::new(
            "OVR-BP-LOW",
            "Circulatory collapse",
            |v: &Vitals| v.bp_systolic <= SYSTOLIC_COLLAPSE_MAX,
            |v: &Vitals| {
                format!(
                    "Dangerously low systolic BP ({} mmHg <= {} mmHg)",
                    v.bp_systolic, SYSTOLIC_COLLAPSE_MAX
                )
            },
        ),
        Rule::new(
            "OVR-HR-LOW",
            "Severe bradycardia",
            |v: &Vitals| v.heart_rate <= HEART_RATE_COLLAPSE_MAX,
            |v: &Vitals| {
                format!(
                    "Severe bradycardia (HR {} bpm <= {} bpm)",
                    v.heart_rate, HEART_RATE_COLLAPSE_MAX
                )
            },
        ),
    ])
});

/// Evaluate the guard against raw vitals.
pub fn evaluate(vitals: &Vitals) -> OverrideDecision {
    match OVERRIDE_RULES.first(vitals) {
        Some(hit) => OverrideDecision {
            fired: true,
            rule_id: Some(hit.id.to_string()),
            reason: Some(hit.value),
        },
        None => OverrideDecision::not_fired(),
    }
}
