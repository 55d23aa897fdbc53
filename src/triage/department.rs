//! Department Router.
//!
//! Weighted multi-criteria scoring over a fixed registry of eight
//! departments. Each department declares symptom, condition and risk-level
//! rules; raw scores are normalized by the department's declared maximum.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::models::{Department, PatientSnapshot, RiskLevel};

use super::messages::MessageTemplates;
use super::rules::{clamp_score, round_to, sort_by_weight_desc, Rule, RuleSet};

/// Inputs the routing rules read.
#[derive(Debug, Clone)]
pub struct RoutingInput {
    pub risk_level: RiskLevel,
    pub symptoms: Vec<String>,
    pub conditions: Vec<String>,
}

impl RoutingInput {
    pub fn new(risk_level: RiskLevel, patient: &PatientSnapshot) -> Self {
        Self {
            risk_level,
            symptoms: patient.symptoms.clone(),
            conditions: patient.conditions.clone(),
        }
    }
}

/// Static capability profile of one department.
pub struct DepartmentProfile {
    pub department: Department,
    pub symptoms: &'static [(&'static str, f64)],
    pub conditions: &'static [(&'static str, f64)],
    pub risk: &'static [(RiskLevel, f64)],
    /// Sum of every symptom and condition weight plus the largest risk weight.
    pub max_score: f64,
    /// Applied to the normalized score when risk is High.
    pub high_risk_multiplier: f64,
}

/// Registry in routing priority order.
pub static DEPARTMENTS: &[DepartmentProfile] = &[
    DepartmentProfile {
        department: Department::Emergency,
        symptoms: &[
            ("chest_pain", 3.0),
            ("shortness_of_breath", 2.5),
            ("confusion", 3.0),
            ("cold_sweats", 2.5),
            ("pale_skin", 2.0),
            ("speech_difficulty", 2.5),
        ],
        conditions: &[("heart_disease", 2.0), ("stroke_history", 2.0)],
        risk: &[(RiskLevel::High, 4.0), (RiskLevel::Medium, 0.5)],
        max_score: 23.5,
        high_risk_multiplier: 2.0,
    },
    DepartmentProfile {
        department: Department::Cardiology,
        symptoms: &[
            ("chest_pain", 3.0),
            ("palpitations", 3.0),
            ("arm_pain", 2.5),
            ("jaw_pain", 2.0),
            ("shortness_of_breath", 2.0),
            ("cold_sweats", 1.5),
            ("dizziness", 1.0),
        ],
        conditions: &[("heart_disease", 3.0), ("hypertension", 2.0), ("obesity", 1.0)],
        risk: &[(RiskLevel::High, 2.0), (RiskLevel::Medium, 1.0)],
        max_score: 23.0,
        high_risk_multiplier: 1.25,
    },
    DepartmentProfile {
        department: Department::Neurology,
        symptoms: &[
            ("headache", 2.5),
            ("dizziness", 2.0),
            ("vision_changes", 2.5),
            ("numbness", 3.0),
            ("confusion", 2.5),
            ("speech_difficulty", 3.0),
            ("muscle_weakness", 2.0),
        ],
        conditions: &[("stroke_history", 3.0), ("epilepsy", 2.5), ("hypertension", 1.0)],
        risk: &[(RiskLevel::High, 2.0), (RiskLevel::Medium, 0.5)],
        max_score: 26.0,
        high_risk_multiplier: 1.25,
    },
    DepartmentProfile {
        department: Department::Pulmonology,
        symptoms: &[
            ("cough", 2.5),
            ("wheezing", 3.0),
            ("breathlessness", 3.0),
            ("shortness_of_breath", 2.5),
            ("fever", 1.0),
            ("chest_pain", 1.0),
        ],
        conditions: &[("asthma", 3.0), ("copd", 3.0)],
        risk: &[(RiskLevel::High, 1.5), (RiskLevel::Medium, 0.5)],
        max_score: 20.5,
        high_risk_multiplier: 1.1,
    },
    DepartmentProfile {
        department: Department::Gastroenterology,
        symptoms: &[
            ("abdominal_pain", 3.0),
            ("nausea", 2.5),
            ("vomiting", 2.5),
            ("diarrhea", 2.0),
            ("weight_loss", 1.5),
            ("fatigue", 0.5),
        ],
        conditions: &[],
        risk: &[(RiskLevel::High, 1.0), (RiskLevel::Medium, 0.5)],
        max_score: 13.0,
        high_risk_multiplier: 1.0,
    },
    DepartmentProfile {
        department: Department::GeneralMedicine,
        symptoms: &[
            ("fever", 2.0),
            ("fatigue", 2.0),
            ("sore_throat", 2.5),
            ("cough", 1.5),
            ("headache", 1.0),
            ("rash", 1.0),
            ("frequent_urination", 2.0),
            ("weight_loss", 1.5),
        ],
        conditions: &[("diabetes", 2.0), ("thyroid_disorder", 2.0)],
        risk: &[(RiskLevel::Low, 1.0)],
        max_score: 18.5,
        high_risk_multiplier: 1.0,
    },
    DepartmentProfile {
        department: Department::Orthopedics,
        symptoms: &[
            ("joint_pain", 3.0),
            ("back_pain", 3.0),
            ("swelling", 2.5),
            ("muscle_weakness", 2.0),
        ],
        conditions: &[("obesity", 1.0)],
        risk: &[(RiskLevel::High, 0.5)],
        max_score: 12.0,
        high_risk_multiplier: 1.0,
    },
    DepartmentProfile {
        department: Department::Dermatology,
        symptoms: &[("rash", 3.0), ("swelling", 1.5)],
        conditions: &[],
        risk: &[],
        max_score: 4.5,
        high_risk_multiplier: 1.0,
    },
];

fn build_rules(profile: &'static DepartmentProfile) -> RuleSet<RoutingInput> {
    let mut rules = Vec::new();
    for &(code, weight) in profile.symptoms {
        rules.push(Rule::fixed(
            "SYMPTOM",
            MessageTemplates::symptom_reason(code, weight),
            weight,
            move |input: &RoutingInput| input.symptoms.iter().any(|s| s == code),
        ));
    }
    for &(code, weight) in profile.conditions {
        rules.push(Rule::fixed(
            "CONDITION",
            MessageTemplates::condition_reason(code, weight),
            weight,
            move |input: &RoutingInput| input.conditions.iter().any(|c| c == code),
        ));
    }
    for &(level, weight) in profile.risk {
        rules.push(Rule::fixed(
            "RISK",
            MessageTemplates::risk_reason(level, weight),
            weight,
            move |input: &RoutingInput| input.risk_level == level,
        ));
    }
    RuleSet::new(rules)
}

static ROUTING_RULES: LazyLock<Vec<(&'static DepartmentProfile, RuleSet<RoutingInput>)>> =
    LazyLock::new(|| DEPARTMENTS.iter().map(|p| (p, build_rules(p))).collect());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentScore {
    pub department: Department,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentRecommendation {
    pub recommended: DepartmentScore,
    pub alternatives: Vec<DepartmentScore>,
}

/// Score one department. Returns the unrounded normalized score.
fn score_department(
    profile: &DepartmentProfile,
    rules: &RuleSet<RoutingInput>,
    input: &RoutingInput,
) -> (f64, Vec<String>) {
    let mut result = rules.score(input);
    sort_by_weight_desc(&mut result.hits);
    let mut reasons: Vec<String> = result.hits.into_iter().map(|h| h.label).collect();

    let mut normalized = result.total / profile.max_score;
    if input.risk_level == RiskLevel::High
        && profile.high_risk_multiplier > 1.0
        && result.total > 0.0
    {
        normalized *= profile.high_risk_multiplier;
        reasons.push(MessageTemplates::high_risk_boost(
            profile.department,
            profile.high_risk_multiplier,
        ));
    }
    (clamp_score(normalized, 1.0), reasons)
}

/// Rank every department and pick the best, with up to `max_alternatives`
/// runners-up whose score is above zero.
pub fn recommend(
    risk_level: RiskLevel,
    patient: &PatientSnapshot,
    max_alternatives: usize,
) -> DepartmentRecommendation {
    let input = RoutingInput::new(risk_level, patient);

    let mut ranked: Vec<(Department, f64, Vec<String>)> = ROUTING_RULES
        .iter()
        .map(|(profile, rules)| {
            let (score, reasons) = score_department(profile, rules, &input);
            (profile.department, score, reasons)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.priority().cmp(&b.0.priority())));

    let mut scores = ranked.into_iter().map(|(department, score, reasons)| DepartmentScore {
        department,
        score: round_to(score, 3),
        reasons,
    });

    let recommended = scores.next().unwrap_or_else(|| DepartmentScore {
        department: Department::GeneralMedicine,
        score: 0.0,
        reasons: Vec::new(),
    });
    let alternatives: Vec<DepartmentScore> = scores
        .filter(|s| s.score > 0.0)
        .take(max_alternatives)
        .collect();

    tracing::debug!(
        department = recommended.department.as_str(),
        score = recommended.score,
        alternatives = alternatives.len(),
        "Department routed"
    );

    DepartmentRecommendation {
        recommended,
        alternatives,
    }
}
