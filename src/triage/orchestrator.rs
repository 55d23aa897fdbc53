//! Triage orchestrator.
//!
//! Runs every component in a fixed order and assembles one immutable
//! [`TriageResult`]. The classifier is the only fallible collaborator; when
//! it fails the deterioration composite stands in and the result is
//! flagged degraded.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::TriageConfig;
use crate::models::{DeteriorationPattern, PatientSnapshot, RiskLevel, TriageStage};

use super::classifier::{
    BaselineClassifier, ClassifierError, ClassifierOutput, FeatureVector, RankedFactor,
    RiskClassifier,
};
use super::deterioration::{self, DeteriorationReport};
use super::digital_twin::{self, DigitalTwinProjection};
use super::override_guard::{self, OverrideDecision};
use super::resources::{CapacityStatus, ResourceError, ResourceLookup};
use super::rules::round_to;
use super::types::{TriageError, TriageResult};
use super::department::{self, DepartmentRecommendation};
use super::{insurance, symptom_checker};

/// Risk verdict before downstream components run.
struct Verdict {
    risk_level: RiskLevel,
    confidence: f64,
    probabilities: BTreeMap<RiskLevel, f64>,
    factors: Vec<RankedFactor>,
    degraded_reason: Option<String>,
}

/// Sequences the triage components. Cheap to share across threads.
pub struct TriagePipeline {
    classifier: Arc<dyn RiskClassifier>,
    resources: Arc<dyn ResourceLookup>,
    config: TriageConfig,
}

impl TriagePipeline {
    pub fn new(
        classifier: Arc<dyn RiskClassifier>,
        resources: Arc<dyn ResourceLookup>,
        config: TriageConfig,
    ) -> Self {
        Self {
            classifier,
            resources,
            config,
        }
    }

    /// Pipeline backed by the built-in baseline classifier.
    pub fn with_baseline(resources: Arc<dyn ResourceLookup>, config: TriageConfig) -> Self {
        Self::new(Arc::new(BaselineClassifier), resources, config)
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Triage one patient.
    pub fn triage(&self, patient: &PatientSnapshot) -> Result<TriageResult, TriageError> {
        patient.validate()?;
        let patient = patient.normalized();
        let mut trace = vec![TriageStage::Received];

        let symptom_check = symptom_checker::check(&patient);
        trace.push(TriageStage::ConsistencyChecked);

        let decision = override_guard::evaluate(&patient.vitals);
        trace.push(TriageStage::OverrideEvaluated);

        let classified = if decision.fired {
            tracing::warn!(
                rule = decision.rule_id.as_deref().unwrap_or_default(),
                reason = decision.reason.as_deref().unwrap_or_default(),
                "Critical override fired, classifier skipped"
            );
            trace.push(TriageStage::ClassifierSkipped);
            None
        } else {
            let outcome = self.consult_classifier(&patient);
            trace.push(TriageStage::ClassifierConsulted);
            Some(outcome)
        };

        let deterioration = deterioration::detect(&patient);
        trace.push(TriageStage::DeteriorationEvaluated);

        let verdict = self.resolve_verdict(&decision, classified, &deterioration);

        let twin = digital_twin::simulate(
            &patient.vitals,
            verdict.risk_level,
            &deterioration,
            &self.config,
        );
        trace.push(TriageStage::TwinProjected);

        let routing =
            department::recommend(verdict.risk_level, &patient, self.config.max_alternatives);
        trace.push(TriageStage::DepartmentRouted);

        let insurance = insurance::assess(&patient, verdict.risk_level, &twin);
        trace.push(TriageStage::InsuranceEvaluated);

        let resource_status = self.lookup_capacity(routing.recommended.department.as_str())?;
        trace.push(TriageStage::ResourceChecked);

        check_invariants(&decision, &verdict, &deterioration, &twin, &routing)?;
        trace.push(TriageStage::Finalized);

        tracing::info!(
            risk_level = verdict.risk_level.as_str(),
            override_applied = decision.fired,
            degraded = verdict.degraded_reason.is_some(),
            department = routing.recommended.department.as_str(),
            urgency = insurance.urgency.as_str(),
            deterioration_score = deterioration.deterioration_score,
            "Triage complete"
        );

        Ok(TriageResult {
            patient_id: new_patient_id(),
            timestamp: chrono::Utc::now(),
            patient_name: patient.name.clone(),
            risk_level: verdict.risk_level,
            confidence: verdict.confidence,
            probabilities: verdict.probabilities,
            override_applied: decision.fired,
            override_rule: decision.rule_id,
            override_reason: decision.reason,
            explanation_factors: verdict.factors,
            degraded: verdict.degraded_reason.is_some(),
            degraded_reason: verdict.degraded_reason,
            symptom_check,
            deterioration,
            digital_twin: twin,
            department: routing,
            insurance,
            resource_status,
            stage_trace: trace,
        })
    }

    fn consult_classifier(
        &self,
        patient: &PatientSnapshot,
    ) -> Result<ClassifierOutput, ClassifierError> {
        let features = FeatureVector::from_patient(patient);
        let output = self.classifier.predict(&features)?;
        output.validate()?;
        Ok(output)
    }

    fn resolve_verdict(
        &self,
        decision: &OverrideDecision,
        classified: Option<Result<ClassifierOutput, ClassifierError>>,
        deterioration: &DeteriorationReport,
    ) -> Verdict {
        if decision.fired {
            return Verdict {
                risk_level: RiskLevel::High,
                confidence: 1.0,
                probabilities: BTreeMap::from([
                    (RiskLevel::Low, 0.0),
                    (RiskLevel::Medium, 0.0),
                    (RiskLevel::High, 1.0),
                ]),
                factors: Vec::new(),
                degraded_reason: None,
            };
        }

        match classified {
            Some(Ok(output)) => {
                let confidence = round_to(output.confidence(), 4);
                let mut factors = output.ranked_factors;
                factors.truncate(self.config.max_explanation_factors);
                Verdict {
                    risk_level: output.risk_label,
                    confidence,
                    probabilities: output
                        .class_probabilities
                        .into_iter()
                        .map(|(level, p)| (level, round_to(p, 4)))
                        .collect(),
                    factors,
                    degraded_reason: None,
                }
            }
            Some(Err(err)) => degraded_verdict(deterioration, err.to_string()),
            None => degraded_verdict(deterioration, "classifier not consulted".to_string()),
        }
    }

    fn lookup_capacity(&self, department: &str) -> Result<Option<CapacityStatus>, TriageError> {
        match self.resources.capacity_status(department) {
            Ok(status) => Ok(Some(status)),
            Err(ResourceError::LockFailed) => Err(TriageError::Resource(ResourceError::LockFailed)),
            Err(err) => {
                tracing::warn!(department, error = %err, "Capacity lookup unavailable");
                Ok(None)
            }
        }
    }
}

fn degraded_verdict(deterioration: &DeteriorationReport, reason: String) -> Verdict {
    let risk_level = deterioration::composite_risk_level(deterioration.deterioration_score);
    tracing::warn!(
        reason = %reason,
        deterioration_score = deterioration.deterioration_score,
        fallback = risk_level.as_str(),
        "Classifier failed, using deterioration composite"
    );
    Verdict {
        risk_level,
        confidence: 0.0,
        probabilities: BTreeMap::new(),
        factors: Vec::new(),
        degraded_reason: Some(reason),
    }
}

/// `PT-` plus the first 8 hex digits of a v4 UUID, uppercased.
fn new_patient_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("PT-{}", hex[..8].to_ascii_uppercase())
}

fn check_invariants(
    decision: &OverrideDecision,
    verdict: &Verdict,
    deterioration: &DeteriorationReport,
    twin: &DigitalTwinProjection,
    routing: &DepartmentRecommendation,
) -> Result<(), TriageError> {
    match find_violation(decision, verdict, deterioration, twin, routing) {
        Some(violation) => {
            tracing::error!(violation = %violation, "Triage invariant violated");
            Err(TriageError::InvariantViolation(violation))
        }
        None => Ok(()),
    }
}

fn find_violation(
    decision: &OverrideDecision,
    verdict: &Verdict,
    deterioration: &DeteriorationReport,
    twin: &DigitalTwinProjection,
    routing: &DepartmentRecommendation,
) -> Option<String> {
    if decision.fired && verdict.risk_level != RiskLevel::High {
        return Some("override fired but risk level is not High".into());
    }
    if !(0.0..=1.0).contains(&verdict.confidence) {
        return Some(format!("confidence {} outside [0, 1]", verdict.confidence));
    }

    for pattern in DeteriorationPattern::ALL {
        let score = deterioration.sub_scores.get(*pattern);
        if !(0.0..=100.0).contains(&score) {
            return Some(format!("{pattern} sub-score {score} outside [0, 100]"));
        }
    }
    if deterioration.deterioration_score > 100 {
        return Some(format!(
            "deterioration score {} above 100",
            deterioration.deterioration_score
        ));
    }

    if twin.steps.first().map(|s| s.minute_offset) != Some(0) {
        return Some("timeline does not start at minute 0".into());
    }
    if twin.steps.windows(2).any(|w| w[1].minute_offset <= w[0].minute_offset) {
        return Some("timeline minute offsets not strictly increasing".into());
    }
    if let Some(step) = twin.steps.iter().find(|s| !(0.0..=1.0).contains(&s.risk_score)) {
        return Some(format!(
            "timeline risk score {} at minute {} outside [0, 1]",
            step.risk_score, step.minute_offset
        ));
    }
    let first_escalation = twin
        .steps
        .iter()
        .find(|s| s.risk_level > twin.starting_risk)
        .map(|s| s.minute_offset);
    if first_escalation != twin.escalation_minute {
        return Some("escalation minute does not match the first escalated step".into());
    }

    let scores = std::iter::once(&routing.recommended).chain(routing.alternatives.iter());
    for score in scores {
        if !(0.0..=1.0).contains(&score.score) {
            return Some(format!(
                "department score {} for {} outside [0, 1]",
                score.score, score.department
            ));
        }
    }

    None
}
