use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{RiskLevel, TriageStage, ValidationError};

use super::classifier::RankedFactor;
use super::department::DepartmentRecommendation;
use super::deterioration::DeteriorationReport;
use super::digital_twin::DigitalTwinProjection;
use super::insurance::InsuranceAssessment;
use super::resources::{CapacityStatus, ResourceError};
use super::symptom_checker::ConsistencyReport;

// ---------------------------------------------------------------------------
// TriageError
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid patient data: {0}")]
    Validation(#[from] ValidationError),

    /// A logic defect produced an impossible intermediate value. The
    /// result is withheld rather than returned wrong.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Resource lookup failed: {0}")]
    Resource(#[from] ResourceError),
}

// ---------------------------------------------------------------------------
// TriageResult
// ---------------------------------------------------------------------------

/// Complete verdict for one submission. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    /// `PT-` followed by 8 uppercase hex digits.
    pub patient_id: String,
    pub timestamp: DateTime<Utc>,
    pub patient_name: String,

    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub probabilities: BTreeMap<RiskLevel, f64>,
    pub override_applied: bool,
    pub override_rule: Option<String>,
    pub override_reason: Option<String>,
    pub explanation_factors: Vec<RankedFactor>,
    /// Classifier failed; risk level came from the deterioration composite.
    pub degraded: bool,
    pub degraded_reason: Option<String>,

    pub symptom_check: ConsistencyReport,
    pub deterioration: DeteriorationReport,
    pub digital_twin: DigitalTwinProjection,
    pub department: DepartmentRecommendation,
    pub insurance: InsuranceAssessment,
    pub resource_status: Option<CapacityStatus>,

    pub stage_trace: Vec<TriageStage>,
}
