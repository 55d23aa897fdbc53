pub mod enums;
pub mod patient;

pub use enums::{
    CapacityLevel, Department, DeteriorationPattern, EnumParseError, EstimateSource,
    FactorDirection, Gender, IssueSeverity, RiskLevel, TrajectoryProfile, TriageStage, Urgency,
};
pub use patient::{PatientSnapshot, ValidationError, Vitals, CONDITION_CODES, SYMPTOM_CODES};
