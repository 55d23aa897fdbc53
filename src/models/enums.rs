use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {field} value: {value}")]
pub struct EnumParseError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Variant declaration order is the total order (`Ord`) of the enum.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EnumParseError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(RiskLevel {
    Low => "Low",
    Medium => "Medium",
    High => "High",
});

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

str_enum!(IssueSeverity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(DeteriorationPattern {
    PreShock => "pre_shock",
    PreStroke => "pre_stroke",
    PreSepsis => "pre_sepsis",
});

str_enum!(TrajectoryProfile {
    Stable => "stable",
    Declining => "declining",
    CriticalTrajectory => "critical_trajectory",
});

// Declaration order doubles as the routing tie-break priority.
str_enum!(Department {
    Emergency => "Emergency",
    Cardiology => "Cardiology",
    Neurology => "Neurology",
    Pulmonology => "Pulmonology",
    Gastroenterology => "Gastroenterology",
    GeneralMedicine => "General Medicine",
    Orthopedics => "Orthopedics",
    Dermatology => "Dermatology",
});

str_enum!(Urgency {
    Routine => "ROUTINE",
    Expedite => "EXPEDITE",
    BypassInsurance => "BYPASS_INSURANCE",
});

str_enum!(EstimateSource {
    Declared => "declared",
    InsurerProfile => "insurer_profile",
});

str_enum!(CapacityLevel {
    Available => "available",
    NearCapacity => "near_capacity",
    Full => "full",
});

str_enum!(FactorDirection {
    Up => "up",
    Down => "down",
});

// Orchestrator stages in execution order.
str_enum!(TriageStage {
    Received => "received",
    ConsistencyChecked => "consistency_checked",
    OverrideEvaluated => "override_evaluated",
    ClassifierSkipped => "classifier_skipped",
    ClassifierConsulted => "classifier_consulted",
    DeteriorationEvaluated => "deterioration_evaluated",
    TwinProjected => "twin_projected",
    DepartmentRouted => "department_routed",
    InsuranceEvaluated => "insurance_evaluated",
    ResourceChecked => "resource_checked",
    Finalized => "finalized",
});

impl RiskLevel {
    /// Base score the vitals scoring function starts from for this level.
    pub fn base_score(self) -> f64 {
        match self {
            Self::Low => 0.15,
            Self::Medium => 0.45,
            Self::High => 0.75,
        }
    }
}

impl Department {
    /// Position in the fixed routing priority (0 = highest).
    pub fn priority(self) -> usize {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn risk_level_total_order() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(RiskLevel::ALL.iter().max(), Some(&RiskLevel::High));
    }

    #[test]
    fn risk_level_round_trips_through_str() {
        for level in RiskLevel::ALL {
            assert_eq!(RiskLevel::from_str(level.as_str()).unwrap(), *level);
        }
        assert!(RiskLevel::from_str("Severe").is_err());
    }

    #[test]
    fn urgency_serializes_upper_snake() {
        let json = serde_json::to_string(&Urgency::BypassInsurance).unwrap();
        assert_eq!(json, "\"BYPASS_INSURANCE\"");
    }

    #[test]
    fn department_priority_emergency_first() {
        assert_eq!(Department::Emergency.priority(), 0);
        assert_eq!(Department::Dermatology.priority(), 7);
        assert_eq!(Department::ALL.len(), 8);
        assert_eq!(Department::GeneralMedicine.as_str(), "General Medicine");
    }

    #[test]
    fn severity_ordering() {
        assert!(IssueSeverity::Info < IssueSeverity::Warning);
        assert!(IssueSeverity::Warning < IssueSeverity::Critical);
    }
}
