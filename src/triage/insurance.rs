//! Insurance Wait-Time Risk Analyzer.
//!
//! Overlays the expected authorization delay on the digital twin timeline
//! to decide whether waiting for the insurer is clinically safe.

use serde::{Deserialize, Serialize};

use crate::models::{EstimateSource, PatientSnapshot, RiskLevel, Urgency};

use super::digital_twin::DigitalTwinProjection;
use super::messages::MessageTemplates;
use super::rules::round_to;

/// Response-time profile of one insurer, in minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsurerProfile {
    pub name: &'static str,
    pub average_minutes: f64,
    pub variance_minutes: f64,
    pub fast_track_available: bool,
}

pub static INSURERS: &[InsurerProfile] = &[
    InsurerProfile { name: "BlueCross", average_minutes: 120.0, variance_minutes: 36.0, fast_track_available: true },
    InsurerProfile { name: "Aetna", average_minutes: 180.0, variance_minutes: 48.0, fast_track_available: true },
    InsurerProfile { name: "UnitedHealth", average_minutes: 150.0, variance_minutes: 42.0, fast_track_available: true },
    InsurerProfile { name: "Cigna", average_minutes: 210.0, variance_minutes: 60.0, fast_track_available: false },
    InsurerProfile { name: "Medicare", average_minutes: 90.0, variance_minutes: 24.0, fast_track_available: true },
    InsurerProfile { name: "Medicaid", average_minutes: 60.0, variance_minutes: 18.0, fast_track_available: true },
    InsurerProfile { name: "HumanaCare", average_minutes: 240.0, variance_minutes: 72.0, fast_track_available: false },
    InsurerProfile { name: "Self-Pay", average_minutes: 0.0, variance_minutes: 0.0, fast_track_available: true },
];

/// Profile assumed for insurers missing from the table.
pub const UNKNOWN_INSURER: InsurerProfile = InsurerProfile {
    name: "Unknown",
    average_minutes: 150.0,
    variance_minutes: 48.0,
    fast_track_available: false,
};

/// Case-insensitive profile lookup.
pub fn insurer_profile(name: &str) -> InsurerProfile {
    let name = name.trim();
    INSURERS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or(UNKNOWN_INSURER)
}

fn urgency_multiplier(level: RiskLevel) -> f64 {
    match level {
        RiskLevel::High => 1.8,
        RiskLevel::Medium => 1.2,
        RiskLevel::Low => 0.6,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEstimate {
    pub estimated_minutes: f64,
    pub range_low_minutes: f64,
    pub range_high_minutes: f64,
    pub fast_track_available: bool,
    pub source: EstimateSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceAssessment {
    pub insurer: String,
    pub response: ResponseEstimate,
    pub risk_now: RiskLevel,
    pub risk_at_response: RiskLevel,
    pub escalation_during_wait: bool,
    pub urgency: Urgency,
    pub advisory: String,
}

/// Expected authorization delay. A declared response time wins over the
/// insurer profile.
pub fn estimate_response(
    profile: &InsurerProfile,
    declared_hours: f64,
    risk_now: RiskLevel,
) -> ResponseEstimate {
    let (estimated, source) = if declared_hours > 0.0 {
        (declared_hours * 60.0, EstimateSource::Declared)
    } else {
        (
            profile.average_minutes * urgency_multiplier(risk_now),
            EstimateSource::InsurerProfile,
        )
    };

    ResponseEstimate {
        estimated_minutes: round_to(estimated, 1),
        range_low_minutes: round_to((estimated - profile.variance_minutes).max(0.0), 1),
        range_high_minutes: round_to(estimated + profile.variance_minutes, 1),
        fast_track_available: profile.fast_track_available,
        source,
    }
}

pub fn urgency_for(risk_now: RiskLevel, risk_at_response: RiskLevel) -> Urgency {
    let escalation = risk_at_response > risk_now;
    if risk_now == RiskLevel::High || (escalation && risk_at_response == RiskLevel::High) {
        Urgency::BypassInsurance
    } else if escalation {
        Urgency::Expedite
    } else {
        Urgency::Routine
    }
}

pub fn assess(
    patient: &PatientSnapshot,
    risk_now: RiskLevel,
    twin: &DigitalTwinProjection,
) -> InsuranceAssessment {
    let profile = insurer_profile(&patient.insurance_provider);
    let response = estimate_response(&profile, patient.insurance_response_hours, risk_now);
    let risk_at_response = twin.level_at(response.estimated_minutes);
    let escalation_during_wait = risk_at_response > risk_now;
    let urgency = urgency_for(risk_now, risk_at_response);

    let advisory = if response.estimated_minutes <= 0.0 {
        MessageTemplates::no_insurance_delay(risk_now)
    } else {
        MessageTemplates::insurance_advisory(
            urgency,
            &patient.insurance_provider,
            response.estimated_minutes,
            risk_now,
            risk_at_response,
            response.fast_track_available,
        )
    };

    if urgency != Urgency::Routine {
        tracing::info!(
            insurer = %patient.insurance_provider,
            urgency = urgency.as_str(),
            estimated_minutes = response.estimated_minutes,
            "Insurance wait flagged"
        );
    }

    InsuranceAssessment {
        insurer: patient.insurance_provider.clone(),
        response,
        risk_now,
        risk_at_response,
        escalation_during_wait,
        urgency,
        advisory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriageConfig;
    use crate::models::patient::make_patient;
    use crate::triage::{deterioration, digital_twin};

    fn twin_for(p: &PatientSnapshot, level: RiskLevel) -> DigitalTwinProjection {
        digital_twin::simulate(&p.vitals, level, &deterioration::detect(p), &TriageConfig::default())
    }

    #[test]
    fn unknown_insurer_gets_default_profile() {
        let p = insurer_profile("Acme Mutual");
        assert_eq!(p, UNKNOWN_INSURER);
        assert_eq!(insurer_profile("cigna").name, "Cigna");
    }

    #[test]
    fn profile_estimate_scales_with_risk() {
        let cigna = insurer_profile("Cigna");
        let low = estimate_response(&cigna, 0.0, RiskLevel::Low);
        assert_eq!(low.estimated_minutes, 126.0);
        assert_eq!(low.range_low_minutes, 66.0);
        assert_eq!(low.range_high_minutes, 186.0);
        assert_eq!(low.source, EstimateSource::InsurerProfile);
        assert!(!low.fast_track_available);

        let high = estimate_response(&cigna, 0.0, RiskLevel::High);
        assert_eq!(high.estimated_minutes, 378.0);
    }

    #[test]
    fn declared_hours_override_profile() {
        let est = estimate_response(&insurer_profile("Aetna"), 1.5, RiskLevel::High);
        assert_eq!(est.estimated_minutes, 90.0);
        assert_eq!(est.source, EstimateSource::Declared);
    }

    #[test]
    fn urgency_table() {
        use RiskLevel::*;
        assert_eq!(urgency_for(High, High), Urgency::BypassInsurance);
        assert_eq!(urgency_for(Medium, High), Urgency::BypassInsurance);
        assert_eq!(urgency_for(Low, Medium), Urgency::Expedite);
        assert_eq!(urgency_for(Medium, Medium), Urgency::Routine);
        assert_eq!(urgency_for(Low, Low), Urgency::Routine);
    }

    #[test]
    fn high_risk_always_bypasses() {
        for insurer in ["BlueCross", "Cigna", "Self-Pay", "Nobody"] {
            let mut p = make_patient();
            p.insurance_provider = insurer.to_string();
            let twin = twin_for(&p, RiskLevel::High);
            let a = assess(&p, RiskLevel::High, &twin);
            assert_eq!(a.urgency, Urgency::BypassInsurance, "{insurer}");
        }
    }

    #[test]
    fn stable_low_risk_is_routine() {
        let mut p = make_patient();
        p.insurance_provider = "Cigna".into();
        let twin = twin_for(&p, RiskLevel::Low);
        let a = assess(&p, RiskLevel::Low, &twin);
        assert_eq!(a.urgency, Urgency::Routine);
        assert!(!a.escalation_during_wait);
        assert!(a.advisory.contains("Cigna"));
    }

    #[test]
    fn escalation_during_long_wait_is_flagged() {
        let mut p = make_patient();
        p.vitals.bp_systolic = 95.0;
        p.vitals.heart_rate = 112.0;
        p.vitals.spo2 = 92.0;
        p.insurance_provider = "HumanaCare".into();
        let twin = twin_for(&p, RiskLevel::Medium);
        let a = assess(&p, RiskLevel::Medium, &twin);
        // 240 min x 1.2 lies beyond the horizon, so the last step is used.
        assert_eq!(a.risk_at_response, twin.projected_final_risk);
        assert!(a.escalation_during_wait);
        assert_eq!(a.urgency, Urgency::BypassInsurance);
    }

    #[test]
    fn self_pay_has_no_delay() {
        let p = make_patient();
        let twin = twin_for(&p, RiskLevel::Low);
        let a = assess(&p, RiskLevel::Low, &twin);
        assert_eq!(a.response.estimated_minutes, 0.0);
        assert_eq!(a.risk_at_response, twin.steps[0].risk_level);
        assert!(a.advisory.starts_with("No insurance delay"));
    }
}
