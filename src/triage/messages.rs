use crate::models::{
    CapacityLevel, Department, DeteriorationPattern, IssueSeverity, RiskLevel, TrajectoryProfile,
    Urgency,
};

/// Message template builder for consistent clinician-facing wording.
/// Every message names the measured value or matched code it is based on.
pub struct MessageTemplates;

impl MessageTemplates {
    // -- Symptom consistency --------------------------------------------

    pub fn fever_temp_mismatch(temperature: f64) -> String {
        format!(
            "Fever reported but measured temperature is {:.1}°C. \
             Re-measure before relying on the fever report.",
            temperature,
        )
    }

    pub fn confusion_self_report() -> String {
        "Patient reports confusion alongside several subjective symptoms. \
         Self-reported history may be unreliable; confirm with a companion if possible."
            .to_string()
    }

    pub fn pediatric_adult_condition(age: u32, conditions: &[&str]) -> String {
        format!(
            "Patient aged {} lists adult-onset condition(s): {}. \
             Verify the age and history entries.",
            age,
            conditions.join(", "),
        )
    }

    pub fn palpitation_low_hr(heart_rate: f64) -> String {
        format!(
            "Palpitations reported with a heart rate of {:.0} bpm. \
             Consider an ECG to look for an intermittent arrhythmia.",
            heart_rate,
        )
    }

    pub fn dyspnea_normal_spo2(spo2: f64) -> String {
        format!(
            "Shortness of breath reported with SpO2 {:.0}%. \
             Consider anxiety, early presentation, or sensor placement.",
            spo2,
        )
    }

    pub fn chest_pain_normal_vitals() -> String {
        "Chest pain with normal heart rate and blood pressure. \
         Normal vitals do not exclude a coronary event; obtain an ECG."
            .to_string()
    }

    pub fn chest_pain_bradycardia() -> String {
        "Chest pain with low blood pressure and no compensatory tachycardia. \
         Possible inferior MI or conduction block."
            .to_string()
    }

    pub fn many_symptoms(count: usize) -> String {
        format!(
            "{} symptoms reported. Confirm the list with the patient; \
             broad reporting can mask the primary complaint.",
            count,
        )
    }

    // -- Deterioration --------------------------------------------------

    /// Recommended action for a deterioration alert.
    pub fn deterioration_recommendation(
        pattern: DeteriorationPattern,
        severity: IssueSeverity,
    ) -> &'static str {
        let critical = severity == IssueSeverity::Critical;
        match pattern {
            DeteriorationPattern::PreShock if critical => {
                "Initiate IV fluids, continuous monitoring, prepare vasopressors"
            }
            DeteriorationPattern::PreShock => "Close monitoring, recheck vitals in 10 minutes",
            DeteriorationPattern::PreStroke if critical => {
                "FAST protocol: activate stroke team, prepare CT/MRI"
            }
            DeteriorationPattern::PreStroke => {
                "Neurological assessment recommended within 30 minutes"
            }
            DeteriorationPattern::PreSepsis if critical => {
                "Blood cultures STAT, broad-spectrum antibiotics, fluid resuscitation"
            }
            DeteriorationPattern::PreSepsis => {
                "Monitor for sepsis progression, repeat vitals in 15 minutes"
            }
        }
    }

    // -- Digital twin ---------------------------------------------------

    pub fn twin_summary(
        profile: TrajectoryProfile,
        starting: RiskLevel,
        projected: RiskLevel,
        horizon_minutes: u32,
        escalation_minute: Option<u32>,
    ) -> String {
        match escalation_minute {
            Some(minute) => format!(
                "Trajectory {}: risk {} now, escalating at minute {}, {} at {} minutes.",
                profile, starting, minute, projected, horizon_minutes,
            ),
            None => format!(
                "Trajectory {}: risk {} now, {} at {} minutes. No escalation projected.",
                profile, starting, projected, horizon_minutes,
            ),
        }
    }

    // -- Department routing ---------------------------------------------

    pub fn symptom_reason(code: &str, weight: f64) -> String {
        format!("Symptom '{}' (+{:.1})", code.replace('_', " "), weight)
    }

    pub fn condition_reason(code: &str, weight: f64) -> String {
        format!("Condition '{}' (+{:.1})", code.replace('_', " "), weight)
    }

    pub fn risk_reason(level: RiskLevel, weight: f64) -> String {
        format!("Risk level '{}' (+{:.1})", level, weight)
    }

    pub fn high_risk_boost(department: Department, multiplier: f64) -> String {
        format!("High-risk boost for {} (x{:.2})", department, multiplier)
    }

    // -- Insurance ------------------------------------------------------

    pub fn insurance_advisory(
        urgency: Urgency,
        insurer: &str,
        estimated_minutes: f64,
        risk_now: RiskLevel,
        risk_at_response: RiskLevel,
        fast_track_available: bool,
    ) -> String {
        let fast_track = if fast_track_available {
            "Fast-track authorization is available."
        } else {
            "No fast-track authorization with this insurer."
        };
        match urgency {
            Urgency::BypassInsurance => format!(
                "Treat immediately without waiting for {}. Expected response in {:.0} min; \
                 risk is {} now and projected {} by then. {}",
                insurer, estimated_minutes, risk_now, risk_at_response, fast_track,
            ),
            Urgency::Expedite => format!(
                "Expedite authorization with {}. Risk projected to rise from {} to {} \
                 within the expected {:.0} min wait. {}",
                insurer, risk_now, risk_at_response, estimated_minutes, fast_track,
            ),
            Urgency::Routine => format!(
                "Routine authorization with {} ({:.0} min expected). Risk {} now, \
                 projected {} at response. {}",
                insurer, estimated_minutes, risk_now, risk_at_response, fast_track,
            ),
        }
    }

    pub fn no_insurance_delay(risk_now: RiskLevel) -> String {
        format!(
            "No insurance delay. Patient can proceed to treatment immediately (risk {}).",
            risk_now,
        )
    }

    // -- Resources ------------------------------------------------------

    pub fn capacity_recommendation(
        department: &str,
        status: CapacityLevel,
        alternatives: usize,
    ) -> String {
        match status {
            CapacityLevel::Available => format!("Capacity is adequate in {}.", department),
            CapacityLevel::NearCapacity => format!(
                "{} is near capacity. {} alternative(s) found nearby.",
                department, alternatives,
            ),
            CapacityLevel::Full => format!(
                "{} is full. {} alternative(s) found nearby.",
                department, alternatives,
            ),
        }
    }
}
