//! Digital Twin Simulator.
//!
//! Deterministic vitals projection over a fixed horizon. Every step is
//! re-scored with [`scoring::assess_vitals`], the same function the live
//! path uses, so the timeline stays consistent with the current verdict.

use serde::{Deserialize, Serialize};

use crate::config::TriageConfig;
use crate::models::{RiskLevel, TrajectoryProfile, Vitals};

use super::deterioration::{DeteriorationReport, CRITICAL_BAND, WARNING_BAND};
use super::messages::MessageTemplates;
use super::rules::round_to;
use super::scoring;

/// Vitals every stable patient reverts toward.
const BASELINE: Vitals = Vitals {
    bp_systolic: 120.0,
    bp_diastolic: 80.0,
    heart_rate: 75.0,
    temperature: 36.8,
    spo2: 98.0,
};

const MEAN_REVERSION_RATE: f64 = 0.10;
const DIASTOLIC_FOLLOW: f64 = 0.40;

/// Drift per 30 minutes for a deteriorating trajectory.
#[derive(Debug, Clone, Copy)]
struct Drift {
    systolic: f64,
    heart_rate: f64,
    spo2: f64,
    temperature: f64,
}

const DECLINING_DRIFT: Drift = Drift {
    systolic: -2.0,
    heart_rate: 3.0,
    spo2: -0.3,
    temperature: 0.075,
};

const CRITICAL_DRIFT: Drift = Drift {
    systolic: -5.0,
    heart_rate: 6.5,
    spo2: -0.75,
    temperature: 0.2,
};

/// Physiological clamps for projected vitals.
const SYSTOLIC_LIMITS: (f64, f64) = (40.0, 260.0);
const DIASTOLIC_LIMITS: (f64, f64) = (20.0, 160.0);
const HEART_RATE_LIMITS: (f64, f64) = (25.0, 220.0);
const TEMPERATURE_LIMITS: (f64, f64) = (34.0, 42.5);
const SPO2_LIMITS: (f64, f64) = (60.0, 100.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    pub minute_offset: u32,
    pub vitals: Vitals,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalTwinProjection {
    pub trajectory: TrajectoryProfile,
    pub starting_risk: RiskLevel,
    pub projected_final_risk: RiskLevel,
    pub escalation_minute: Option<u32>,
    pub horizon_minutes: u32,
    pub step_minutes: u32,
    pub steps: Vec<TimelineStep>,
    pub summary: String,
}

impl DigitalTwinProjection {
    /// Risk level at the first step at or after `minute`, or the last
    /// step when `minute` lies beyond the horizon.
    pub fn level_at(&self, minute: f64) -> RiskLevel {
        self.steps
            .iter()
            .find(|s| f64::from(s.minute_offset) >= minute)
            .or_else(|| self.steps.last())
            .map(|s| s.risk_level)
            .unwrap_or(self.starting_risk)
    }
}

pub fn trajectory_profile(level: RiskLevel, composite: f64) -> TrajectoryProfile {
    if level == RiskLevel::High || composite >= CRITICAL_BAND {
        TrajectoryProfile::CriticalTrajectory
    } else if level == RiskLevel::Medium || composite >= WARNING_BAND {
        TrajectoryProfile::Declining
    } else {
        TrajectoryProfile::Stable
    }
}

/// Score growth per 30 minutes for a profile.
fn growth_per_half_hour(profile: TrajectoryProfile) -> f64 {
    match profile {
        TrajectoryProfile::Stable => 0.005,
        TrajectoryProfile::Declining => 0.04,
        TrajectoryProfile::CriticalTrajectory => 0.09,
    }
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.clamp(lo, hi)
}

fn revert(current: f64, target: f64) -> f64 {
    current + (target - current) * MEAN_REVERSION_RATE
}

fn stroke_dominant(report: &DeteriorationReport) -> bool {
    let s = report.sub_scores;
    s.pre_stroke > s.pre_shock && s.pre_stroke > s.pre_sepsis
}

/// Advance one step.
fn advance(
    v: &Vitals,
    profile: TrajectoryProfile,
    step_minutes: u32,
    composite: f64,
    systolic_rises: bool,
) -> Vitals {
    let drift = match profile {
        TrajectoryProfile::Stable => {
            return Vitals {
                bp_systolic: revert(v.bp_systolic, BASELINE.bp_systolic),
                bp_diastolic: revert(v.bp_diastolic, BASELINE.bp_diastolic),
                heart_rate: revert(v.heart_rate, BASELINE.heart_rate),
                temperature: revert(v.temperature, BASELINE.temperature),
                spo2: revert(v.spo2, BASELINE.spo2),
            };
        }
        TrajectoryProfile::Declining => DECLINING_DRIFT,
        TrajectoryProfile::CriticalTrajectory => CRITICAL_DRIFT,
    };

    let scale = f64::from(step_minutes) / 30.0 * (1.0 + composite / 100.0);
    let mut systolic_delta = drift.systolic * scale;
    if systolic_rises {
        systolic_delta = systolic_delta.abs();
    }

    Vitals {
        bp_systolic: clamp(v.bp_systolic + systolic_delta, SYSTOLIC_LIMITS),
        bp_diastolic: clamp(v.bp_diastolic + DIASTOLIC_FOLLOW * systolic_delta, DIASTOLIC_LIMITS),
        heart_rate: clamp(v.heart_rate + drift.heart_rate * scale, HEART_RATE_LIMITS),
        temperature: clamp(v.temperature + drift.temperature * scale, TEMPERATURE_LIMITS),
        spo2: clamp(v.spo2 + drift.spo2 * scale, SPO2_LIMITS),
    }
}

fn rounded(v: &Vitals) -> Vitals {
    Vitals {
        bp_systolic: round_to(v.bp_systolic, 1),
        bp_diastolic: round_to(v.bp_diastolic, 1),
        heart_rate: round_to(v.heart_rate, 1),
        temperature: round_to(v.temperature, 2),
        spo2: round_to(v.spo2, 1),
    }
}

/// Project the patient's vitals forward from the starting risk level.
pub fn simulate(
    vitals: &Vitals,
    starting_risk: RiskLevel,
    deterioration: &DeteriorationReport,
    config: &TriageConfig,
) -> DigitalTwinProjection {
    let composite = deterioration.sub_scores.composite();
    let profile = trajectory_profile(starting_risk, composite);
    let growth = growth_per_half_hour(profile);
    let systolic_rises = stroke_dominant(deterioration);
    let step_minutes = config.step_minutes.max(1);

    let mut steps = Vec::with_capacity(config.step_count());
    let mut current = *vitals;
    let mut minute = 0u32;

    loop {
        let base = starting_risk.base_score() + growth * f64::from(minute) / 30.0;
        let assessment = scoring::assess_vitals(&current, base);
        steps.push(TimelineStep {
            minute_offset: minute,
            vitals: current,
            risk_score: round_to(assessment.score, 3),
            risk_level: assessment.level,
        });

        if minute + step_minutes > config.horizon_minutes {
            break;
        }
        minute += step_minutes;
        // Rounded before scoring so each step's level follows from the
        // vitals it reports. Step 0 keeps the input untouched.
        current = rounded(&advance(&current, profile, step_minutes, composite, systolic_rises));
    }

    let escalation_minute = steps
        .iter()
        .find(|s| s.risk_level > starting_risk)
        .map(|s| s.minute_offset);
    let projected_final_risk = steps.last().map(|s| s.risk_level).unwrap_or(starting_risk);

    tracing::debug!(
        trajectory = profile.as_str(),
        starting = starting_risk.as_str(),
        projected = projected_final_risk.as_str(),
        escalation_minute = ?escalation_minute,
        "Digital twin projected"
    );

    DigitalTwinProjection {
        trajectory: profile,
        starting_risk,
        projected_final_risk,
        escalation_minute,
        horizon_minutes: config.horizon_minutes,
        step_minutes,
        summary: MessageTemplates::twin_summary(
            profile,
            starting_risk,
            projected_final_risk,
            config.horizon_minutes,
            escalation_minute,
        ),
        steps,
    }
}
