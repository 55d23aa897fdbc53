//! Vitals risk scoring shared by the live path and the digital twin.
//!
//! The override guard runs first; when it fires the score is pinned at 1.0.
//! Otherwise the score is `base + 0.15 x penalties`, clamped into [0, 1].

use crate::models::{RiskLevel, Vitals};

use super::override_guard;
use super::rules::clamp_score;

pub const PENALTY_WEIGHT: f64 = 0.15;
pub const HIGH_THRESHOLD: f64 = 0.65;
pub const MEDIUM_THRESHOLD: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalsAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub override_fired: bool,
}

pub fn level_for_score(score: f64) -> RiskLevel {
    if score >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Sum of per-vital deviation penalties. Zero inside the normal band.
pub fn vitals_penalty(v: &Vitals) -> f64 {
    let mut penalty = 0.0;

    if v.bp_systolic < 90.0 {
        penalty += (90.0 - v.bp_systolic) / 50.0;
    } else if v.bp_systolic > 180.0 {
        penalty += (v.bp_systolic - 180.0) / 60.0;
    }

    if v.heart_rate > 120.0 {
        penalty += (v.heart_rate - 120.0) / 80.0;
    } else if v.heart_rate < 50.0 {
        penalty += (50.0 - v.heart_rate) / 30.0;
    }

    if v.spo2 < 94.0 {
        penalty += (94.0 - v.spo2) / 15.0;
    }

    if v.temperature > 38.5 {
        penalty += (v.temperature - 38.5) / 4.0;
    } else if v.temperature < 35.5 {
        penalty += (35.5 - v.temperature) / 3.0;
    }

    penalty
}

/// Score a vitals reading from a base score (level base plus any growth).
pub fn assess_vitals(vitals: &Vitals, base: f64) -> VitalsAssessment {
    if override_guard::evaluate(vitals).fired {
        return VitalsAssessment {
            score: 1.0,
            level: RiskLevel::High,
            override_fired: true,
        };
    }

    let score = clamp_score(base + PENALTY_WEIGHT * vitals_penalty(vitals), 1.0);
    VitalsAssessment {
        score,
        level: level_for_score(score),
        override_fired: false,
    }
}
