//! `GET /api/meta/symptoms`: vocabularies for intake forms.

use axum::Json;
use serde::Serialize;

use crate::models::{Department, CONDITION_CODES, SYMPTOM_CODES};
use crate::triage::insurance::INSURERS;

#[derive(Serialize)]
pub struct VocabularyResponse {
    pub symptoms: &'static [&'static str],
    pub conditions: &'static [&'static str],
    pub departments: Vec<&'static str>,
    pub insurers: Vec<&'static str>,
}

pub async fn symptoms() -> Json<VocabularyResponse> {
    Json(VocabularyResponse {
        symptoms: SYMPTOM_CODES,
        conditions: CONDITION_CODES,
        departments: Department::ALL.iter().map(|d| d.as_str()).collect(),
        insurers: INSURERS.iter().map(|i| i.name).collect(),
    })
}
