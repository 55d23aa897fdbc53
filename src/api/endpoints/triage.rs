//! `POST /api/triage`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::PatientSnapshot;
use crate::triage::TriageResult;

/// Run the full pipeline for one patient.
///
/// The pipeline is synchronous and CPU-bound; it runs on the blocking pool
/// so a slow classifier cannot stall the reactor.
pub async fn submit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<PatientSnapshot>, JsonRejection>,
) -> Result<Json<TriageResult>, ApiError> {
    let Json(patient) = payload?;

    let pipeline = ctx.pipeline.clone();
    let result = tokio::task::spawn_blocking(move || pipeline.triage(&patient))
        .await
        .map_err(|e| ApiError::Internal(format!("triage task failed: {e}")))??;

    Ok(Json(result))
}
