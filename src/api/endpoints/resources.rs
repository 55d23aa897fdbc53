//! Hospital resource endpoints.
//!
//! - `GET /api/resources`: snapshot of every hospital
//! - `GET /api/resources/check/:department`: capacity at one hospital
//! - `POST /api/resources/admit` / `POST /api/resources/discharge`
//! - `POST /api/resources/hospitals`: register a hospital
//! - `DELETE /api/resources/hospitals/:hospital_id`
//! - `POST /api/resources/reset`: restore the default network

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::triage::resources::{DepartmentSnapshot, HospitalRegistration, HospitalSnapshot};
use crate::triage::{CapacityStatus, ResourceLookup};

#[derive(Serialize)]
pub struct ResourcesResponse {
    pub hospitals: Vec<HospitalSnapshot>,
}

/// `GET /api/resources`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<ResourcesResponse>, ApiError> {
    let hospitals = ctx.resources.snapshot()?;
    Ok(Json(ResourcesResponse { hospitals }))
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub hospital_id: Option<String>,
}

/// `GET /api/resources/check/:department`: primary hospital unless
/// `hospital_id` is given.
pub async fn check(
    State(ctx): State<ApiContext>,
    Path(department): Path<String>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CapacityStatus>, ApiError> {
    let status = match query.hospital_id {
        Some(hospital_id) => ctx.resources.check_capacity_at(&department, &hospital_id)?,
        None => ctx.resources.capacity_status(&department)?,
    };
    Ok(Json(status))
}

#[derive(Debug, Deserialize)]
pub struct BedRequest {
    pub department: String,
    /// Defaults to the primary hospital.
    pub hospital_id: Option<String>,
}

#[derive(Serialize)]
pub struct BedResponse {
    pub hospital_id: String,
    pub department: DepartmentSnapshot,
}

/// `POST /api/resources/admit`
pub async fn admit(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BedRequest>, JsonRejection>,
) -> Result<Json<BedResponse>, ApiError> {
    let Json(request) = payload?;
    let hospital_id = target_hospital(&ctx, request.hospital_id)?;
    let department = ctx.resources.admit(&request.department, &hospital_id)?;
    Ok(Json(BedResponse {
        hospital_id,
        department,
    }))
}

/// `POST /api/resources/discharge`
pub async fn discharge(
    State(ctx): State<ApiContext>,
    payload: Result<Json<BedRequest>, JsonRejection>,
) -> Result<Json<BedResponse>, ApiError> {
    let Json(request) = payload?;
    let hospital_id = target_hospital(&ctx, request.hospital_id)?;
    let department = ctx.resources.discharge(&request.department, &hospital_id)?;
    Ok(Json(BedResponse {
        hospital_id,
        department,
    }))
}

/// `POST /api/resources/hospitals`
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<HospitalRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<HospitalSnapshot>), ApiError> {
    let Json(registration) = payload?;
    if registration.hospital_id.trim().is_empty() {
        return Err(ApiError::BadRequest("hospital_id is required".into()));
    }
    if registration.departments.is_empty() {
        return Err(ApiError::BadRequest("At least one department is required".into()));
    }
    let hospital = ctx.resources.register_hospital(registration)?;
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// `DELETE /api/resources/hospitals/:hospital_id`
pub async fn unregister(
    State(ctx): State<ApiContext>,
    Path(hospital_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    ctx.resources.unregister_hospital(&hospital_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/resources/reset`
pub async fn reset(State(ctx): State<ApiContext>) -> Result<StatusCode, ApiError> {
    ctx.resources.reset()?;
    Ok(StatusCode::NO_CONTENT)
}

fn target_hospital(ctx: &ApiContext, requested: Option<String>) -> Result<String, ApiError> {
    match requested {
        Some(id) => Ok(id),
        None => ctx
            .resources
            .primary_hospital_id()?
            .ok_or_else(|| ApiError::NotFound("No hospitals registered".into())),
    }
}
