//! Patient CRUD under `/patients`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use homecare_records::{Patient, PatientDetails, PatientFilter, PatientPatch};

use crate::app::AppState;
use crate::error::Result;
use crate::http::extract::{JsonBody, PathParam, QueryParams};
use crate::service::Caller;

/// GET /patients?name_contains=&mobility=
pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(filter): QueryParams<PatientFilter>,
) -> Result<Json<Vec<Patient>>> {
    Ok(Json(state.service.list_patients(&caller, &filter)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(details): JsonBody<PatientDetails>,
) -> Result<(StatusCode, Json<Patient>)> {
    let patient = state.service.create_patient(&caller, details)?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Patient>> {
    Ok(Json(state.service.get_patient(&caller, id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
    JsonBody(patch): JsonBody<PatientPatch>,
) -> Result<Json<Patient>> {
    Ok(Json(state.service.update_patient(&caller, id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.service.delete_patient(&caller, id)?;
    Ok(StatusCode::NO_CONTENT)
}
