use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use homecare_records::{Staff, StaffDetails, StaffFilter, StaffPatch};

use crate::app::AppState;
use crate::error::Result;
use crate::http::extract::{JsonBody, PathParam, QueryParams};
use crate::service::Caller;

pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(filter): QueryParams<StaffFilter>,
) -> Result<Json<Vec<Staff>>> {
    Ok(Json(state.service.list_staff(&caller, &filter)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(details): JsonBody<StaffDetails>,
) -> Result<(StatusCode, Json<Staff>)> {
    let staff = state.service.create_staff(&caller, details)?;
    Ok((StatusCode::CREATED, Json(staff)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Staff>> {
    Ok(Json(state.service.get_staff(&caller, id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
    JsonBody(patch): JsonBody<StaffPatch>,
) -> Result<Json<Staff>> {
    Ok(Json(state.service.update_staff(&caller, id, patch)?))
}

/// DELETE /staff/{id}: 409 while any visit still names this member.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.service.delete_staff(&caller, id)?;
    Ok(StatusCode::NO_CONTENT)
}
