//! Visit booking under `/schedules`.
//!
//! Start times travel as `YYYY-MM-DDTHH:MM:SS` without an offset; the store
//! keeps them as naive local times.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use homecare_records::{Schedule, ScheduleDetails, ScheduleFilter, SchedulePatch};

use crate::app::AppState;
use crate::error::Result;
use crate::http::extract::{JsonBody, PathParam, QueryParams};
use crate::service::Caller;

/// GET /schedules?patient_id=&staff_id=&from=&until=&min_priority=
pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(filter): QueryParams<ScheduleFilter>,
) -> Result<Json<Vec<Schedule>>> {
    Ok(Json(state.service.list_schedules(&caller, &filter)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(details): JsonBody<ScheduleDetails>,
) -> Result<(StatusCode, Json<Schedule>)> {
    let visit = state.service.create_schedule(&caller, details)?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<Json<Schedule>> {
    Ok(Json(state.service.get_schedule(&caller, id)?))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
    JsonBody(patch): JsonBody<SchedulePatch>,
) -> Result<Json<Schedule>> {
    Ok(Json(state.service.update_schedule(&caller, id, patch)?))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode> {
    state.service.delete_schedule(&caller, id)?;
    Ok(StatusCode::NO_CONTENT)
}
