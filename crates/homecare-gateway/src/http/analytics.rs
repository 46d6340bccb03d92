use std::sync::Arc;

use axum::{extract::State, Json};
use homecare_analytics::Overview;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{Result, ServiceError};
use crate::http::extract::PathParam;
use crate::service::Caller;

/// GET /analytics: every distribution in one document.
pub async fn overview(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Overview>> {
    Ok(Json(state.service.analytics(&caller)?))
}

/// GET /analytics/{name}: a single distribution.
pub async fn distribution(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(name): PathParam<String>,
) -> Result<Json<Value>> {
    let overview = state.service.analytics(&caller)?;
    let value = match name.as_str() {
        "age" => json!(overview.age),
        "workload" => json!(overview.workload),
        "visits" => json!(overview.visits),
        "visit-types" => json!(overview.visit_types),
        "priorities" => json!(overview.priorities),
        other => {
            return Err(ServiceError::BadRequest(format!(
                "unknown distribution '{other}' \
                 (expected age, workload, visits, visit-types or priorities)"
            )))
        }
    };
    Ok(Json(value))
}
