use std::sync::Arc;

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::Result;
use crate::service::{Caller, Dashboard};

/// GET /dashboard: record counts and visits in the next 30 days.
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Dashboard>> {
    let now = chrono::Local::now().naive_local();
    Ok(Json(state.service.dashboard(&caller, now)?))
}
