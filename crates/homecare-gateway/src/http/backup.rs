use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::error::Result;
use crate::http::blocking;
use crate::service::Caller;

/// POST /backup: copy the store file into the configured backup dir.
pub async fn backup_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<Value>> {
    let path = {
        let state = Arc::clone(&state);
        let caller = caller.clone();
        blocking(move || state.service.backup(&caller)).await?
    };
    info!(username = %caller.username, path = %path.display(), "backup requested");
    Ok(Json(json!({ "path": path.display().to_string() })))
}
