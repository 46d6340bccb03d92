//! POST /login and POST /logout.
//!
//! Request:  `{"username": "...", "password": "..."}`
//! Response: `{"token": "...", "expires_at": "...", "username": "...",
//!             "role": "doctor", "permissions": ["view-patients", ...]}`

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use homecare_core::{Operation, Role};
use homecare_users::AccessGate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::auth::extract_bearer;
use crate::error::{Result, ServiceError};
use crate::http::{blocking, extract::JsonBody};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginReply {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
    pub role: Role,
    pub permissions: BTreeSet<Operation>,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginReply>> {
    let svc = Arc::clone(&state);
    let user = blocking(move || svc.service.login(&req.username, &req.password)).await?;
    let session = state.sessions.issue(&user);
    info!(username = %user.username, role = %user.role, "session opened");
    Ok(Json(LoginReply {
        token: session.token,
        expires_at: session.expires_at,
        permissions: AccessGate::permitted_operations(user.role),
        username: user.username,
        role: user.role,
    }))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = extract_bearer(&headers)
        .ok_or_else(|| ServiceError::Unauthorized("no bearer token to revoke".to_string()))?;
    if !state.sessions.revoke(token) {
        return Err(ServiceError::Unauthorized(
            "session unknown or expired".to_string(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}
