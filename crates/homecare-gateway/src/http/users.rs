use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use homecare_users::{NewUser, User};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::error::Result;
use crate::http::{
    blocking,
    extract::{JsonBody, PathParam},
};
use crate::service::Caller;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

pub async fn list(State(state): State<Arc<AppState>>, caller: Caller) -> Result<Json<Vec<User>>> {
    Ok(Json(state.service.list_users(&caller)?))
}

pub async fn get_one(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(username): PathParam<String>,
) -> Result<Json<User>> {
    Ok(Json(state.service.get_user(&caller, &username)?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(new): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let svc = Arc::clone(&state);
    let user = blocking(move || svc.service.create_user(&caller, new)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /account/password: the caller changes their own password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<StatusCode> {
    let svc = Arc::clone(&state);
    blocking(move || {
        svc.service
            .change_password(&caller, &req.current_password, &req.new_password)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /users/{username}/password: admin reset. Open sessions for the
/// account are revoked.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(username): PathParam<String>,
    JsonBody(req): JsonBody<ResetPasswordRequest>,
) -> Result<Json<User>> {
    let user = {
        let svc = Arc::clone(&state);
        let (caller, username) = (caller.clone(), username.clone());
        blocking(move || svc.service.reset_password(&caller, &username, &req.new_password)).await?
    };
    let revoked = state.sessions.revoke_user(&user.username);
    info!(admin = %caller.username, username = %user.username, revoked, "password reset");
    Ok(Json(user))
}
