use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use homecare_core::EntityKind;
use homecare_export::ExportError;
use homecare_records::RecordError;
use homecare_users::UserError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with. Each variant maps to one HTTP status
/// and a stable `code` string.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Users(#[from] UserError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Missing, unknown or expired bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role allows the edit but the record belongs to someone else.
    #[error("Only an admin or the creator may change {kind} record {id}")]
    NotCreator { kind: EntityKind, id: i64 },

    /// A well-formed body whose fields have the wrong type or shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ServiceError::InvalidInput(e.body_text()),
            other => ServiceError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(rejection: PathRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Records(e) => match e {
                RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
                RecordError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RecordError::Referenced { .. } => StatusCode::CONFLICT,
                RecordError::DuplicateIdentifier { .. }
                | RecordError::Database(_)
                | RecordError::Io(_)
                | RecordError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Users(e) => match e {
                UserError::NotFound(_) => StatusCode::NOT_FOUND,
                UserError::AlreadyExists(_) => StatusCode::CONFLICT,
                UserError::AuthFailed => StatusCode::UNAUTHORIZED,
                UserError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
                UserError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                UserError::Hash(_) | UserError::DatabaseError(_) | UserError::Poisoned => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServiceError::Export(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotCreator { .. } => StatusCode::FORBIDDEN,
            ServiceError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Records(e) => match e {
                RecordError::NotFound { .. } => "NOT_FOUND",
                RecordError::Validation(_) => "VALIDATION_ERROR",
                RecordError::Referenced { .. } => "REFERENCED",
                RecordError::DuplicateIdentifier { .. } => "DUPLICATE_IDENTIFIER",
                RecordError::Database(_) | RecordError::Io(_) | RecordError::Poisoned => {
                    "STORAGE_ERROR"
                }
            },
            ServiceError::Users(e) => match e {
                UserError::NotFound(_) => "USER_NOT_FOUND",
                UserError::AlreadyExists(_) => "USER_EXISTS",
                UserError::AuthFailed => "AUTH_FAILED",
                UserError::PermissionDenied { .. } => "PERMISSION_DENIED",
                UserError::Validation(_) => "VALIDATION_ERROR",
                UserError::Hash(_) | UserError::DatabaseError(_) | UserError::Poisoned => {
                    "STORAGE_ERROR"
                }
            },
            ServiceError::Export(_) => "EXPORT_ERROR",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::NotCreator { .. } => "NOT_CREATOR",
            ServiceError::InvalidInput(_) => "VALIDATION_ERROR",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "request failed");
        }
        (
            status,
            Json(json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
