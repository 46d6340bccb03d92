use homecare_core::{Operation, Role};
use thiserror::Error;

/// All user-layer errors. Kept separate from the record errors so the
/// gateway can map them to HTTP statuses without coupling the layers.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// Unknown user and wrong password share this variant and message.
    #[error("Invalid username or password")]
    AuthFailed,

    #[error("Permission denied: role '{role}' may not perform '{operation}'")]
    PermissionDenied { role: Role, operation: Operation },

    #[error("Invalid user: {0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("User directory lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, UserError>;
