use homecare_core::Role;
use serde::{Deserialize, Serialize};

/// An operator account. The password hash never leaves the crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

/// Payload for creating an account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}
