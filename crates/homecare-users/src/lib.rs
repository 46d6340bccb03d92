//! Operator accounts, password login and the role/operation access gate.

pub mod auth;
pub mod db;
pub mod directory;
pub mod error;
pub mod permissions;
pub mod types;

pub use directory::UserDirectory;
pub use error::{Result, UserError};
pub use permissions::AccessGate;
pub use types::{NewUser, User};
