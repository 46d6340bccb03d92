//! Shared vocabulary for the homecare workspace: roles, entity kinds,
//! gated operation tags, configuration and the top-level error type.

pub mod config;
pub mod error;
pub mod types;

pub use error::{HomecareError, Result};
pub use types::{EntityKind, Operation, Role};
