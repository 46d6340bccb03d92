use thiserror::Error;

/// Errors raised while assembling the application configuration.
///
/// Subsystem crates keep their own error enums; the gateway maps all of
/// them onto HTTP responses.
#[derive(Debug, Error)]
pub enum HomecareError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HomecareError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            HomecareError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, HomecareError>;
