use homecare_core::EntityKind;
use thiserror::Error;

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum RecordError {
    /// No record of `kind` with this identifier exists.
    #[error("{kind} record not found: {id}")]
    NotFound { kind: EntityKind, id: i64 },

    /// A required field is missing or malformed. Rejected before any write.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An insert collided with an existing primary key. The allocator makes
    /// this unreachable; seeing it means the store is corrupted.
    #[error("Duplicate identifier for {kind}: {id}")]
    DuplicateIdentifier { kind: EntityKind, id: i64 },

    /// Delete refused because visits still reference the record.
    #[error("{kind} record {id} is referenced by {schedules} scheduled visit(s)")]
    Referenced {
        kind: EntityKind,
        id: i64,
        schedules: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A previous holder of the store lock panicked mid-operation.
    #[error("Record store lock poisoned")]
    Poisoned,
}

impl RecordError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RecordError::Validation(msg.into())
    }

    /// True for violations that mean the store itself can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecordError::DuplicateIdentifier { .. } | RecordError::Poisoned)
    }
}

pub type Result<T> = std::result::Result<T, RecordError>;
