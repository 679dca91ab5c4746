//! Engine error taxonomy.

use lessonpath_storage::StorageError;

/// Result type for progression operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the progression engine.
///
/// Every domain failure has its own variant so callers can branch on the
/// kind. Infrastructure failures are wrapped opaquely in `Storage`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Referenced course, enrollment or lesson does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not allowed in the learner's current state
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The record kept changing under concurrent writers
    #[error("Conflicting concurrent update of {0}")]
    Conflict(String),

    /// The content tree is inconsistent around the referenced entity
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Whether the caller can act on this error (as opposed to an outage).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound(_) | EngineError::PreconditionFailed(_)
        )
    }
}
