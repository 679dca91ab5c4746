//! Storage trait abstraction.

use async_trait::async_trait;
use lessonpath_core::{CompletionRecord, CourseId, CourseTree, LearnerContext};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Compare-and-swap failed: the stored version moved on
    #[error("Version conflict: expected {expected:?}, found {found:?}")]
    VersionConflict {
        /// Version the writer based its change on
        expected: Option<u64>,
        /// Version currently stored
        found: Option<u64>,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl StorageError {
    /// Whether the error is an optimistic-concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::VersionConflict { .. })
    }
}

/// A stored value together with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    /// Monotonic version, 1 for the first write
    pub version: u64,

    /// The stored value
    pub value: T,
}

/// Read-only source of course structure.
#[async_trait]
pub trait ContentTreeProvider: Send + Sync {
    /// Load the structural tree of a course.
    async fn get_course_tree(&self, course_id: CourseId) -> Result<Option<CourseTree>>;
}

/// Persistence of completion records, one per (learner, course).
///
/// Writes are compare-and-swap on the record version so that concurrent
/// operations on the same record are serialized.
#[async_trait]
pub trait CompletionStore: Send + Sync {
    /// Load a record and its version.
    async fn get_record(&self, context: LearnerContext) -> Result<Option<Versioned<CompletionRecord>>>;

    /// Store a record if the stored version still equals `expected_version`.
    ///
    /// `None` means the record must not exist yet. Returns the new version.
    async fn put_record(&self, record: &CompletionRecord, expected_version: Option<u64>) -> Result<u64>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete_record(&self, context: LearnerContext) -> Result<()>;
}

/// Compare a writer's expected version with the stored one and return the
/// version the write will produce.
pub(crate) fn next_version(expected: Option<u64>, found: Option<u64>) -> Result<u64> {
    if expected != found {
        return Err(StorageError::VersionConflict { expected, found });
    }
    Ok(found.unwrap_or(0) + 1)
}
