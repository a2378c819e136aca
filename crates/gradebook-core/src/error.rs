//! Error types for gradebook-core

use crate::id::{GradeItemId, StudentId};
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the data layer and the recalculation engine
#[derive(Debug, Error)]
pub enum Error {
    /// Grade item not known to the store
    #[error("Grade item not found: {0}")]
    GradeItemNotFound(GradeItemId),

    /// Student not known to the store
    #[error("Student not found: {0}")]
    StudentNotFound(StudentId),

    /// A score that cannot be persisted (NaN or infinite)
    #[error("Score for student {student} on item {item} is not finite: {score}")]
    NonFiniteScore {
        student: StudentId,
        item: GradeItemId,
        score: f64,
    },

    /// Failure reported by a storage backend
    #[error("Store error during {operation}: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a storage error for the named operation
    pub fn store<S: Into<String>>(operation: &'static str, message: S) -> Self {
        Error::Store {
            operation,
            message: message.into(),
        }
    }
}
