//! Saga error types.

use common::{PersonId, RecurringTaskId};
use person_store::PersonStoreError;
use thiserror::Error;

/// Errors that can occur during saga operations.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Another Person already uses the requested name.
    #[error("Person with name '{0}' already exists")]
    Conflict(String),

    /// Person not found.
    #[error("Person not found: {0}")]
    PersonNotFound(PersonId),

    /// The recurring-task service does not know the given task.
    #[error("Recurring task not found: {0}")]
    RecurringTaskNotFound(RecurringTaskId),

    /// A Person row points at a recurring task that does not exist.
    ///
    /// The two halves of the aggregate have already diverged, most likely
    /// because an earlier compensation failed. Not repaired automatically.
    #[error("Person {person_id} references recurring task {task_id}, which does not exist")]
    ConsistencyViolation {
        person_id: PersonId,
        task_id: RecurringTaskId,
    },

    /// The caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Image service error.
    #[error("Image service error: {0}")]
    ImageService(String),

    /// Recurring task service error.
    #[error("Recurring task service error: {0}")]
    RecurringTaskService(String),

    /// Person store error.
    #[error("Person store error: {0}")]
    Store(#[from] PersonStoreError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Coarse classification of a [`SagaError`], enough for a caller to decide
/// whether retrying makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Conflict,
    NotFound,
    UpstreamFailure,
    ConsistencyViolation,
    InvalidInput,
}

impl SagaError {
    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SagaError::Conflict(_) | SagaError::Store(PersonStoreError::NameTaken(_)) => {
                ErrorKind::Conflict
            }
            SagaError::PersonNotFound(_)
            | SagaError::RecurringTaskNotFound(_)
            | SagaError::Store(PersonStoreError::NotFound(_)) => ErrorKind::NotFound,
            SagaError::ConsistencyViolation { .. } => ErrorKind::ConsistencyViolation,
            SagaError::InvalidInput(_) => ErrorKind::InvalidInput,
            SagaError::ImageService(_)
            | SagaError::RecurringTaskService(_)
            | SagaError::Store(_)
            | SagaError::HttpClient(_) => ErrorKind::UpstreamFailure,
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
