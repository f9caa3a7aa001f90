use serde::{Deserialize, Serialize};

/// Identifier of a Person row, assigned by the person store on first save.
///
/// Wraps the store's 64-bit sequence value so it cannot be mixed up with
/// the identifier of the linked recurring task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(i64);

impl PersonId {
    /// Creates a person ID from a raw store value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<PersonId> for i64 {
    fn from(id: PersonId) -> Self {
        id.0
    }
}

/// Identifier of a record owned by the remote recurring-task service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringTaskId(i64);

impl RecurringTaskId {
    /// Creates a recurring task ID from the remote service's value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RecurringTaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecurringTaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RecurringTaskId> for i64 {
    fn from(id: RecurringTaskId) -> Self {
        id.0
    }
}
