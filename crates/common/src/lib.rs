//! Identifier types shared by the person store and the saga orchestrator.

mod types;

pub use types::{PersonId, RecurringTaskId};
