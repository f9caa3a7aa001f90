//! Collaborator traits and in-memory implementations for saga steps.

pub mod image;
pub mod recurring_tasks;

pub use image::{ImageService, InMemoryImageService};
pub use recurring_tasks::{InMemoryRecurringTaskService, RecurringTaskService};
