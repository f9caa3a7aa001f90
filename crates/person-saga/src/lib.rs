//! Saga orchestration for the Person aggregate.
//!
//! A Person is spread over three systems: a row in the person store, two
//! thumbnails in the image service and a recurring task tracking contact
//! cadence. [`PersonSaga`] keeps them consistent without a distributed
//! transaction.
//!
//! Create runs these steps:
//! 1. Create thumbnails
//! 2. Create recurring task
//! 3. Save the person row
//!
//! If any step fails, previously completed steps are compensated in reverse order.
//! Update compensates the same way; delete runs forward only.

pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod image_content;
pub mod model;
pub mod services;
pub mod steps;
pub mod telemetry;

pub use bootstrap::PostgresPersonSaga;
pub use config::Config;
pub use coordinator::PersonSaga;
pub use error::{ErrorKind, Result, SagaError};
pub use model::{
    Contact, DeleteResult, Execution, ExecutionSource, NewRecurringTask, PersonDefinition,
    PersonUpdate, PersonView, RecurringTask, Thumbnails,
};
pub use services::{
    ImageService, InMemoryImageService, InMemoryRecurringTaskService, RecurringTaskService,
};
