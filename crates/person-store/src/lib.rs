pub mod error;
pub mod memory;
pub mod person;
pub mod postgres;
pub mod store;

pub use common::{PersonId, RecurringTaskId};
pub use error::{PersonStoreError, Result};
pub use memory::InMemoryPersonStore;
pub use person::Person;
pub use postgres::PostgresPersonStore;
pub use store::{PersonStore, PersonStoreExt};
